use crate::error::{BuildError, ComboRejection, Reference, SlotConflictKind};
use loadout_catalog::{CatalogPart, CatalogStore, RequirementContext};
use loadout_types::build::{BuildProposal, ElementChoice, SlotAssignment};
use loadout_types::catalog::{
    ItemTypeDefinition, ManufacturerTypePairing, PartDefinition, ShieldType, SlotRule,
};
use loadout_types::element::ElementCombo;
use loadout_types::ids::{PartId, SlotKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// How slotted shield perks of one shield type constrain each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// Any two slotted perks of the same shield type are alternatives.
    #[default]
    Exclusive,
    /// Only perks claiming the same slot number of the same shield type collide.
    PerSlot,
}

#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    pub slot_policy: SlotPolicy,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedSlot<'a> {
    pub slot: SlotKey,
    pub rule: &'a SlotRule,
    pub part: &'a CatalogPart,
}

/// A proposal that passed every check, with its references resolved. Parts
/// keep the order they were submitted in.
#[derive(Debug, Clone)]
pub struct ValidatedSelection<'a> {
    pub pairing: &'a ManufacturerTypePairing,
    pub item: &'a ItemTypeDefinition,
    pub parts: Vec<ResolvedSlot<'a>>,
    pub combo: Option<&'a ElementCombo>,
}

/// Fail-fast validator. Checks run in a fixed order and the first violation
/// is returned, so the same proposal always yields the same error.
#[derive(Debug, Clone)]
pub struct CompatibilityResolver<'a> {
    catalog: &'a CatalogStore,
    config: ResolverConfig,
}

impl<'a> CompatibilityResolver<'a> {
    pub fn new(catalog: &'a CatalogStore, config: ResolverConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &'a CatalogStore {
        self.catalog
    }

    pub fn validate(&self, proposal: &BuildProposal) -> Result<ValidatedSelection<'a>, BuildError> {
        debug!(
            manufacturer = %proposal.manufacturer,
            item_type = %proposal.item_type,
            parts = proposal.parts.len(),
            "validating proposal"
        );
        let result = self.validate_inner(proposal);
        if let Err(err) = &result {
            debug!(kind = %err.kind(), error = %err, "proposal rejected");
        }
        result
    }

    fn validate_inner(&self, proposal: &BuildProposal) -> Result<ValidatedSelection<'a>, BuildError> {
        let unknown_pairing = || BuildError::UnknownPairing {
            manufacturer: proposal.manufacturer.clone(),
            item_type: proposal.item_type.clone(),
        };
        let pairing = self
            .catalog
            .pairing(&proposal.manufacturer, &proposal.item_type)
            .ok_or_else(unknown_pairing)?;
        let item = self
            .catalog
            .item_type(&proposal.item_type)
            .ok_or_else(unknown_pairing)?;

        let resolved = self.resolve_parts(&proposal.parts)?;
        let mut ordered = resolved.clone();
        ordered.sort_by_key(|r| (r.slot, r.part.id()));

        self.check_slots(proposal, item, &ordered)?;
        self.check_requirements(proposal, item, &ordered)?;
        let combo = match &proposal.element {
            Some(choice) => Some(self.check_element(item, choice)?),
            None => None,
        };

        Ok(ValidatedSelection {
            pairing,
            item,
            parts: resolved,
            combo,
        })
    }

    fn resolve_parts(&self, parts: &[SlotAssignment]) -> Result<Vec<ResolvedSlot<'a>>, BuildError> {
        let mut sorted: Vec<&SlotAssignment> = parts.iter().collect();
        sorted.sort();
        for assignment in sorted {
            self.resolve(assignment)?;
        }
        parts.iter().map(|a| self.resolve(a)).collect()
    }

    fn resolve(&self, assignment: &SlotAssignment) -> Result<ResolvedSlot<'a>, BuildError> {
        let rule = self
            .catalog
            .slot_rule(assignment.slot.code)
            .ok_or(BuildError::UnknownReference(Reference::Slot(assignment.slot.code)))?;
        let part = self
            .catalog
            .part(rule.family, assignment.part)
            .ok_or(BuildError::UnknownReference(Reference::Part {
                family: rule.family,
                id: assignment.part,
            }))?;
        Ok(ResolvedSlot {
            slot: assignment.slot,
            rule,
            part,
        })
    }

    fn check_slots(
        &self,
        proposal: &BuildProposal,
        item: &ItemTypeDefinition,
        ordered: &[ResolvedSlot<'a>],
    ) -> Result<(), BuildError> {
        let mut occupied: BTreeMap<SlotKey, PartId> = BTreeMap::new();
        let mut groups: BTreeMap<(ShieldType, Option<u8>), PartId> = BTreeMap::new();
        let mut exclusive: BTreeMap<&str, PartId> = BTreeMap::new();

        for entry in ordered {
            let conflict = |kind| BuildError::SlotConflict {
                slot: entry.slot,
                kind,
            };
            let definition = &entry.part.definition;
            let id = definition.id();

            if item.class.part_family() != Some(entry.rule.family) {
                return Err(conflict(SlotConflictKind::WrongFamily {
                    family: entry.rule.family,
                    item_type: item.name.clone(),
                }));
            }
            if entry.slot.index >= entry.rule.capacity {
                return Err(conflict(SlotConflictKind::OverCapacity {
                    capacity: entry.rule.capacity,
                }));
            }
            if let Some(accepts) = &entry.rule.accepts
                && !slot_accepts(entry.rule, definition)
            {
                return Err(conflict(SlotConflictKind::NotAccepted {
                    part: id,
                    found: definition.slot_token().to_string(),
                    accepts: accepts.clone(),
                }));
            }
            if let Some(first) = occupied.insert(entry.slot, id) {
                return Err(conflict(SlotConflictKind::Duplicate { first, second: id }));
            }

            if let PartDefinition::Shield(perk) = definition
                && let Some(slot_number) = perk.slot
            {
                let key = match self.config.slot_policy {
                    SlotPolicy::Exclusive => (perk.shield_type, None),
                    SlotPolicy::PerSlot => (perk.shield_type, Some(slot_number)),
                };
                if let Some(first) = groups.get(&key) {
                    let group = match key.1 {
                        Some(n) => format!("{}/{}", perk.shield_type, n),
                        None => perk.shield_type.to_string(),
                    };
                    warn!(
                        policy = ?self.config.slot_policy,
                        %group,
                        first = %first,
                        second = %id,
                        "shield perks collide in slot group"
                    );
                    return Err(conflict(SlotConflictKind::SlotGroup {
                        shield_type: perk.shield_type,
                        group,
                        first: *first,
                        second: id,
                    }));
                }
                groups.insert(key, id);
            }

            let perk_type = definition.part_type();
            if self.catalog.is_exclusive_perk_type(perk_type) {
                if let Some(first) = exclusive.get(perk_type) {
                    return Err(conflict(SlotConflictKind::ExclusivePerkType {
                        perk_type: perk_type.to_string(),
                        first: *first,
                        second: id,
                    }));
                }
                exclusive.insert(perk_type, id);
            }
        }

        self.check_minimums(proposal, item, &occupied)
    }

    /// Required slots are walked in code order. A slot the catalog offers no
    /// candidate for is never required.
    fn check_minimums(
        &self,
        proposal: &BuildProposal,
        item: &ItemTypeDefinition,
        occupied: &BTreeMap<SlotKey, PartId>,
    ) -> Result<(), BuildError> {
        let required = self
            .catalog
            .slot_rules()
            .filter(|rule| rule.min > 0 && item.class.part_family() == Some(rule.family));
        for rule in required {
            let filled = occupied.keys().filter(|slot| slot.code == rule.code).count();
            if filled >= usize::from(rule.min) {
                continue;
            }
            let has_candidate = self
                .catalog
                .parts_for(&proposal.manufacturer, &proposal.item_type, None)
                .into_iter()
                .any(|part| slot_accepts(rule, &part.definition));
            if !has_candidate {
                debug!(code = rule.code, label = %rule.label, "required slot has no candidates");
                continue;
            }
            let index = (0..rule.capacity)
                .find(|i| !occupied.contains_key(&SlotKey::new(rule.code, *i)))
                .unwrap_or(0);
            return Err(BuildError::SlotConflict {
                slot: SlotKey::new(rule.code, index),
                kind: SlotConflictKind::Missing {
                    label: rule.label.clone(),
                    min: rule.min,
                    found: filled as u8,
                },
            });
        }
        Ok(())
    }

    fn check_requirements(
        &self,
        proposal: &BuildProposal,
        item: &ItemTypeDefinition,
        ordered: &[ResolvedSlot<'a>],
    ) -> Result<(), BuildError> {
        for entry in ordered {
            let definition = &entry.part.definition;
            let unsatisfied = |requirement: String| BuildError::UnsatisfiedRequirement {
                part: definition.id(),
                family: definition.family(),
                slot: entry.slot,
                requirement,
            };

            if !self.catalog.part_fits(definition, &proposal.manufacturer, item) {
                return Err(unsatisfied(format!(
                    "fitting {} {}",
                    proposal.manufacturer, proposal.item_type
                )));
            }

            let others: BTreeSet<PartId> = ordered
                .iter()
                .filter(|other| other.slot != entry.slot)
                .map(|other| other.part.id())
                .collect();
            let ctx = RequirementContext {
                manufacturer: &proposal.manufacturer,
                item_type: &proposal.item_type,
                parts: &others,
            };
            if !entry.part.predicate.evaluate(&ctx) {
                return Err(unsatisfied(entry.part.predicate.to_string()));
            }
        }
        Ok(())
    }

    fn check_element(
        &self,
        item: &ItemTypeDefinition,
        choice: &ElementChoice,
    ) -> Result<&'a ElementCombo, BuildError> {
        let reject = |reason| BuildError::InvalidElementCombo {
            choice: describe_choice(choice),
            reason,
        };
        let combo = self
            .catalog
            .find_combo(choice.primary, choice.secondary, choice.underbarrel)
            .ok_or_else(|| reject(ComboRejection::NotInCatalog))?;
        if !item.elemental {
            return Err(reject(ComboRejection::NotElemental {
                item_type: item.name.clone(),
            }));
        }
        if combo.underbarrel && !item.underbarrel {
            return Err(reject(ComboRejection::UnderbarrelUnsupported {
                item_type: item.name.clone(),
            }));
        }
        Ok(combo)
    }
}

/// Whether `rule` takes `part`, ignoring capacity and family.
pub fn slot_accepts(rule: &SlotRule, part: &PartDefinition) -> bool {
    rule.accepts
        .as_deref()
        .is_none_or(|accepts| part.slot_token().eq_ignore_ascii_case(accepts))
}

fn describe_choice(choice: &ElementChoice) -> String {
    let secondary = choice
        .secondary
        .map(|e| e.to_string())
        .unwrap_or_else(|| "none".to_string());
    format!("({}, {}, {})", choice.primary, secondary, choice.underbarrel)
}
