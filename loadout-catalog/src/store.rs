use crate::classify::reclassify;
use crate::error::CatalogError;
use crate::load::load_catalog_dir;
use crate::requirements::{self, Predicate, RequirementError};
use camino::Utf8Path;
use loadout_types::catalog::{
    CatalogSnapshot, ItemClass, ItemTypeDefinition, ManufacturerTypePairing, PartDefinition,
    PartFamily, ShieldType, SlotRule,
};
use loadout_types::element::{Element, ElementCombo};
use loadout_types::ids::{ComboId, ItemType, Manufacturer, PairingId, PartId};
use loadout_types::schema::LOADOUT_CATALOG_V1;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// A part definition with its requirement text already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPart {
    pub definition: PartDefinition,
    pub predicate: Predicate,
}

impl CatalogPart {
    pub fn id(&self) -> PartId {
        self.definition.id()
    }

    pub fn family(&self) -> PartFamily {
        self.definition.family()
    }
}

/// Element combo lookup. Unset fields match anything; `secondary: Some(None)`
/// matches single-element combos only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboQuery {
    pub primary: Element,
    pub secondary: Option<Option<Element>>,
    pub underbarrel: Option<bool>,
}

impl ComboQuery {
    pub fn primary(primary: Element) -> Self {
        Self {
            primary,
            secondary: None,
            underbarrel: None,
        }
    }

    pub fn secondary(mut self, secondary: Element) -> Self {
        self.secondary = Some(Some(secondary));
        self
    }

    pub fn single(mut self) -> Self {
        self.secondary = Some(None);
        self
    }

    pub fn underbarrel(mut self, underbarrel: bool) -> Self {
        self.underbarrel = Some(underbarrel);
        self
    }

    fn matches(&self, combo: &ElementCombo) -> bool {
        combo.primary_element == self.primary
            && self.secondary.is_none_or(|s| s == combo.secondary_element)
            && self.underbarrel.is_none_or(|u| u == combo.underbarrel)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub element_combos: usize,
    pub item_types: usize,
    pub pairings: usize,
    pub slot_rules: usize,
    pub parts: BTreeMap<PartFamily, usize>,
    pub fingerprint: String,
}

/// Immutable, indexed catalog. Built once at startup and passed by reference
/// to every resolver and composer call.
#[derive(Debug)]
pub struct CatalogStore {
    combos: BTreeMap<ComboId, ElementCombo>,
    combo_index: HashMap<(Element, Option<Element>, bool), ComboId>,
    item_types: BTreeMap<ItemType, ItemTypeDefinition>,
    pairings: BTreeMap<PairingId, ManufacturerTypePairing>,
    pairing_index: HashMap<(Manufacturer, ItemType), PairingId>,
    slot_rules: BTreeMap<u16, SlotRule>,
    exclusive_perk_types: BTreeSet<String>,
    parts: BTreeMap<(PartFamily, PartId), CatalogPart>,
    fingerprint: String,
}

impl CatalogStore {
    /// Loads and validates the catalog directory.
    pub fn load(dir: &Utf8Path) -> Result<Self, CatalogError> {
        Self::from_snapshot(load_catalog_dir(dir)?)
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, CatalogError> {
        if snapshot.schema != LOADOUT_CATALOG_V1 {
            return Err(CatalogError::Schema {
                context: "catalog snapshot".to_string(),
                found: snapshot.schema,
                expected: LOADOUT_CATALOG_V1,
            });
        }

        let mut combos = BTreeMap::new();
        let mut combo_index = HashMap::new();
        for combo in snapshot.element_combos {
            if combo.id == ComboId::NONE {
                return Err(CatalogError::Invalid {
                    collection: "element_combos",
                    key: combo.to_string(),
                    reason: "id 0 is reserved for builds without an element".to_string(),
                });
            }
            if combo.secondary_element == Some(combo.primary_element) {
                return Err(CatalogError::Invalid {
                    collection: "element_combos",
                    key: combo.id.to_string(),
                    reason: "secondary element equals primary".to_string(),
                });
            }
            if combo_index.insert(combo.triple(), combo.id).is_some() {
                return Err(duplicate("element_combos", combo.to_string()));
            }
            let id = combo.id;
            if combos.insert(id, combo).is_some() {
                return Err(duplicate("element_combos", format!("id {id}")));
            }
        }

        let mut item_types = BTreeMap::new();
        for item in snapshot.item_types {
            let name = item.name.clone();
            if item_types.insert(name.clone(), item).is_some() {
                return Err(duplicate("item_types", name.to_string()));
            }
        }

        let mut pairings = BTreeMap::new();
        let mut pairing_index = HashMap::new();
        for pairing in snapshot.pairings {
            let key = format!("{} ({}/{})", pairing.id, pairing.manufacturer, pairing.item_type);
            if !item_types.contains_key(&pairing.item_type) {
                return Err(CatalogError::DanglingReference {
                    collection: "pairings",
                    key,
                    target: "item type",
                    value: pairing.item_type.to_string(),
                });
            }
            let pair = (pairing.manufacturer.clone(), pairing.item_type.clone());
            if pairing_index.insert(pair, pairing.id).is_some() {
                return Err(duplicate("pairings", key));
            }
            if pairings.insert(pairing.id, pairing).is_some() {
                return Err(duplicate("pairings", key));
            }
        }
        let manufacturers: BTreeSet<Manufacturer> =
            pairings.values().map(|p| p.manufacturer.clone()).collect();

        let mut slot_rules = BTreeMap::new();
        for rule in snapshot.slot_rules {
            if rule.capacity == 0 {
                return Err(CatalogError::Invalid {
                    collection: "slot_rules",
                    key: rule.code.to_string(),
                    reason: "capacity must be at least 1".to_string(),
                });
            }
            if rule.min > rule.capacity {
                return Err(CatalogError::Invalid {
                    collection: "slot_rules",
                    key: rule.code.to_string(),
                    reason: format!("minimum {} exceeds capacity {}", rule.min, rule.capacity),
                });
            }
            let code = rule.code;
            if slot_rules.insert(code, rule).is_some() {
                return Err(duplicate("slot_rules", code.to_string()));
            }
        }

        let mut definitions = Vec::new();
        for mut part in snapshot.weapon_parts {
            if !reclassify(&mut part) {
                return Err(CatalogError::Unclassified {
                    id: part.id,
                    part_string: part.part_string,
                });
            }
            let key = format!("{} ({})", part.id, part.part_string);
            if !manufacturers.contains(&part.manufacturer) {
                return Err(CatalogError::DanglingReference {
                    collection: "weapon_parts",
                    key,
                    target: "manufacturer",
                    value: part.manufacturer.to_string(),
                });
            }
            if let Some(weapon_type) = &part.weapon_type {
                let pair = (part.manufacturer.clone(), weapon_type.clone());
                if !part.cross_compatible && !pairing_index.contains_key(&pair) {
                    return Err(CatalogError::DanglingReference {
                        collection: "weapon_parts",
                        key,
                        target: "pairing",
                        value: format!("{}/{}", part.manufacturer, weapon_type),
                    });
                }
            }
            definitions.push(PartDefinition::Weapon(part));
        }
        definitions.extend(snapshot.shield_parts.into_iter().map(PartDefinition::Shield));
        definitions.extend(snapshot.repkit_parts.into_iter().map(PartDefinition::Repkit));
        definitions.extend(snapshot.gadget_parts.into_iter().map(PartDefinition::Gadget));

        let mut parts = BTreeMap::new();
        for definition in definitions {
            let (family, id) = (definition.family(), definition.id());
            let predicate = requirements::parse(definition.requirements().unwrap_or_default())
                .map_err(|source| CatalogError::Requirement { family, id, source })?;
            let part = CatalogPart {
                definition,
                predicate,
            };
            if parts.insert((family, id), part).is_some() {
                return Err(duplicate("parts", format!("{family} {id}")));
            }
        }

        for ((family, id), part) in &parts {
            for referenced in part.predicate.referenced_parts() {
                if !parts.contains_key(&(*family, referenced)) {
                    return Err(CatalogError::DanglingReference {
                        collection: "parts",
                        key: format!("{family} {id}"),
                        target: "part",
                        value: referenced.to_string(),
                    });
                }
            }
        }

        let mut store = Self {
            combos,
            combo_index,
            item_types,
            pairings,
            pairing_index,
            slot_rules,
            exclusive_perk_types: snapshot.exclusive_perk_types.into_iter().collect(),
            parts,
            fingerprint: String::new(),
        };
        store.fingerprint = store.compute_fingerprint()?;

        info!(
            element_combos = store.combos.len(),
            pairings = store.pairings.len(),
            parts = store.parts.len(),
            fingerprint = %store.fingerprint,
            "catalog loaded"
        );
        Ok(store)
    }

    /// SHA-256 over the indexed content, independent of row order on disk.
    fn compute_fingerprint(&self) -> Result<String, CatalogError> {
        let definitions: Vec<&PartDefinition> = self.parts.values().map(|p| &p.definition).collect();
        let canonical = (
            self.combos.values().collect::<Vec<_>>(),
            self.item_types.values().collect::<Vec<_>>(),
            self.pairings.values().collect::<Vec<_>>(),
            self.slot_rules.values().collect::<Vec<_>>(),
            &self.exclusive_perk_types,
            definitions,
        );
        let bytes = serde_json::to_vec(&canonical).map_err(|e| CatalogError::Invalid {
            collection: "catalog",
            key: "fingerprint".to_string(),
            reason: e.to_string(),
        })?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn summary(&self) -> CatalogSummary {
        let mut parts = BTreeMap::new();
        for (family, _) in self.parts.keys() {
            *parts.entry(*family).or_insert(0) += 1;
        }
        CatalogSummary {
            element_combos: self.combos.len(),
            item_types: self.item_types.len(),
            pairings: self.pairings.len(),
            slot_rules: self.slot_rules.len(),
            parts,
            fingerprint: self.fingerprint.clone(),
        }
    }

    /// Combos matching every field set on `query`, ascending id.
    pub fn element_combos_for(&self, query: &ComboQuery) -> Vec<&ElementCombo> {
        self.combos.values().filter(|c| query.matches(c)).collect()
    }

    /// Exact triple lookup.
    pub fn find_combo(
        &self,
        primary: Element,
        secondary: Option<Element>,
        underbarrel: bool,
    ) -> Option<&ElementCombo> {
        self.combo_index
            .get(&(primary, secondary, underbarrel))
            .and_then(|id| self.combos.get(id))
    }

    pub fn combo(&self, id: ComboId) -> Option<&ElementCombo> {
        self.combos.get(&id)
    }

    pub fn is_valid_pairing(&self, manufacturer: &Manufacturer, item_type: &ItemType) -> bool {
        self.pairing(manufacturer, item_type).is_some()
    }

    pub fn pairing(
        &self,
        manufacturer: &Manufacturer,
        item_type: &ItemType,
    ) -> Option<&ManufacturerTypePairing> {
        self.pairing_index
            .get(&(manufacturer.clone(), item_type.clone()))
            .and_then(|id| self.pairings.get(id))
    }

    pub fn pairing_by_id(&self, id: PairingId) -> Option<&ManufacturerTypePairing> {
        self.pairings.get(&id)
    }

    pub fn item_type(&self, name: &ItemType) -> Option<&ItemTypeDefinition> {
        self.item_types.get(name)
    }

    pub fn slot_rule(&self, code: u16) -> Option<&SlotRule> {
        self.slot_rules.get(&code)
    }

    pub fn slot_rules(&self) -> impl Iterator<Item = &SlotRule> {
        self.slot_rules.values()
    }

    pub fn part(&self, family: PartFamily, id: PartId) -> Option<&CatalogPart> {
        self.parts.get(&(family, id))
    }

    pub fn is_exclusive_perk_type(&self, perk_type: &str) -> bool {
        self.exclusive_perk_types.contains(perk_type)
    }

    /// Whether a part may sit on the given item at all, before its
    /// requirement predicate is considered.
    pub fn part_fits(
        &self,
        part: &PartDefinition,
        manufacturer: &Manufacturer,
        item: &ItemTypeDefinition,
    ) -> bool {
        if item.class.part_family() != Some(part.family()) {
            return false;
        }
        match part {
            PartDefinition::Weapon(p) => {
                p.cross_compatible
                    || (&p.manufacturer == manufacturer
                        && p.weapon_type.as_ref().is_none_or(|t| t == &item.name))
            }
            PartDefinition::Shield(p) => {
                p.shield_type == ShieldType::General || Some(p.shield_type) == item.shield_kind
            }
            PartDefinition::Repkit(_) => item.class == ItemClass::Repkit,
            PartDefinition::Gadget(_) => item.class == ItemClass::Gadget,
        }
    }

    /// Parts legal on `manufacturer`/`item_type`, ascending id. Includes
    /// cross-compatible parts whose requirements admit the item.
    pub fn parts_for(
        &self,
        manufacturer: &Manufacturer,
        item_type: &ItemType,
        part_type: Option<&str>,
    ) -> Vec<&CatalogPart> {
        if !self.is_valid_pairing(manufacturer, item_type) {
            debug!(%manufacturer, %item_type, "parts_for on unknown pairing");
            return vec![];
        }
        let Some(item) = self.item_type(item_type) else {
            return vec![];
        };
        let Some(family) = item.class.part_family() else {
            return vec![];
        };

        let no_parts = BTreeSet::new();
        let ctx = requirements::RequirementContext {
            manufacturer,
            item_type,
            parts: &no_parts,
        };
        self.parts
            .range((family, PartId(0))..=(family, PartId(u32::MAX)))
            .map(|(_, part)| part)
            .filter(|part| self.part_fits(&part.definition, manufacturer, item))
            .filter(|part| {
                !part.definition.is_cross_compatible()
                    || identity_admits(&part.predicate, &ctx)
            })
            .filter(|part| {
                part_type.is_none_or(|t| part.definition.part_type().eq_ignore_ascii_case(t))
            })
            .collect()
    }

    pub fn parse_requirements(&self, text: &str) -> Result<Predicate, RequirementError> {
        requirements::parse(text)
    }
}

/// Evaluates only the item-identity atoms of a predicate, treating part
/// atoms as satisfiable.
fn identity_admits(predicate: &Predicate, ctx: &requirements::RequirementContext<'_>) -> bool {
    match predicate {
        Predicate::HasPart(_) | Predicate::Always => true,
        Predicate::ItemType(_) | Predicate::Manufacturer(_) => predicate.evaluate(ctx),
        Predicate::All(items) => items.iter().all(|p| identity_admits(p, ctx)),
        Predicate::Any(items) => items.iter().any(|p| identity_admits(p, ctx)),
    }
}

fn duplicate(collection: &'static str, key: String) -> CatalogError {
    CatalogError::Duplicate { collection, key }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_types::catalog::{ShieldPartDefinition, WeaponPartDefinition};

    fn weapon(id: u32, manufacturer: &str, weapon_type: &str, part_type: &str) -> WeaponPartDefinition {
        WeaponPartDefinition {
            id: PartId(id),
            manufacturer: Manufacturer::new(manufacturer),
            weapon_type: Some(ItemType::new(weapon_type)),
            part_type: part_type.to_string(),
            part_string: format!("X.part_{id}"),
            model_name: None,
            stats: None,
            effects: None,
            requirements: None,
            cross_compatible: false,
        }
    }

    fn small_snapshot() -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.element_combos = vec![
            ElementCombo {
                id: ComboId(1),
                primary_element: Element::Kinetic,
                secondary_element: None,
                underbarrel: false,
            },
            ElementCombo {
                id: ComboId(2),
                primary_element: Element::Fire,
                secondary_element: Some(Element::Shock),
                underbarrel: true,
            },
        ];
        snapshot.item_types = vec![ItemTypeDefinition {
            name: ItemType::new("pistol"),
            class: ItemClass::Weapon,
            elemental: true,
            underbarrel: true,
            shield_kind: None,
        }];
        snapshot.pairings = vec![ManufacturerTypePairing {
            id: PairingId(1),
            manufacturer: Manufacturer::new("jakobs"),
            item_type: ItemType::new("pistol"),
        }];
        snapshot.weapon_parts = vec![
            weapon(1, "jakobs", "pistol", "Barrel"),
            WeaponPartDefinition {
                requirements: Some("part:1".to_string()),
                ..weapon(2, "jakobs", "pistol", "Barrel Accessory")
            },
        ];
        snapshot
    }

    #[test]
    fn small_snapshot_builds() {
        let store = CatalogStore::from_snapshot(small_snapshot()).expect("store");
        assert_eq!(store.summary().parts.get(&PartFamily::Weapon), Some(&2));
        assert_eq!(
            store.part(PartFamily::Weapon, PartId(2)).map(|p| &p.predicate),
            Some(&Predicate::HasPart(PartId(1)))
        );
    }

    #[test]
    fn duplicate_combo_triple_is_fatal() {
        let mut snapshot = small_snapshot();
        let mut copy = snapshot.element_combos[1].clone();
        copy.id = ComboId(3);
        snapshot.element_combos.push(copy);
        let err = CatalogStore::from_snapshot(snapshot).expect_err("duplicate");
        assert!(matches!(err, CatalogError::Duplicate { collection: "element_combos", .. }));
    }

    #[test]
    fn duplicate_combo_id_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.element_combos.push(ElementCombo {
            id: ComboId(1),
            primary_element: Element::Cryo,
            secondary_element: None,
            underbarrel: false,
        });
        let err = CatalogStore::from_snapshot(snapshot).expect_err("duplicate");
        assert!(matches!(err, CatalogError::Duplicate { key, .. } if key == "id 1"));
    }

    #[test]
    fn combo_id_zero_is_reserved() {
        let mut snapshot = small_snapshot();
        snapshot.element_combos.push(ElementCombo {
            id: ComboId(0),
            primary_element: Element::Cryo,
            secondary_element: None,
            underbarrel: false,
        });
        let err = CatalogStore::from_snapshot(snapshot).expect_err("reserved id");
        assert!(matches!(
            err,
            CatalogError::Invalid { collection: "element_combos", reason, .. } if reason.contains("reserved")
        ));
    }

    #[test]
    fn slot_minimum_above_capacity_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.slot_rules.push(SlotRule {
            code: 12,
            family: PartFamily::Weapon,
            label: "Barrel".to_string(),
            accepts: Some("Barrel".to_string()),
            capacity: 1,
            min: 2,
        });
        let err = CatalogStore::from_snapshot(snapshot).expect_err("min above capacity");
        assert!(matches!(err, CatalogError::Invalid { collection: "slot_rules", .. }));
    }

    #[test]
    fn duplicate_pairing_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.pairings.push(ManufacturerTypePairing {
            id: PairingId(2),
            manufacturer: Manufacturer::new("Jakobs"),
            item_type: ItemType::new("pistol"),
        });
        let err = CatalogStore::from_snapshot(snapshot).expect_err("duplicate");
        assert!(matches!(err, CatalogError::Duplicate { collection: "pairings", .. }));
    }

    #[test]
    fn pairing_with_unknown_item_type_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.pairings.push(ManufacturerTypePairing {
            id: PairingId(2),
            manufacturer: Manufacturer::new("jakobs"),
            item_type: ItemType::new("laser_sword"),
        });
        let err = CatalogStore::from_snapshot(snapshot).expect_err("dangling");
        assert!(matches!(err, CatalogError::DanglingReference { target: "item type", .. }));
    }

    #[test]
    fn weapon_part_without_pairing_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.weapon_parts.push(weapon(3, "jakobs", "smg", "Barrel"));
        let err = CatalogStore::from_snapshot(snapshot).expect_err("dangling");
        assert!(matches!(err, CatalogError::DanglingReference { target: "pairing", .. }));
    }

    #[test]
    fn duplicate_part_id_within_family_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.weapon_parts.push(weapon(1, "jakobs", "pistol", "Grip"));
        let err = CatalogStore::from_snapshot(snapshot).expect_err("duplicate");
        assert!(matches!(err, CatalogError::Duplicate { collection: "parts", .. }));
    }

    #[test]
    fn same_id_in_different_families_is_allowed() {
        let mut snapshot = small_snapshot();
        snapshot.shield_parts.push(ShieldPartDefinition {
            id: PartId(1),
            name: "Reinforced".to_string(),
            perk_type: "Perk".to_string(),
            shield_type: ShieldType::General,
            slot: Some(1),
            requirements: None,
        });
        assert!(CatalogStore::from_snapshot(snapshot).is_ok());
    }

    #[test]
    fn malformed_requirement_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.weapon_parts[1].requirements = Some("part:1 &".to_string());
        let err = CatalogStore::from_snapshot(snapshot).expect_err("malformed");
        assert!(matches!(err, CatalogError::Requirement { id: PartId(2), .. }));
    }

    #[test]
    fn requirement_on_missing_part_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.weapon_parts[1].requirements = Some("part:99".to_string());
        let err = CatalogStore::from_snapshot(snapshot).expect_err("dangling");
        assert!(matches!(err, CatalogError::DanglingReference { value, .. } if value == "99"));
    }

    #[test]
    fn unclassifiable_generic_part_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.weapon_parts.push(weapon(5, "jakobs", "pistol", "Manufacturer Part"));
        let err = CatalogStore::from_snapshot(snapshot).expect_err("unclassified");
        assert!(matches!(err, CatalogError::Unclassified { id: PartId(5), .. }));
    }

    #[test]
    fn wrong_schema_is_fatal() {
        let mut snapshot = small_snapshot();
        snapshot.schema = "other".to_string();
        assert!(matches!(
            CatalogStore::from_snapshot(snapshot),
            Err(CatalogError::Schema { .. })
        ));
    }

    #[test]
    fn fingerprint_ignores_row_order() {
        let a = CatalogStore::from_snapshot(small_snapshot()).expect("store");
        let mut reversed = small_snapshot();
        reversed.weapon_parts.reverse();
        reversed.element_combos.reverse();
        let b = CatalogStore::from_snapshot(reversed).expect("store");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn combo_query_filters() {
        let store = CatalogStore::from_snapshot(small_snapshot()).expect("store");
        assert_eq!(store.element_combos_for(&ComboQuery::primary(Element::Fire)).len(), 1);
        assert!(
            store
                .element_combos_for(&ComboQuery::primary(Element::Fire).single())
                .is_empty()
        );
        assert!(
            store
                .element_combos_for(&ComboQuery::primary(Element::Fire).underbarrel(false))
                .is_empty()
        );
        assert_eq!(
            store.find_combo(Element::Fire, Some(Element::Shock), true).map(|c| c.id),
            Some(ComboId(2))
        );
    }
}
