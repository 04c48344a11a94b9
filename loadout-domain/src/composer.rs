use crate::error::{BuildError, Reference};
use crate::render;
use crate::resolver::{CompatibilityResolver, ResolverConfig, ValidatedSelection};
use crate::serial::{self, SerialFields};
use loadout_catalog::CatalogStore;
use loadout_types::build::{Build, BuildProposal, ElementChoice, SelectedPart, SlotAssignment};
use std::collections::BTreeMap;
use tracing::debug;

/// Turns proposals into canonical [`Build`]s and serials back into builds.
///
/// Validation is entirely the resolver's; the composer only shapes output.
#[derive(Debug, Clone)]
pub struct BuildComposer<'a> {
    resolver: CompatibilityResolver<'a>,
}

impl<'a> BuildComposer<'a> {
    pub fn new(catalog: &'a CatalogStore, config: ResolverConfig) -> Self {
        Self {
            resolver: CompatibilityResolver::new(catalog, config),
        }
    }

    pub fn resolver(&self) -> &CompatibilityResolver<'a> {
        &self.resolver
    }

    pub fn compose(&self, proposal: &BuildProposal) -> Result<Build, BuildError> {
        let selection = self.resolver.validate(proposal)?;
        let build = self.assemble(&selection);
        debug!(serial = %build.serial, parts = build.selected_parts.len(), "composed build");
        Ok(build)
    }

    /// Reconstructs the build a serial describes. Entry order in the input
    /// does not matter; the returned build carries the canonical serial.
    pub fn parse(&self, serial: &str) -> Result<Build, BuildError> {
        let fields = serial::decode(serial)?;
        let catalog = self.resolver.catalog();

        let pairing = catalog
            .pairing_by_id(fields.pairing)
            .ok_or(BuildError::UnknownReference(Reference::Pairing(fields.pairing)))?;
        let element = match fields.combo {
            Some(id) => {
                let combo = catalog
                    .combo(id)
                    .ok_or(BuildError::UnknownReference(Reference::Combo(id)))?;
                Some(ElementChoice::from(combo))
            }
            None => None,
        };

        let proposal = BuildProposal {
            manufacturer: pairing.manufacturer.clone(),
            item_type: pairing.item_type.clone(),
            parts: fields.parts,
            element,
        };
        self.compose(&proposal)
    }

    fn assemble(&self, selection: &ValidatedSelection<'a>) -> Build {
        let selected_parts: BTreeMap<_, _> = selection
            .parts
            .iter()
            .map(|resolved| {
                let definition = &resolved.part.definition;
                (
                    resolved.slot,
                    SelectedPart {
                        family: definition.family(),
                        id: definition.id(),
                        name: definition.name().to_string(),
                        part_type: definition.part_type().to_string(),
                    },
                )
            })
            .collect();

        let serial = serial::encode(&SerialFields {
            pairing: selection.pairing.id,
            combo: selection.combo.map(|c| c.id),
            parts: selected_parts
                .iter()
                .map(|(slot, part)| SlotAssignment::new(*slot, part.id))
                .collect(),
        });
        let component_string = render::component_string(
            self.resolver.catalog(),
            &selection.pairing.manufacturer,
            &selection.pairing.item_type,
            selection.combo,
            &selected_parts,
        );

        Build {
            manufacturer: selection.pairing.manufacturer.clone(),
            item_type: selection.pairing.item_type.clone(),
            pairing_id: selection.pairing.id,
            selected_parts,
            element_combo: selection.combo.cloned(),
            serial,
            component_string,
        }
    }
}
