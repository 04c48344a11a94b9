use crate::catalog::PartFamily;
use crate::element::{Element, ElementCombo};
use crate::ids::{ItemType, Manufacturer, PairingId, PartId, SlotKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One proposed slot occupation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub slot: SlotKey,
    pub part: PartId,
}

impl SlotAssignment {
    pub fn new(slot: SlotKey, part: PartId) -> Self {
        Self { slot, part }
    }
}

/// Requested elemental configuration; must match a catalog row exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementChoice {
    pub primary: Element,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Element>,

    #[serde(default)]
    pub underbarrel: bool,
}

impl ElementChoice {
    pub fn single(primary: Element) -> Self {
        Self {
            primary,
            secondary: None,
            underbarrel: false,
        }
    }

    pub fn dual(primary: Element, secondary: Element, underbarrel: bool) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
            underbarrel,
        }
    }
}

impl From<&ElementCombo> for ElementChoice {
    fn from(combo: &ElementCombo) -> Self {
        Self {
            primary: combo.primary_element,
            secondary: combo.secondary_element,
            underbarrel: combo.underbarrel,
        }
    }
}

/// Caller-submitted selection, validated before anything is composed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProposal {
    pub manufacturer: Manufacturer,
    pub item_type: ItemType,

    #[serde(default)]
    pub parts: Vec<SlotAssignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementChoice>,
}

impl BuildProposal {
    pub fn new(manufacturer: impl Into<Manufacturer>, item_type: impl Into<ItemType>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            item_type: item_type.into(),
            parts: vec![],
            element: None,
        }
    }

    pub fn with_part(mut self, code: u16, index: u8, part: u32) -> Self {
        self.parts
            .push(SlotAssignment::new(SlotKey::new(code, index), PartId(part)));
        self
    }

    pub fn with_element(mut self, element: ElementChoice) -> Self {
        self.element = Some(element);
        self
    }
}

/// Resolved reference to a catalog part, as stored on a [`Build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPart {
    pub family: PartFamily,
    pub id: PartId,
    pub name: String,
    pub part_type: String,
}

/// Canonical, validated build. Only produced by composition; never partially
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub manufacturer: Manufacturer,
    pub item_type: ItemType,
    pub pairing_id: PairingId,

    #[serde(default)]
    pub selected_parts: BTreeMap<SlotKey, SelectedPart>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_combo: Option<ElementCombo>,

    pub serial: String,
    pub component_string: String,
}

impl Build {
    /// Human-facing item name, e.g. `Jakobs Pistol`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.manufacturer.title(), self.item_type.title())
    }

    /// The proposal that composes back to this build.
    pub fn to_proposal(&self) -> BuildProposal {
        BuildProposal {
            manufacturer: self.manufacturer.clone(),
            item_type: self.item_type.clone(),
            parts: self
                .selected_parts
                .iter()
                .map(|(slot, part)| SlotAssignment::new(*slot, part.id))
                .collect(),
            element: self.element_combo.as_ref().map(ElementChoice::from),
        }
    }
}
