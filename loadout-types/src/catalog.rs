use crate::element::ElementCombo;
use crate::ids::{ItemType, Manufacturer, PairingId, PartId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerTypePairing {
    pub id: PairingId,
    pub manufacturer: Manufacturer,
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemClass {
    Weapon,
    Heavy,
    Shield,
    Repkit,
    Gadget,
    ClassMod,
    Enhancement,
}

impl ItemClass {
    /// Part family that may be slotted into items of this class, if any.
    pub fn part_family(&self) -> Option<PartFamily> {
        match self {
            ItemClass::Weapon | ItemClass::Heavy => Some(PartFamily::Weapon),
            ItemClass::Shield => Some(PartFamily::Shield),
            ItemClass::Repkit => Some(PartFamily::Repkit),
            ItemClass::Gadget => Some(PartFamily::Gadget),
            ItemClass::ClassMod | ItemClass::Enhancement => None,
        }
    }
}

/// Shield perk grouping. General perks fit every shield; Energy and Armour
/// perks only fit shields of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShieldType {
    General,
    Energy,
    #[serde(alias = "Armor")]
    Armour,
}

impl ShieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShieldType::General => "General",
            ShieldType::Energy => "Energy",
            ShieldType::Armour => "Armour",
        }
    }
}

impl fmt::Display for ShieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traits of an item category, used by element and slot checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTypeDefinition {
    pub name: ItemType,
    pub class: ItemClass,

    #[serde(default)]
    pub elemental: bool,

    #[serde(default)]
    pub underbarrel: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield_kind: Option<ShieldType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartFamily {
    Weapon,
    Shield,
    Repkit,
    Gadget,
}

impl PartFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartFamily::Weapon => "weapon",
            PartFamily::Shield => "shield",
            PartFamily::Repkit => "repkit",
            PartFamily::Gadget => "gadget",
        }
    }
}

impl fmt::Display for PartFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attachment position definition. `accepts` names the weapon part type or
/// shield type a slot takes; `None` accepts any part of the family.
///
/// `min` is the number of indices a build must fill, enforced only when the
/// catalog offers the pairing at least one part for the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRule {
    pub code: u16,
    pub family: PartFamily,
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepts: Option<String>,

    pub capacity: u8,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub min: u8,
}

fn is_zero(n: &u8) -> bool {
    *n == 0
}

/// Generic weapon part type that is reclassified from its part string at load.
pub const GENERIC_MANUFACTURER_PART: &str = "Manufacturer Part";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponPartDefinition {
    pub id: PartId,
    pub manufacturer: Manufacturer,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_type: Option<ItemType>,

    pub part_type: String,
    pub part_string: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    /// Licensed parts may be fitted to other manufacturers' weapons.
    #[serde(default)]
    pub cross_compatible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldPartDefinition {
    pub id: PartId,
    pub name: String,
    pub perk_type: String,
    pub shield_type: ShieldType,

    /// Slot group; perks sharing a shield type and slot are alternatives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepkitPartDefinition {
    pub id: PartId,
    pub name: String,
    pub perk_type: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadgetPartDefinition {
    pub id: PartId,
    pub name: String,
    pub perk_type: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

/// Any catalog part, tagged with its family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum PartDefinition {
    Weapon(WeaponPartDefinition),
    Shield(ShieldPartDefinition),
    Repkit(RepkitPartDefinition),
    Gadget(GadgetPartDefinition),
}

impl PartDefinition {
    pub fn id(&self) -> PartId {
        match self {
            PartDefinition::Weapon(p) => p.id,
            PartDefinition::Shield(p) => p.id,
            PartDefinition::Repkit(p) => p.id,
            PartDefinition::Gadget(p) => p.id,
        }
    }

    pub fn family(&self) -> PartFamily {
        match self {
            PartDefinition::Weapon(_) => PartFamily::Weapon,
            PartDefinition::Shield(_) => PartFamily::Shield,
            PartDefinition::Repkit(_) => PartFamily::Repkit,
            PartDefinition::Gadget(_) => PartFamily::Gadget,
        }
    }

    /// Display name: model name or part string for weapon parts, perk name otherwise.
    pub fn name(&self) -> &str {
        match self {
            PartDefinition::Weapon(p) => p.model_name.as_deref().unwrap_or(&p.part_string),
            PartDefinition::Shield(p) => &p.name,
            PartDefinition::Repkit(p) => &p.name,
            PartDefinition::Gadget(p) => &p.name,
        }
    }

    /// Weapon part type, or perk type for the perk families.
    pub fn part_type(&self) -> &str {
        match self {
            PartDefinition::Weapon(p) => &p.part_type,
            PartDefinition::Shield(p) => &p.perk_type,
            PartDefinition::Repkit(p) => &p.perk_type,
            PartDefinition::Gadget(p) => &p.perk_type,
        }
    }

    /// The token a [`SlotRule::accepts`] filter is compared against.
    pub fn slot_token(&self) -> &str {
        match self {
            PartDefinition::Weapon(p) => &p.part_type,
            PartDefinition::Shield(p) => p.shield_type.as_str(),
            PartDefinition::Repkit(p) => &p.perk_type,
            PartDefinition::Gadget(p) => &p.perk_type,
        }
    }

    pub fn is_cross_compatible(&self) -> bool {
        matches!(self, PartDefinition::Weapon(p) if p.cross_compatible)
    }

    pub fn requirements(&self) -> Option<&str> {
        match self {
            PartDefinition::Weapon(p) => p.requirements.as_deref(),
            PartDefinition::Shield(p) => p.requirements.as_deref(),
            PartDefinition::Repkit(p) => p.requirements.as_deref(),
            PartDefinition::Gadget(p) => p.requirements.as_deref(),
        }
    }
}

/// The full reference data set in persisted form. `catalog.json` supplies the
/// non-part collections; part shards fill the part vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub schema: String,

    #[serde(default)]
    pub element_combos: Vec<ElementCombo>,

    #[serde(default)]
    pub item_types: Vec<ItemTypeDefinition>,

    #[serde(default)]
    pub pairings: Vec<ManufacturerTypePairing>,

    #[serde(default)]
    pub slot_rules: Vec<SlotRule>,

    /// Perk types of which a single item may carry at most one.
    #[serde(default)]
    pub exclusive_perk_types: Vec<String>,

    #[serde(default)]
    pub weapon_parts: Vec<WeaponPartDefinition>,

    #[serde(default)]
    pub shield_parts: Vec<ShieldPartDefinition>,

    #[serde(default)]
    pub repkit_parts: Vec<RepkitPartDefinition>,

    #[serde(default)]
    pub gadget_parts: Vec<GadgetPartDefinition>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self {
            schema: crate::schema::LOADOUT_CATALOG_V1.to_string(),
            ..Self::default()
        }
    }
}
