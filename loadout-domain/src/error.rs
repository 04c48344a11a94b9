use loadout_catalog::RequirementError;
use loadout_types::catalog::{PartFamily, ShieldType};
use loadout_types::ids::{ComboId, ItemType, Manufacturer, PairingId, PartId, SlotKey};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Caller-visible rejection of a proposal or serial. None of these are fatal
/// to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("manufacturer '{manufacturer}' does not produce item type '{item_type}'")]
    UnknownPairing {
        manufacturer: Manufacturer,
        item_type: ItemType,
    },

    #[error("slot conflict at {slot}: {kind}")]
    SlotConflict { slot: SlotKey, kind: SlotConflictKind },

    #[error("{family} part {part} in slot {slot} requires {requirement}")]
    UnsatisfiedRequirement {
        part: PartId,
        family: PartFamily,
        slot: SlotKey,
        requirement: String,
    },

    #[error("invalid element combo {choice}: {reason}")]
    InvalidElementCombo {
        choice: String,
        reason: ComboRejection,
    },

    #[error(transparent)]
    MalformedRequirement(#[from] RequirementError),

    #[error("malformed serial '{serial}': {reason}")]
    MalformedSerial { serial: String, reason: String },

    #[error("unknown {0}")]
    UnknownReference(Reference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownPairing,
    SlotConflict,
    UnsatisfiedRequirement,
    InvalidElementCombo,
    MalformedRequirement,
    MalformedSerial,
    UnknownReference,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownPairing => "unknown_pairing",
            ErrorKind::SlotConflict => "slot_conflict",
            ErrorKind::UnsatisfiedRequirement => "unsatisfied_requirement",
            ErrorKind::InvalidElementCombo => "invalid_element_combo",
            ErrorKind::MalformedRequirement => "malformed_requirement",
            ErrorKind::MalformedSerial => "malformed_serial",
            ErrorKind::UnknownReference => "unknown_reference",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::UnknownPairing { .. } => ErrorKind::UnknownPairing,
            BuildError::SlotConflict { .. } => ErrorKind::SlotConflict,
            BuildError::UnsatisfiedRequirement { .. } => ErrorKind::UnsatisfiedRequirement,
            BuildError::InvalidElementCombo { .. } => ErrorKind::InvalidElementCombo,
            BuildError::MalformedRequirement(_) => ErrorKind::MalformedRequirement,
            BuildError::MalformedSerial { .. } => ErrorKind::MalformedSerial,
            BuildError::UnknownReference(_) => ErrorKind::UnknownReference,
        }
    }

    /// The identifier a caller should show next to the error kind, if any.
    pub fn offending_id(&self) -> Option<String> {
        match self {
            BuildError::UnknownPairing {
                manufacturer,
                item_type,
            } => Some(format!("{manufacturer}/{item_type}")),
            BuildError::SlotConflict { slot, .. } => Some(slot.to_string()),
            BuildError::UnsatisfiedRequirement { part, .. } => Some(part.to_string()),
            BuildError::InvalidElementCombo { choice, .. } => Some(choice.clone()),
            BuildError::MalformedRequirement(_) | BuildError::MalformedSerial { .. } => None,
            BuildError::UnknownReference(reference) => Some(reference.id()),
        }
    }

    pub(crate) fn malformed_serial(serial: &str, reason: impl Into<String>) -> Self {
        BuildError::MalformedSerial {
            serial: serial.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotConflictKind {
    #[error("claimed by both part {first} and part {second}")]
    Duplicate { first: PartId, second: PartId },

    #[error("index is beyond the slot capacity of {capacity}")]
    OverCapacity { capacity: u8 },

    #[error("{family} slots are not available on {item_type}")]
    WrongFamily {
        family: PartFamily,
        item_type: ItemType,
    },

    #[error("part {part} is '{found}' but the slot takes '{accepts}'")]
    NotAccepted {
        part: PartId,
        found: String,
        accepts: String,
    },

    #[error("{shield_type} perks {first} and {second} are alternatives in slot group {group}")]
    SlotGroup {
        shield_type: ShieldType,
        group: String,
        first: PartId,
        second: PartId,
    },

    #[error("only one '{perk_type}' perk is allowed, found {first} and {second}")]
    ExclusivePerkType {
        perk_type: String,
        first: PartId,
        second: PartId,
    },

    #[error("{label} needs at least {min} part(s), found {found}")]
    Missing { label: String, min: u8, found: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComboRejection {
    #[error("no such combination in the catalog")]
    NotInCatalog,

    #[error("{item_type} items carry no element")]
    NotElemental { item_type: ItemType },

    #[error("{item_type} items have no underbarrel attachment")]
    UnderbarrelUnsupported { item_type: ItemType },
}

/// Identifier that did not resolve in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Pairing(PairingId),
    Combo(ComboId),
    Slot(u16),
    Part { family: PartFamily, id: PartId },
}

impl Reference {
    pub fn id(&self) -> String {
        match self {
            Reference::Pairing(id) => id.to_string(),
            Reference::Combo(id) => id.to_string(),
            Reference::Slot(code) => code.to_string(),
            Reference::Part { id, .. } => id.to_string(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Pairing(id) => write!(f, "pairing {id}"),
            Reference::Combo(id) => write!(f, "element combo {id}"),
            Reference::Slot(code) => write!(f, "slot code {code}"),
            Reference::Part { family, id } => write!(f, "{family} part {id}"),
        }
    }
}
