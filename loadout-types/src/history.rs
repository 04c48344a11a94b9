use crate::build::SelectedPart;
use crate::ids::{ComboId, ItemType, Manufacturer, SlotKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Create,
    Update,
    Delete,
}

impl EditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditType::Create => "create",
            EditType::Update => "update",
            EditType::Delete => "delete",
        }
    }
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartChange {
    pub from: SelectedPart,
    pub to: SelectedPart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementChange {
    pub from: Option<ComboId>,
    pub to: Option<ComboId>,
}

/// Slot-level difference between two builds; the `parts_json` payload of a
/// history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartsDiff {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub added: BTreeMap<SlotKey, SelectedPart>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub removed: BTreeMap<SlotKey, SelectedPart>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changed: BTreeMap<SlotKey, PartChange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementChange>,
}

impl PartsDiff {
    /// Number of slot entries plus one for an element change.
    pub fn len(&self) -> usize {
        self.added.len()
            + self.removed.len()
            + self.changed.len()
            + usize::from(self.element.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable audit record. Stores only ever append these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditHistoryEntry {
    pub schema: String,
    pub session_id: String,
    pub user_id: u64,
    pub timestamp: DateTime<Utc>,
    pub edit_type: EditType,
    pub item_name: String,
    pub item_type: ItemType,
    pub manufacturer: Manufacturer,
    pub serial: String,
    pub component_string: String,
    pub parts_json: PartsDiff,
}
