use loadout_types::ids::ItemId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// The backing store refused or failed the append. Nothing was recorded.
    #[error("history store failed for item {item}")]
    Store {
        item: ItemId,
        #[source]
        source: anyhow::Error,
    },

    /// A writer panicked while holding the item's lock.
    #[error("history lock poisoned for item {item}")]
    Poisoned { item: ItemId },
}

impl HistoryError {
    pub fn item(&self) -> &ItemId {
        match self {
            HistoryError::Store { item, .. } | HistoryError::Poisoned { item } => item,
        }
    }
}
