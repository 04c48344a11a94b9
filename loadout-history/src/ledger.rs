use crate::error::HistoryError;
use crate::recorder::{Clock, EditHistoryRecorder, SystemClock};
use chrono::{DateTime, Duration, Utc};
use loadout_types::build::Build;
use loadout_types::history::EditHistoryEntry;
use loadout_types::ids::ItemId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Append-only persistence for history entries.
pub trait HistoryStore: Send + Sync {
    fn append(&self, item: &ItemId, entry: &EditHistoryEntry) -> anyhow::Result<()>;
    fn entries(&self, item: &ItemId) -> anyhow::Result<Vec<EditHistoryEntry>>;
}

impl<S: HistoryStore + ?Sized> HistoryStore for Arc<S> {
    fn append(&self, item: &ItemId, entry: &EditHistoryEntry) -> anyhow::Result<()> {
        (**self).append(item, entry)
    }

    fn entries(&self, item: &ItemId) -> anyhow::Result<Vec<EditHistoryEntry>> {
        (**self).entries(item)
    }
}

/// The newest entry of one item. `None` until the store has been consulted
/// for this item.
#[derive(Debug, Default)]
struct ItemClock {
    last: Option<Option<EditHistoryEntry>>,
}

/// Serializes appends per item so each item's history is totally ordered
/// with strictly increasing timestamps. Different items never wait on each
/// other.
///
/// Only items with a record in flight are tracked; an item's clock is
/// dropped once no caller holds it and is re-seeded from the store on the
/// next record.
pub struct HistoryLedger<S, C = SystemClock> {
    store: S,
    recorder: EditHistoryRecorder<C>,
    items: Mutex<HashMap<ItemId, Arc<Mutex<ItemClock>>>>,
}

impl<S: HistoryStore> HistoryLedger<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_recorder(store, EditHistoryRecorder::new())
    }
}

impl<S: HistoryStore, C: Clock> HistoryLedger<S, C> {
    pub fn with_recorder(store: S, recorder: EditHistoryRecorder<C>) -> Self {
        Self {
            store,
            recorder,
            items: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records and appends the edit. Returns `Ok(None)` when the builds are
    /// identical or when the edit repeats the item's newest entry. On a store
    /// failure nothing is recorded and the item's clock is left where it was.
    pub fn record(
        &self,
        item: &ItemId,
        session_id: &str,
        user_id: u64,
        previous: Option<&Build>,
        next: Option<&Build>,
    ) -> Result<Option<EditHistoryEntry>, HistoryError> {
        let slot = self.item_clock(item)?;
        let result = self.record_locked(&slot, item, session_id, user_id, previous, next);
        self.release(item, slot);
        result
    }

    fn record_locked(
        &self,
        slot: &Mutex<ItemClock>,
        item: &ItemId,
        session_id: &str,
        user_id: u64,
        previous: Option<&Build>,
        next: Option<&Build>,
    ) -> Result<Option<EditHistoryEntry>, HistoryError> {
        let mut clock = slot.lock().map_err(|_| HistoryError::Poisoned { item: item.clone() })?;

        let Some(mut entry) = self.recorder.record(session_id, user_id, previous, next) else {
            return Ok(None);
        };

        if clock.last.is_none() {
            let stored = self.store.entries(item).map_err(|source| HistoryError::Store {
                item: item.clone(),
                source,
            })?;
            clock.last = Some(stored.into_iter().max_by_key(|e| e.timestamp));
        }
        let last = clock.last.as_ref().and_then(Option::as_ref);

        if let Some(last) = last
            && repeats(last, &entry)
        {
            debug!(%item, edit_type = %entry.edit_type, "edit repeats the newest entry");
            return Ok(None);
        }
        if let Some(last) = last.map(|e| e.timestamp)
            && entry.timestamp <= last
        {
            debug!(%item, %last, proposed = %entry.timestamp, "bumping timestamp past last entry");
            entry.timestamp = last + Duration::microseconds(1);
        }

        if let Err(source) = self.store.append(item, &entry) {
            warn!(%item, error = %source, "history append failed");
            return Err(HistoryError::Store {
                item: item.clone(),
                source,
            });
        }
        clock.last = Some(Some(entry.clone()));

        info!(
            %item,
            edit_type = %entry.edit_type,
            changes = entry.parts_json.len(),
            timestamp = %entry.timestamp,
            "history entry appended"
        );
        Ok(Some(entry))
    }

    pub fn entries(&self, item: &ItemId) -> Result<Vec<EditHistoryEntry>, HistoryError> {
        self.store.entries(item).map_err(|source| HistoryError::Store {
            item: item.clone(),
            source,
        })
    }

    fn item_clock(&self, item: &ItemId) -> Result<Arc<Mutex<ItemClock>>, HistoryError> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| HistoryError::Poisoned { item: item.clone() })?;
        Ok(Arc::clone(items.entry(item.clone()).or_default()))
    }

    /// Drops the item's clock when `slot` and the map hold the only
    /// references. New holders are only handed out under the map lock.
    fn release(&self, item: &ItemId, slot: Arc<Mutex<ItemClock>>) {
        let Ok(mut items) = self.items.lock() else {
            return;
        };
        let held = items.get(item).is_some_and(|held| Arc::ptr_eq(held, &slot));
        if held && Arc::strong_count(&slot) == 2 {
            items.remove(item);
        }
    }

    #[cfg(test)]
    fn tracked_items(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }
}

/// A retried edit: same kind, same resulting serial, same diff.
fn repeats(last: &EditHistoryEntry, entry: &EditHistoryEntry) -> bool {
    last.edit_type == entry.edit_type && last.serial == entry.serial && last.parts_json == entry.parts_json
}
