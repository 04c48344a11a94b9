//! The engine facade: one immutable catalog, a composer over it and a
//! history ledger.

use crate::adapters::{FsCatalogSource, JsonlHistoryStore};
use crate::ports::{CatalogSource, HistoryStore};
use crate::settings::EngineSettings;
use loadout_catalog::{CatalogError, CatalogStore, Predicate};
use loadout_domain::{BuildComposer, BuildError, ResolverConfig};
use loadout_history::{Clock, EditHistoryRecorder, HistoryError, HistoryLedger, SystemClock};
use loadout_types::build::{Build, BuildProposal};
use loadout_types::history::EditHistoryEntry;
use loadout_types::ids::ItemId;
use std::sync::Arc;
use tracing::info;

/// Exit code 2 = caller-visible build rejection, 1 = everything else.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, EngineError::Build(_))
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_rejection() { 2 } else { 1 }
    }
}

pub struct Engine {
    catalog: Arc<CatalogStore>,
    config: ResolverConfig,
    ledger: HistoryLedger<Arc<dyn HistoryStore>, Box<dyn Clock>>,
}

impl Engine {
    pub fn new(catalog: Arc<CatalogStore>, history: Arc<dyn HistoryStore>, settings: &EngineSettings) -> Self {
        let clock: Box<dyn Clock> = Box::new(SystemClock);
        Self {
            catalog,
            config: ResolverConfig {
                slot_policy: settings.slot_policy,
            },
            ledger: HistoryLedger::with_recorder(
                history,
                EditHistoryRecorder::with_clock(clock),
            ),
        }
    }

    /// Loads and validates the catalog from `source`. Any catalog violation
    /// is fatal.
    pub fn bootstrap(
        source: &dyn CatalogSource,
        history: Arc<dyn HistoryStore>,
        settings: &EngineSettings,
    ) -> Result<Self, EngineError> {
        let snapshot = source.load_catalog()?;
        let catalog = CatalogStore::from_snapshot(snapshot)?;
        info!(
            fingerprint = catalog.fingerprint(),
            slot_policy = ?settings.slot_policy,
            "engine ready"
        );
        Ok(Self::new(Arc::new(catalog), history, settings))
    }

    /// Filesystem catalog and JSONL history, both located by `settings`.
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, EngineError> {
        let source = FsCatalogSource::new(settings.catalog_dir.clone());
        let history = Arc::new(JsonlHistoryStore::new(settings.history_path.clone()));
        Self::bootstrap(&source, history, settings)
    }

    /// Replaces the clock used to stamp history entries.
    pub fn with_clock(self, clock: Box<dyn Clock>) -> Self {
        let store = Arc::clone(self.ledger.store());
        Self {
            ledger: HistoryLedger::with_recorder(store, EditHistoryRecorder::with_clock(clock)),
            ..self
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<CatalogStore> {
        Arc::clone(&self.catalog)
    }

    pub fn composer(&self) -> BuildComposer<'_> {
        BuildComposer::new(&self.catalog, self.config.clone())
    }

    pub fn validate_and_compose(&self, proposal: &BuildProposal) -> Result<Build, EngineError> {
        Ok(self.composer().compose(proposal)?)
    }

    pub fn parse_serial(&self, serial: &str) -> Result<Build, EngineError> {
        Ok(self.composer().parse(serial)?)
    }

    pub fn parse_requirements(&self, text: &str) -> Result<Predicate, EngineError> {
        self.catalog
            .parse_requirements(text)
            .map_err(|err| EngineError::Build(BuildError::from(err)))
    }

    /// Appends a history entry for `item`, or returns `Ok(None)` when the
    /// builds are identical.
    pub fn record_edit(
        &self,
        item: &ItemId,
        session_id: &str,
        user_id: u64,
        previous: Option<&Build>,
        next: Option<&Build>,
    ) -> Result<Option<EditHistoryEntry>, EngineError> {
        Ok(self.ledger.record(item, session_id, user_id, previous, next)?)
    }

    pub fn history(&self, item: &ItemId) -> Result<Vec<EditHistoryEntry>, EngineError> {
        Ok(self.ledger.entries(item)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_domain::ErrorKind;

    #[test]
    fn build_rejections_exit_with_two() {
        let err = EngineError::from(BuildError::MalformedSerial {
            serial: "x".to_string(),
            reason: "expected 4 fields, found 1".to_string(),
        });
        assert!(err.is_rejection());
        assert_eq!(err.exit_code(), 2);
        assert!(matches!(&err, EngineError::Build(b) if b.kind() == ErrorKind::MalformedSerial));
    }

    #[test]
    fn runtime_failures_exit_with_one() {
        let err = EngineError::from(anyhow::anyhow!("disk on fire"));
        assert!(!err.is_rejection());
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "disk on fire");

        let err = EngineError::from(HistoryError::Poisoned {
            item: ItemId::new("a"),
        });
        assert_eq!(err.exit_code(), 1);
    }
}
