//! Port traits abstracting all I/O away from the engine.

use loadout_types::catalog::CatalogSnapshot;

pub use loadout_history::HistoryStore;

/// Source of the reference catalog rows. Validation happens in the engine.
pub trait CatalogSource {
    fn load_catalog(&self) -> anyhow::Result<CatalogSnapshot>;
}
