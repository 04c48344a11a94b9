//! Embeddable core library for loadout.
//!
//! Provides a clap-free, I/O-abstracted [`Engine`](engine::Engine) that
//! loads a catalog, validates and composes builds, parses serials and records
//! edit history.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`CatalogSource`](ports::CatalogSource) loads the reference catalog
//! - [`HistoryStore`](ports::HistoryStore) appends and reads history entries
//!
//! The [`adapters`] module provides filesystem and in-memory implementations.

pub mod adapters;
pub mod engine;
pub mod ports;
pub mod settings;

pub use engine::{Engine, EngineError};

// Re-exported so embedders need not depend on the lower crates directly.
pub use loadout_domain::{BuildError, ErrorKind, SlotPolicy};
pub use loadout_types::build::{Build, BuildProposal, ElementChoice};
pub use loadout_types::history::EditHistoryEntry;
pub use loadout_types::ids::ItemId;
