//! Shared DTOs (schemas-as-code) for the loadout workspace.
//!
//! # Design constraints
//! - Catalog rows and history entries are persisted by external stores.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod build;
pub mod catalog;
pub mod element;
pub mod history;
pub mod ids;

/// Schema identifiers.
pub mod schema {
    pub const LOADOUT_CATALOG_V1: &str = "loadout.catalog.v1";
    pub const LOADOUT_PARTS_V1: &str = "loadout.parts.v1";
    pub const LOADOUT_HISTORY_V1: &str = "loadout.history.v1";

    /// Version tag leading every canonical build serial.
    pub const LOADOUT_SERIAL_V1: &str = "LB1";
}
