//! Domain logic: decide whether a proposed build is legal and turn legal
//! builds into their canonical forms.
//!
//! Everything here is a pure function over an immutable
//! [`loadout_catalog::CatalogStore`]. Nothing is persisted; recording edits is
//! the `loadout-history` crate's job.

mod composer;
mod error;
mod render;
mod resolver;
pub mod serial;

pub use composer::BuildComposer;
pub use error::{BuildError, ComboRejection, ErrorKind, Reference, SlotConflictKind};
pub use resolver::{
    CompatibilityResolver, ResolvedSlot, ResolverConfig, SlotPolicy, ValidatedSelection, slot_accepts,
};
