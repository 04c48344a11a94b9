//! Catalog loading and indexing.
//!
//! Unlike most inputs in the workspace, the catalog is loaded strictly: any
//! duplicate row, dangling reference or unparseable requirement is a
//! [`CatalogError`] and the engine must not start with it. Once built, a
//! [`CatalogStore`] is immutable and can be shared freely across threads.

mod classify;
mod error;
mod load;
pub mod requirements;
mod store;

pub use error::CatalogError;
pub use load::load_catalog_dir;
pub use requirements::{Predicate, RequirementContext, RequirementError, RequirementErrorKind};
pub use store::{CatalogPart, CatalogStore, CatalogSummary, ComboQuery};
