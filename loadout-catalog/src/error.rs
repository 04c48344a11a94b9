use crate::requirements::RequirementError;
use camino::Utf8PathBuf;
use loadout_types::catalog::PartFamily;
use loadout_types::ids::PartId;
use thiserror::Error;

/// Catalog load failure. Always fatal: an inconsistent catalog would
/// silently validate illegal builds.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json parse error in {path}: {source}")]
    Json {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("glob error: {message}")]
    Glob { message: String },

    #[error("{context}: unsupported schema '{found}', expected '{expected}'")]
    Schema {
        context: String,
        found: String,
        expected: &'static str,
    },

    #[error("duplicate {collection} row: {key}")]
    Duplicate {
        collection: &'static str,
        key: String,
    },

    #[error("{collection} row {key} references unknown {target} '{value}'")]
    DanglingReference {
        collection: &'static str,
        key: String,
        target: &'static str,
        value: String,
    },

    #[error("invalid {collection} row {key}: {reason}")]
    Invalid {
        collection: &'static str,
        key: String,
        reason: String,
    },

    #[error("weapon part {id} ({part_string}) has a generic part type that cannot be classified")]
    Unclassified { id: PartId, part_string: String },

    #[error("{family} part {id}: {source}")]
    Requirement {
        family: PartFamily,
        id: PartId,
        #[source]
        source: RequirementError,
    },
}
