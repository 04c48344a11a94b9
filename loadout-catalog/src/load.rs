use crate::error::CatalogError;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::glob;
use loadout_types::catalog::{CatalogSnapshot, PartFamily};
use loadout_types::schema::{LOADOUT_CATALOG_V1, LOADOUT_PARTS_V1};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// On-disk part shard: one family's rows under `parts/*.json`.
#[derive(Debug, Deserialize)]
struct PartShard {
    schema: String,
    family: PartFamily,
    #[serde(default)]
    parts: serde_json::Value,
}

/// Reads `catalog.json` plus every `parts/*.json` shard under `dir`.
///
/// Shards are merged in sorted path order so the resulting snapshot does not
/// depend on directory iteration order.
pub fn load_catalog_dir(dir: &Utf8Path) -> Result<CatalogSnapshot, CatalogError> {
    let manifest_path = dir.join("catalog.json");
    let mut snapshot: CatalogSnapshot = read_json(&manifest_path)?;
    if snapshot.schema != LOADOUT_CATALOG_V1 {
        return Err(CatalogError::Schema {
            context: manifest_path.to_string(),
            found: snapshot.schema,
            expected: LOADOUT_CATALOG_V1,
        });
    }

    let pattern = dir.join("parts/*.json");
    debug!(pattern = %pattern, "scanning catalog part shards");

    let mut shard_paths = Vec::new();
    for entry in glob(pattern.as_str()).map_err(|e| CatalogError::Glob {
        message: e.to_string(),
    })? {
        let path = entry.map_err(|e| CatalogError::Glob {
            message: e.to_string(),
        })?;
        let path = Utf8PathBuf::from_path_buf(path).map_err(|p| CatalogError::Glob {
            message: format!("non-utf8 shard path {}", p.display()),
        })?;
        shard_paths.push(path);
    }
    shard_paths.sort();

    for path in shard_paths {
        let shard: PartShard = read_json(&path)?;
        if shard.schema != LOADOUT_PARTS_V1 {
            return Err(CatalogError::Schema {
                context: path.to_string(),
                found: shard.schema,
                expected: LOADOUT_PARTS_V1,
            });
        }
        debug!(path = %path, family = %shard.family, "loading part shard");
        match shard.family {
            PartFamily::Weapon => snapshot.weapon_parts.extend(rows(&path, shard.parts)?),
            PartFamily::Shield => snapshot.shield_parts.extend(rows(&path, shard.parts)?),
            PartFamily::Repkit => snapshot.repkit_parts.extend(rows(&path, shard.parts)?),
            PartFamily::Gadget => snapshot.gadget_parts.extend(rows(&path, shard.parts)?),
        }
    }

    Ok(snapshot)
}

fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn rows<T: DeserializeOwned>(path: &Utf8Path, value: serde_json::Value) -> Result<Vec<T>, CatalogError> {
    if value.is_null() {
        return Ok(vec![]);
    }
    serde_json::from_value(value).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}
