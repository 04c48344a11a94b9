//! Configuration file loading for loadout.
//!
//! Discovers `loadout.toml` by walking up from the working directory and
//! merges it with CLI arguments (CLI takes precedence). Relative paths in the
//! file are resolved against the file's own directory.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use loadout_core::SlotPolicy;
use loadout_core::settings::EngineSettings;
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "loadout.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoadoutConfig {
    pub catalog: CatalogConfig,
    pub resolver: ResolverSection,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding `catalog.json` and `parts/`.
    pub dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    pub slot_policy: Option<SlotPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// JSONL file history entries are appended to.
    pub path: Option<Utf8PathBuf>,
}

/// Nearest `loadout.toml` in `start` or any of its ancestors.
pub fn discover_config(start: &Utf8Path) -> Option<Utf8PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            debug!("found config file at {}", candidate);
            return Some(candidate);
        }
    }
    debug!("no {} found above {}", CONFIG_FILE_NAME, start);
    None
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<LoadoutConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<LoadoutConfig> {
    let config: LoadoutConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// A loaded config together with the directory its relative paths hang off.
#[derive(Debug, Clone)]
pub struct LocatedConfig {
    pub config: LoadoutConfig,
    pub base_dir: Utf8PathBuf,
}

/// Loads `explicit` if given, otherwise the discovered file, otherwise
/// defaults rooted at `cwd`.
pub fn locate(explicit: Option<&Utf8Path>, cwd: &Utf8Path) -> anyhow::Result<LocatedConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(cwd),
    };
    match path {
        Some(path) => {
            let config = load_config(&path)?;
            let base_dir = path
                .parent()
                .filter(|p| !p.as_str().is_empty())
                .map(Utf8Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf());
            Ok(LocatedConfig { config, base_dir })
        }
        None => Ok(LocatedConfig {
            config: LoadoutConfig::default(),
            base_dir: cwd.to_path_buf(),
        }),
    }
}

/// CLI values that override the file when present.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub catalog_dir: Option<Utf8PathBuf>,
    pub history_path: Option<Utf8PathBuf>,
    pub slot_policy: Option<SlotPolicy>,
}

pub struct ConfigMerger;

impl ConfigMerger {
    pub fn merge(located: &LocatedConfig, cli: &CliOverrides) -> EngineSettings {
        let defaults = EngineSettings::default();
        let from_file = |path: &Option<Utf8PathBuf>| {
            path.as_ref().map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    located.base_dir.join(p)
                }
            })
        };

        EngineSettings {
            catalog_dir: cli
                .catalog_dir
                .clone()
                .or_else(|| from_file(&located.config.catalog.dir))
                .unwrap_or_else(|| located.base_dir.join(&defaults.catalog_dir)),
            history_path: cli
                .history_path
                .clone()
                .or_else(|| from_file(&located.config.history.path))
                .unwrap_or_else(|| located.base_dir.join(&defaults.history_path)),
            slot_policy: cli
                .slot_policy
                .or(located.config.resolver.slot_policy)
                .unwrap_or(defaults.slot_policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn located(contents: &str, base: &str) -> LocatedConfig {
        LocatedConfig {
            config: parse_config(contents).expect("parse"),
            base_dir: Utf8PathBuf::from(base),
        }
    }

    #[test]
    fn empty_file_uses_defaults_under_base_dir() {
        let settings = ConfigMerger::merge(&located("", "/work"), &CliOverrides::default());
        assert_eq!(settings.catalog_dir, Utf8PathBuf::from("/work/catalog"));
        assert_eq!(
            settings.history_path,
            Utf8PathBuf::from("/work/history/loadout-history.jsonl")
        );
        assert_eq!(settings.slot_policy, SlotPolicy::Exclusive);
    }

    #[test]
    fn file_values_resolve_against_the_config_dir() {
        let cfg = located(
            r#"
[catalog]
dir = "data/catalog"

[resolver]
slot_policy = "per_slot"

[history]
path = "/var/lib/loadout/history.jsonl"
"#,
            "/work",
        );
        let settings = ConfigMerger::merge(&cfg, &CliOverrides::default());
        assert_eq!(settings.catalog_dir, Utf8PathBuf::from("/work/data/catalog"));
        assert_eq!(
            settings.history_path,
            Utf8PathBuf::from("/var/lib/loadout/history.jsonl")
        );
        assert_eq!(settings.slot_policy, SlotPolicy::PerSlot);
    }

    #[test]
    fn cli_flags_win_over_the_file() {
        let cfg = located("[resolver]\nslot_policy = \"per_slot\"\n[catalog]\ndir = \"a\"\n", "/work");
        let cli = CliOverrides {
            catalog_dir: Some(Utf8PathBuf::from("b")),
            history_path: None,
            slot_policy: Some(SlotPolicy::Exclusive),
        };
        let settings = ConfigMerger::merge(&cfg, &cli);
        assert_eq!(settings.catalog_dir, Utf8PathBuf::from("b"));
        assert_eq!(settings.slot_policy, SlotPolicy::Exclusive);
    }

    #[test]
    fn unknown_slot_policy_is_rejected() {
        assert!(parse_config("[resolver]\nslot_policy = \"sometimes\"\n").is_err());
    }

    #[test]
    fn discovery_walks_up_from_nested_dirs() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        fs::write(root.join(CONFIG_FILE_NAME), "[catalog]\ndir = \"cat\"\n").expect("write");
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).expect("mkdir");

        assert_eq!(discover_config(&nested), Some(root.join(CONFIG_FILE_NAME)));
        let located = locate(None, &nested).expect("locate");
        assert_eq!(located.base_dir, root);
        assert_eq!(
            ConfigMerger::merge(&located, &CliOverrides::default()).catalog_dir,
            root.join("cat")
        );
    }
}
