//! Clap-free settings for the engine.

use camino::Utf8PathBuf;
use loadout_domain::SlotPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Directory holding `catalog.json` and `parts/*.json`.
    pub catalog_dir: Utf8PathBuf,

    /// JSONL file history entries are appended to.
    pub history_path: Utf8PathBuf,

    pub slot_policy: SlotPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            catalog_dir: Utf8PathBuf::from("catalog"),
            history_path: Utf8PathBuf::from("history/loadout-history.jsonl"),
            slot_policy: SlotPolicy::default(),
        }
    }
}
