//! Default filesystem-backed and in-memory port implementations.

use crate::ports::{CatalogSource, HistoryStore};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use loadout_types::catalog::CatalogSnapshot;
use loadout_types::history::EditHistoryEntry;
use loadout_types::ids::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::sync::Mutex;
use tracing::debug;

/// Loads the catalog directory via `loadout_catalog::load_catalog_dir`.
#[derive(Debug, Clone)]
pub struct FsCatalogSource {
    pub dir: Utf8PathBuf,
}

impl FsCatalogSource {
    pub fn new(dir: Utf8PathBuf) -> Self {
        Self { dir }
    }
}

impl CatalogSource for FsCatalogSource {
    fn load_catalog(&self) -> anyhow::Result<CatalogSnapshot> {
        loadout_catalog::load_catalog_dir(&self.dir)
            .with_context(|| format!("load catalog from {}", self.dir))
    }
}

/// Pre-built snapshot, for embedding and testing.
#[derive(Debug, Clone)]
pub struct InMemoryCatalogSource {
    snapshot: CatalogSnapshot,
}

impl InMemoryCatalogSource {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot }
    }
}

impl CatalogSource for InMemoryCatalogSource {
    fn load_catalog(&self) -> anyhow::Result<CatalogSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// History kept in process memory, grouped by item in append order.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    entries: Mutex<BTreeMap<ItemId, Vec<EditHistoryEntry>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&self, item: &ItemId, entry: &EditHistoryEntry) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory history lock poisoned"))?;
        entries.entry(item.clone()).or_default().push(entry.clone());
        Ok(())
    }

    fn entries(&self, item: &ItemId) -> anyhow::Result<Vec<EditHistoryEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory history lock poisoned"))?;
        Ok(entries.get(item).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonlRecord {
    item: ItemId,
    #[serde(flatten)]
    entry: EditHistoryEntry,
}

/// One JSON object per line, appended. The file and its parent directories
/// are created on first append.
#[derive(Debug)]
pub struct JsonlHistoryStore {
    path: Utf8PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn append(&self, item: &ItemId, entry: &EditHistoryEntry) -> anyhow::Result<()> {
        let record = JsonlRecord {
            item: item.clone(),
            entry: entry.clone(),
        };
        let mut line = serde_json::to_string(&record).context("serialize history entry")?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("history file lock poisoned"))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", self.path))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append to {}", self.path))?;
        debug!(path = %self.path, %item, "appended history line");
        Ok(())
    }

    fn entries(&self, item: &ItemId) -> anyhow::Result<Vec<EditHistoryEntry>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let file = fs::File::open(&self.path)?;
        let mut out = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("read {}", self.path))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: JsonlRecord = serde_json::from_str(&line)
                .with_context(|| format!("parse {} line {}", self.path, n + 1))?;
            if &record.item == item {
                out.push(record.entry);
            }
        }
        Ok(out)
    }
}
