use crate::model::{DailySnapshot, Detail};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whole-file JSON map of every item id ever processed, keyed to the date
/// it was first seen. Append-only; never pruned.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl SeenStore {
    pub fn load(path: &Path) -> Result<Self> {
        let entries = load_json_map(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn mark(&mut self, id: &str, first_seen: &str) {
        self.entries
            .entry(id.to_string())
            .or_insert_with(|| first_seen.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        save_json(&self.path, &self.entries)
    }
}

/// Per-id extracted detail fields, written once per id. An existing entry
/// is never refetched; post-publication edits to source pages are an
/// accepted staleness risk.
#[derive(Debug)]
pub struct DetailCache {
    path: PathBuf,
    entries: BTreeMap<String, Detail>,
}

impl DetailCache {
    pub fn load(path: &Path) -> Result<Self> {
        let entries = load_json_map(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Detail> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Inserts and persists immediately, so details fetched before a later
    /// crash survive into the next run.
    pub fn insert_and_save(&mut self, id: &str, detail: Detail) -> Result<()> {
        self.entries.insert(id.to_string(), detail);
        self.save()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn save(&self) -> Result<()> {
        save_json(&self.path, &self.entries)
    }
}

/// One snapshot file per calendar day, pruned to a seven-day window.
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
}

pub const SNAPSHOT_RETENTION_DAYS: i64 = 7;

impl SnapshotStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path_for(&self, date: &str) -> PathBuf {
        self.dir.join(format!("snapshot-{date}.json"))
    }

    pub fn write(&self, snapshot: &DailySnapshot) -> Result<PathBuf> {
        let path = self.path_for(&snapshot.date);
        save_json(&path, snapshot)?;
        Ok(path)
    }

    pub fn read(&self, date: &str) -> Result<DailySnapshot> {
        let path = self.path_for(date);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    /// Deletes snapshot files older than the retention window relative to
    /// the given anchor date.
    pub fn prune(&self, today: NaiveDate) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0usize;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(date) = snapshot_file_date(name) else {
                continue;
            };

            if (today - date).num_days() > SNAPSHOT_RETENTION_DAYS {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove old snapshot {}", path.display()))?;
                warn!(file = %path.display(), "removed expired snapshot");
                removed += 1;
            }
        }

        Ok(removed)
    }
}

fn snapshot_file_date(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_suffix(".json")?;
    let date = stem.strip_prefix("snapshot-")?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn load_json_map<V: serde::de::DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, V>> {
    if !path.exists() {
        debug!(path = %path.display(), "store file absent; starting empty");
        return Ok(BTreeMap::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read store file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse store file {}", path.display()))
}

fn save_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create store directory {}", parent.display()))?;
    }

    let serialized = serde_json::to_string_pretty(value)?;
    std::fs::write(path, serialized)
        .with_context(|| format!("failed to write store file {}", path.display()))?;
    Ok(())
}
