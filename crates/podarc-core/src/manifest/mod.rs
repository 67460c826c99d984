//! Archive manifest (`manifest.json`): one entry per archived file.
//!
//! The store lives in memory as a map keyed by filename and is rewritten in
//! full through the atomic writer on every persist. During a run only the
//! scheduler's manifest task holds it.

mod show;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::atomic;

pub use show::{EpisodeSnapshot, ShowRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub source_url: String,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    /// Size of the file on disk after tagging.
    pub content_length: u64,
    /// Lowercase hex SHA-256, when checksums are enabled.
    #[serde(default)]
    pub checksum: Option<String>,
    pub metadata_embedded: bool,
    #[serde(default)]
    pub last_verified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
    path: PathBuf,
    entries: BTreeMap<String, ManifestEntry>,
}

impl ManifestStore {
    /// Empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads `path`, or an empty store if the file does not exist.
    /// Duplicate filenames in the file collapse to the last occurrence.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut store = Self::new(path.clone());
        let data = match std::fs::read(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(store),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        let list: Vec<ManifestEntry> = serde_json::from_slice(&data)
            .with_context(|| format!("parse manifest {}", path.display()))?;
        for entry in list {
            store.upsert(entry);
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts or replaces the entry with the same filename.
    pub fn upsert(&mut self, entry: ManifestEntry) {
        self.entries.insert(entry.filename.clone(), entry);
    }

    pub fn get(&self, filename: &str) -> Option<&ManifestEntry> {
        self.entries.get(filename)
    }

    pub fn get_mut(&mut self, filename: &str) -> Option<&mut ManifestEntry> {
        self.entries.get_mut(filename)
    }

    pub fn remove(&mut self, filename: &str) -> Option<ManifestEntry> {
        self.entries.remove(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    /// Entries sorted by filename.
    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Atomically rewrites the manifest file (pretty JSON array).
    pub fn persist(&self) -> Result<()> {
        let list: Vec<&ManifestEntry> = self.entries.values().collect();
        let mut json = serde_json::to_vec_pretty(&list).context("serialize manifest")?;
        json.push(b'\n');
        atomic::write_bytes(&self.path, &json)?;
        Ok(())
    }
}
