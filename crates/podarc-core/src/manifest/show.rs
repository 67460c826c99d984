//! `show.json`: channel metadata plus per-episode snapshots, so tags can be
//! rebuilt and the import feed written without the network.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::atomic;
use crate::feed::{ChannelMetadata, EpisodeRecord};
use crate::planner::ArchivalJob;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    pub record: EpisodeRecord,
    pub track_number: u32,
    pub track_total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowRecord {
    pub feed_url: Option<String>,
    pub channel: ChannelMetadata,
    /// Keyed by episode filename.
    #[serde(default)]
    pub episodes: BTreeMap<String, EpisodeSnapshot>,
}

impl ShowRecord {
    pub fn new(feed_url: Option<String>, channel: ChannelMetadata) -> Self {
        Self {
            feed_url,
            channel,
            episodes: BTreeMap::new(),
        }
    }

    /// `None` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read(path) {
            Ok(data) => serde_json::from_slice(&data)
                .map(Some)
                .with_context(|| format!("parse {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    /// Folds in a new plan: channel metadata is replaced, snapshots for the
    /// planned files are replaced, snapshots of files not in this plan stay.
    pub fn merge_jobs(&mut self, jobs: &[ArchivalJob]) {
        for job in jobs {
            self.episodes.insert(
                job.filename.clone(),
                EpisodeSnapshot {
                    record: job.episode.clone(),
                    track_number: job.track_number,
                    track_total: job.track_total,
                },
            );
        }
    }

    /// Combines with a previously saved record; fields of `self` win.
    pub fn merge_prior(&mut self, prior: ShowRecord) {
        if self.feed_url.is_none() {
            self.feed_url = prior.feed_url;
        }
        for (name, snap) in prior.episodes {
            self.episodes.entry(name).or_insert(snap);
        }
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_vec_pretty(self).context("serialize show record")?;
        json.push(b'\n');
        atomic::write_bytes(path, &json)?;
        Ok(())
    }
}
