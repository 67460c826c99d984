//! Feed collaborator: RSS document → channel metadata + episode records, and
//! the reverse direction for the re-import feed.
//!
//! Parsing is all-or-nothing: a malformed document is a [`FeedError`] and the
//! run stops before any job is planned.

mod import;
mod parse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use import::{build_import_feed, ImportEpisode};
pub use parse::{parse_duration, parse_feed};

/// Channel-level metadata used for album/artist tags and the import feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub language: String,
    #[serde(default)]
    pub copyright: Option<String>,
    pub category: String,
    #[serde(default)]
    pub explicit: Option<String>,
}

impl Default for ChannelMetadata {
    fn default() -> Self {
        Self {
            title: "Unknown Podcast".to_string(),
            description: String::new(),
            subtitle: None,
            author: None,
            link: String::new(),
            image_url: None,
            language: "en".to_string(),
            copyright: None,
            category: "Podcast".to_string(),
            explicit: None,
        }
    }
}

/// One normalized feed entry. Immutable once produced by [`parse_feed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub title: String,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    /// Enclosure URL; entries without one are not archived.
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    /// Enclosure length as advertised by the feed (used for size estimates).
    #[serde(default)]
    pub media_length: Option<u64>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
    #[serde(default)]
    pub link: Option<String>,
}

impl EpisodeRecord {
    /// Minimal record, mostly for tests and repair fallbacks.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            published: None,
            media_url: None,
            media_type: None,
            media_length: None,
            artwork_url: None,
            description: None,
            guid: None,
            author: None,
            subtitle: None,
            duration_secs: None,
            link: None,
        }
    }
}

/// The feed document could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("malformed feed: {0}")]
    Malformed(#[from] rss::Error),
    #[error("render import feed: {0}")]
    Render(#[source] rss::Error),
}
