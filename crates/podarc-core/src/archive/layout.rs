//! Paths inside one show's archive directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SHOW_FILE: &str = "show.json";
pub const ORIGINAL_FEED_FILE: &str = "original_feed.xml";
pub const IMPORT_FEED_FILE: &str = "import_feed.xml";
pub const EPISODES_DIR: &str = "episodes";
const COVER_JPG: &str = "cover.jpg";
const COVER_PNG: &str = "cover.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn show_path(&self) -> PathBuf {
        self.root.join(SHOW_FILE)
    }

    pub fn original_feed_path(&self) -> PathBuf {
        self.root.join(ORIGINAL_FEED_FILE)
    }

    pub fn import_feed_path(&self) -> PathBuf {
        self.root.join(IMPORT_FEED_FILE)
    }

    pub fn episodes_dir(&self) -> PathBuf {
        self.root.join(EPISODES_DIR)
    }

    pub fn episode_path(&self, filename: &str) -> PathBuf {
        self.episodes_dir().join(filename)
    }

    /// Where channel artwork of the given kind is stored.
    pub fn cover_path_for(&self, png: bool) -> PathBuf {
        self.root.join(if png { COVER_PNG } else { COVER_JPG })
    }

    /// Existing cover file, JPEG preferred.
    pub fn existing_cover(&self) -> Option<PathBuf> {
        [COVER_JPG, COVER_PNG]
            .iter()
            .map(|name| self.root.join(name))
            .find(|p| p.is_file())
    }

    /// Creates the show directory and `episodes/`.
    pub fn create_dirs(&self) -> Result<()> {
        let episodes = self.episodes_dir();
        std::fs::create_dir_all(&episodes)
            .with_context(|| format!("create {}", episodes.display()))
    }
}
