//! Tag embedding with a two-tier fallback.
//!
//! The full tier writes every tag we know about plus cover art. Files whose
//! existing tag data is damaged often reject that but accept a minimal ID3v2
//! rewrite, so on [`EmbedError::PartialCorruption`] (and only then) the simple
//! tier runs and attempts the cover as a separate step.

mod lofty_embedder;
mod tags;

use std::path::Path;

use crate::policy::ErrorCategory;

pub use lofty_embedder::LoftyEmbedder;
pub use tags::{strip_html, EpisodeTags, COMMENT_MAX_CHARS};

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Existing tag data or framing is damaged; the simple tier may still work.
    #[error("tag data damaged: {0}")]
    PartialCorruption(String),
    /// Not an audio format the embedder can tag.
    #[error("unsupported format: {0}")]
    Unsupported(String),
    #[error("embedding failed: {0}")]
    Failed(String),
    #[error("i/o while embedding: {0}")]
    Io(#[from] std::io::Error),
}

impl EmbedError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::MetadataEmbed
    }
}

/// Which tier ended up tagging the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedOutcome {
    Full,
    Simple { artwork: bool },
}

/// Writes tags into an audio file in place. Blocking.
pub trait MetadataEmbedder: Send + Sync {
    fn embed_full(&self, path: &Path, tags: &EpisodeTags) -> Result<(), EmbedError>;

    /// Core tags only, then a best-effort cover. Returns whether the cover
    /// made it in.
    fn embed_simple(&self, path: &Path, tags: &EpisodeTags) -> Result<bool, EmbedError>;
}

/// Full tier, falling back to the simple tier on partial corruption.
pub fn embed_with_fallback(
    embedder: &dyn MetadataEmbedder,
    path: &Path,
    tags: &EpisodeTags,
) -> Result<EmbedOutcome, EmbedError> {
    match embedder.embed_full(path, tags) {
        Ok(()) => Ok(EmbedOutcome::Full),
        Err(EmbedError::PartialCorruption(reason)) => {
            tracing::debug!(path = %path.display(), %reason, "full embed failed, trying simple tier");
            let artwork = embedder.embed_simple(path, tags).map_err(|e| {
                EmbedError::Failed(format!("full tier: {}; simple tier: {}", reason, e))
            })?;
            Ok(EmbedOutcome::Simple { artwork })
        }
        Err(e) => Err(e),
    }
}
