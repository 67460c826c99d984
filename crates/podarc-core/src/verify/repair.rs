//! Offline repair of verified archives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use super::{Diagnosis, DiagnosisKind};
use crate::archive::ArchiveLayout;
use crate::atomic;
use crate::checksum;
use crate::embed::{embed_with_fallback, EmbedError, EpisodeTags, MetadataEmbedder};
use crate::manifest::{ManifestStore, ShowRecord};
use crate::planner::DATE_SENTINEL;
use crate::scheduler::RunStats;

#[derive(Debug, Clone)]
pub struct RepairOptions {
    /// Repair is a no-op unless enabled.
    pub enabled: bool,
    pub compute_checksums: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    /// Files whose tags were re-embedded.
    pub retagged: Vec<String>,
    /// Files that could not be retagged, with the reason.
    pub failed: Vec<(String, String)>,
    pub temps_removed: Vec<PathBuf>,
    /// Missing, unreadable and untracked files: reported, never touched.
    pub unresolved: Vec<String>,
}

/// Title for a file with no snapshot: `240101-Some-Title.mp3` → `Some Title`.
fn title_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let rest = match stem.split_once('-') {
        Some((prefix, rest))
            if prefix.len() == DATE_SENTINEL.len() && prefix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => stem,
    };
    rest.replace('-', " ")
}

fn tags_for(
    filename: &str,
    layout: &ArchiveLayout,
    show: Option<&ShowRecord>,
    artwork: Option<Arc<Vec<u8>>>,
) -> EpisodeTags {
    if let Some(show) = show {
        if let Some(snap) = show.episodes.get(filename) {
            return EpisodeTags::for_episode(
                &show.channel,
                &snap.record,
                snap.track_number,
                snap.track_total,
                artwork,
            );
        }
    }
    let album = show.map(|s| s.channel.title.clone()).unwrap_or_else(|| {
        layout
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown Podcast".to_string())
    });
    let artist = show
        .and_then(|s| s.channel.author.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let mut tags = EpisodeTags::minimal(&title_from_filename(filename), &artist, &album);
    tags.artwork = artwork;
    tags
}

/// Applies the fixes that need no network. The manifest is persisted after
/// every retagged file. `stats.repaired` counts retagged files.
pub fn repair(
    diagnoses: &[Diagnosis],
    layout: &ArchiveLayout,
    embedder: &dyn MetadataEmbedder,
    store: &mut ManifestStore,
    show: Option<&ShowRecord>,
    stats: &RunStats,
    opts: &RepairOptions,
) -> Result<RepairReport> {
    let mut report = RepairReport::default();
    if !opts.enabled {
        return Ok(report);
    }

    let artwork = layout
        .existing_cover()
        .and_then(|p| std::fs::read(p).ok())
        .map(Arc::new);

    for d in diagnoses {
        match &d.kind {
            DiagnosisKind::Ok => {}
            DiagnosisKind::MetadataMissing => {
                let path = layout.episode_path(&d.filename);
                let tags = tags_for(&d.filename, layout, show, artwork.clone());
                let embedded = atomic::replace_in_place(&path, |tmp: &Path| {
                    embed_with_fallback(embedder, tmp, &tags).map_err(RepairError::from)
                });
                if let Err(e) = embedded {
                    tracing::warn!(file = %d.filename, error = %e, "re-embed failed");
                    report.failed.push((d.filename.clone(), e.to_string()));
                    continue;
                }
                let digest = match checksum::digest_path(&path, opts.compute_checksums) {
                    Ok(digest) => digest,
                    Err(e) => {
                        tracing::warn!(file = %d.filename, error = %format!("{:#}", e), "digest after retag failed");
                        report.failed.push((d.filename.clone(), format!("{:#}", e)));
                        continue;
                    }
                };
                if let Some(entry) = store.get_mut(&d.filename) {
                    entry.metadata_embedded = true;
                    entry.content_length = digest.len;
                    entry.checksum = digest.sha256;
                }
                // The file on disk changed; record it before touching the next one.
                if let Err(e) = store.persist() {
                    tracing::error!(file = %d.filename, error = %format!("{:#}", e), "manifest write after retag failed");
                    report.failed.push((d.filename.clone(), format!("{:#}", e)));
                    continue;
                }
                stats.record_repaired();
                tracing::info!(file = %d.filename, "metadata re-embedded");
                report.retagged.push(d.filename.clone());
            }
            DiagnosisKind::StaleTemp { path } => match std::fs::remove_file(path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "removed stale temp file");
                    report.temps_removed.push(path.clone());
                }
                Err(e) => report
                    .failed
                    .push((d.filename.clone(), format!("remove temp: {}", e))),
            },
            DiagnosisKind::MissingFile
            | DiagnosisKind::UnreadableFile { .. }
            | DiagnosisKind::Orphan => report.unresolved.push(d.filename.clone()),
        }
    }

    Ok(report)
}

/// Error type for the replace-in-place editor: tagging or the file swap.
#[derive(Debug, thiserror::Error)]
enum RepairError {
    #[error(transparent)]
    Embed(#[from] EmbedError),
    #[error(transparent)]
    Write(#[from] atomic::WriteError),
}
