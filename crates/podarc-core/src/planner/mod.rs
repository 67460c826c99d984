//! Episode planner: feed records → deterministic list of archival jobs.
//!
//! Planning is pure apart from logging. The same records and limit always
//! yield the same jobs, filenames and track numbers, so a re-run of a backup
//! lands on the same paths and the skip-existing check works.

mod audio_url;
mod estimate;
mod filename;

use std::collections::HashSet;

use crate::feed::EpisodeRecord;

pub use audio_url::{is_likely_audio_url, UrlCheck};
pub use estimate::{estimate, format_size, DownloadEstimate};
pub use filename::{base_filename, date_prefix, extension_for_url, slugify, DATE_SENTINEL};

/// One unit of download work. Owned by exactly one worker.
#[derive(Debug, Clone)]
pub struct ArchivalJob {
    /// Position in feed order (0 = first record in the feed).
    pub sequence: usize,
    /// File name inside `episodes/`, unique within the plan.
    pub filename: String,
    pub media_url: String,
    pub episode: EpisodeRecord,
    /// Oldest-first numbering for the track tag.
    pub track_number: u32,
    pub track_total: u32,
    /// Attempts spent so far, across retry rounds.
    pub attempts: u32,
}

/// Builds the job list. `limit` keeps the first N feed records.
pub fn plan(records: &[EpisodeRecord], limit: Option<usize>) -> Vec<ArchivalJob> {
    let take = limit.unwrap_or(records.len()).min(records.len());
    let candidates: Vec<(usize, &EpisodeRecord, &str, String)> = records[..take]
        .iter()
        .enumerate()
        .filter_map(|(idx, rec)| match rec.media_url.as_deref() {
            Some(url) => Some((idx, rec, url, base_filename(rec, url))),
            None => {
                tracing::info!(title = %rec.title, "no media URL, episode not planned");
                None
            }
        })
        .collect();

    let names = disambiguate(candidates.iter().map(|(_, _, _, name)| name.as_str()));
    let total = candidates.len() as u32;
    candidates
        .into_iter()
        .zip(names)
        .enumerate()
        .map(|(pos, ((sequence, rec, url, _), filename))| ArchivalJob {
            sequence,
            filename,
            media_url: url.to_string(),
            episode: rec.clone(),
            track_number: total - pos as u32,
            track_total: total,
            attempts: 0,
        })
        .collect()
}

fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) => (&name[..i], &name[i..]),
        None => (name, ""),
    }
}

/// Resolves collisions in encounter order: the first candidate keeps its name,
/// later duplicates get `-2`, `-3`, ... before the extension. A generated name
/// is never one that another candidate would naturally take.
fn disambiguate<'a>(candidates: impl Iterator<Item = &'a str> + Clone) -> Vec<String> {
    let natural: HashSet<&str> = candidates.clone().collect();
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for cand in candidates {
        if used.insert(cand.to_string()) {
            out.push(cand.to_string());
            continue;
        }
        let (stem, ext) = split_ext(cand);
        let mut n = 2u32;
        loop {
            let next = format!("{}-{}{}", stem, n, ext);
            if !natural.contains(next.as_str()) && !used.contains(&next) {
                used.insert(next.clone());
                out.push(next);
                break;
            }
            n += 1;
        }
    }
    out
}
