//! `backup`: feed → plan → scheduler → manifest and import feed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use super::ArchiveLayout;
use crate::atomic;
use crate::config::ArchiveConfig;
use crate::embed::MetadataEmbedder;
use crate::feed::{self, ChannelMetadata, EpisodeRecord, ImportEpisode};
use crate::manifest::{ManifestStore, ShowRecord};
use crate::planner::{self, DownloadEstimate};
use crate::policy::{ErrorPolicy, Prompter};
use crate::retry::run_with_retry;
use crate::scheduler::{
    self, JobReport, RunControl, RunOutcome, RunStats, SchedulerContext, SchedulerOptions,
};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub feed_url: String,
    /// Show directory; defaults to `./<sanitized channel title>`.
    pub output_dir: Option<PathBuf>,
    pub limit: Option<usize>,
    pub skip_existing: bool,
    pub write_import_feed: bool,
    /// Prefix for links in the import feed (relative links otherwise).
    pub base_url: Option<String>,
    /// Overrides `concurrency` from the config.
    pub concurrency: Option<usize>,
}

impl BackupRequest {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            output_dir: None,
            limit: None,
            skip_existing: true,
            write_import_feed: true,
            base_url: None,
            concurrency: None,
        }
    }
}

/// Collaborators injected by the caller.
pub struct BackupDeps {
    pub transport: Arc<dyn Transport>,
    pub embedder: Arc<dyn MetadataEmbedder>,
    pub prompter: Arc<dyn Prompter>,
    pub control: Arc<RunControl>,
    pub progress: Option<mpsc::UnboundedSender<JobReport>>,
}

#[derive(Debug)]
pub struct BackupReport {
    pub layout: ArchiveLayout,
    pub channel: ChannelMetadata,
    pub episodes_in_feed: usize,
    pub planned: usize,
    pub estimate: DownloadEstimate,
    /// `None` when the operator declined the download.
    pub run: Option<RunOutcome>,
    pub import_feed_written: bool,
}

/// Runs one complete backup of `req.feed_url`.
///
/// A feed that cannot be fetched or parsed fails the whole call before any
/// file is written. Everything after that is per-episode and reported through
/// the returned stats.
pub async fn backup(
    req: &BackupRequest,
    cfg: &ArchiveConfig,
    deps: BackupDeps,
) -> Result<BackupReport> {
    let feed_bytes = fetch_with_retry(&deps, cfg, &req.feed_url)
        .await
        .with_context(|| format!("fetch feed {}", req.feed_url))?;
    let (channel, records) = feed::parse_feed(&feed_bytes).context("parse feed")?;
    tracing::info!(title = %channel.title, episodes = records.len(), "feed parsed");

    let root = match &req.output_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?.join(planner::slugify(&channel.title)),
    };
    let layout = ArchiveLayout::new(root);
    layout.create_dirs()?;
    atomic::write_bytes(&layout.original_feed_path(), &feed_bytes)?;

    let channel_artwork = save_channel_artwork(&deps, &layout, &channel).await;

    let manifest = ManifestStore::load(layout.manifest_path())?;
    let jobs = planner::plan(&records, req.limit);
    let estimate = planner::estimate(&jobs, &layout.episodes_dir(), req.skip_existing);
    tracing::info!(
        planned = jobs.len(),
        to_download = estimate.to_download,
        existing = estimate.existing,
        bytes = estimate.total_bytes,
        "download estimate"
    );

    let mut report = BackupReport {
        layout: layout.clone(),
        channel: channel.clone(),
        episodes_in_feed: records.len(),
        planned: jobs.len(),
        estimate: estimate.clone(),
        run: None,
        import_feed_written: false,
    };

    if estimate.to_download > 0 {
        let prompter = Arc::clone(&deps.prompter);
        let est = estimate.clone();
        let confirmed = tokio::task::spawn_blocking(move || prompter.confirm_download(&est))
            .await
            .context("confirmation prompt")?;
        if !confirmed {
            tracing::info!("download declined by operator");
            return Ok(report);
        }
    }

    let mut show = ShowRecord::new(Some(req.feed_url.clone()), channel.clone());
    show.merge_jobs(&jobs);
    if let Some(prior) = ShowRecord::load(&layout.show_path())? {
        show.merge_prior(prior);
    }
    show.persist(&layout.show_path())?;

    let mut options = SchedulerOptions::from_config(cfg);
    options.skip_existing = req.skip_existing;
    if let Some(n) = req.concurrency {
        options.concurrency = n.max(1);
    }
    let ctx = SchedulerContext {
        episodes_dir: layout.episodes_dir(),
        transport: deps.transport,
        embedder: deps.embedder,
        prompter: deps.prompter,
        policy: Arc::new(ErrorPolicy::new()),
        control: deps.control,
        stats: Arc::new(RunStats::new()),
        channel: channel.clone(),
        channel_artwork,
        manifest,
        options,
        progress: deps.progress,
    };
    let outcome = scheduler::run_jobs(jobs, ctx).await?;

    if req.write_import_feed {
        match write_import_feed(&layout, &show, &outcome.manifest, req.base_url.as_deref()) {
            Ok(()) => report.import_feed_written = true,
            Err(e) => tracing::error!(error = %format!("{:#}", e), "import feed not written"),
        }
    }
    report.run = Some(outcome);
    Ok(report)
}

async fn fetch_with_retry(deps: &BackupDeps, cfg: &ArchiveConfig, url: &str) -> Result<Vec<u8>> {
    let transport = Arc::clone(&deps.transport);
    let control = Arc::clone(&deps.control);
    let policy = cfg.retry_policy();
    let url = url.to_string();
    let bytes = tokio::task::spawn_blocking(move || {
        let mut attempts = 0;
        run_with_retry(&policy, &control, &mut attempts, || transport.fetch(&url))
    })
    .await
    .context("feed fetch task")??;
    Ok(bytes)
}

/// Downloads and stores channel artwork. Falls back to a cover saved by an
/// earlier run; artwork problems never fail the backup.
async fn save_channel_artwork(
    deps: &BackupDeps,
    layout: &ArchiveLayout,
    channel: &ChannelMetadata,
) -> Option<Arc<Vec<u8>>> {
    let from_disk = || {
        layout
            .existing_cover()
            .and_then(|p| std::fs::read(p).ok())
            .map(Arc::new)
    };
    let Some(url) = channel.image_url.clone() else {
        return from_disk();
    };
    let transport = Arc::clone(&deps.transport);
    let fetched = tokio::task::spawn_blocking(move || transport.fetch(&url)).await;
    let bytes = match fetched {
        Ok(Ok(b)) if !b.is_empty() => b,
        Ok(Ok(_)) => return from_disk(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "channel artwork unavailable");
            return from_disk();
        }
        Err(e) => {
            tracing::warn!(error = %e, "artwork task failed");
            return from_disk();
        }
    };
    let dest = layout.cover_path_for(bytes.starts_with(b"\x89PNG"));
    if let Err(e) = atomic::write_bytes(&dest, &bytes) {
        tracing::warn!(error = %e, "could not save channel artwork");
    }
    Some(Arc::new(bytes))
}

/// Import feed over every manifest entry, newest first.
fn write_import_feed(
    layout: &ArchiveLayout,
    show: &ShowRecord,
    manifest: &ManifestStore,
    base_url: Option<&str>,
) -> Result<()> {
    let mut rows: Vec<(&str, EpisodeRecord, u64)> = manifest
        .entries()
        .map(|e| {
            let record = match show.episodes.get(&e.filename) {
                Some(snap) => snap.record.clone(),
                None => {
                    let mut r = EpisodeRecord::new(e.filename.clone());
                    r.published = e.published;
                    r
                }
            };
            (e.filename.as_str(), record, e.content_length)
        })
        .collect();
    rows.sort_by(|a, b| {
        b.1.published
            .cmp(&a.1.published)
            .then_with(|| b.0.cmp(a.0))
    });
    let episodes: Vec<ImportEpisode<'_>> = rows
        .iter()
        .map(|(filename, record, length)| ImportEpisode {
            filename: *filename,
            record,
            length: *length,
        })
        .collect();

    let cover = layout
        .existing_cover()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()));
    let xml = feed::build_import_feed(&show.channel, cover.as_deref(), &episodes, base_url)?;
    atomic::write_bytes(&layout.import_feed_path(), &xml)?;
    tracing::info!(episodes = episodes.len(), "import feed written");
    Ok(())
}
