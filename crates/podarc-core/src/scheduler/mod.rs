//! Download scheduler.
//!
//! Runs planned jobs with at most `concurrency` in flight. Each job executes
//! on tokio's blocking pool (curl, file IO, tag writing and operator prompts
//! all block). Shared state between workers is limited to [`RunStats`], the
//! [`ErrorPolicy`] cache and the abort flag; the manifest is owned by a single
//! writer task fed over a channel.

mod control;
mod error;
mod execute;
mod manifest_task;
mod stats;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::ArchiveConfig;
use crate::embed::MetadataEmbedder;
use crate::feed::ChannelMetadata;
use crate::manifest::ManifestStore;
use crate::planner::ArchivalJob;
use crate::policy::{ErrorPolicy, Prompter};
use crate::retry::RetryPolicy;
use crate::transport::Transport;

pub use control::RunControl;
pub use error::JobError;
pub use stats::{Outcome, RunStats, StatsSnapshot};

use execute::Worker;
use manifest_task::{spawn_manifest_writer, MANIFEST_QUEUE};

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub max_policy_retries: u32,
    pub skip_existing: bool,
    pub compute_checksums: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from_config(&ArchiveConfig::default())
    }
}

impl SchedulerOptions {
    pub fn from_config(cfg: &ArchiveConfig) -> Self {
        Self {
            concurrency: cfg.concurrency.max(1),
            retry: cfg.retry_policy(),
            max_policy_retries: cfg.max_policy_retries,
            skip_existing: true,
            compute_checksums: cfg.compute_checksums,
        }
    }
}

/// Everything one run needs. Consumed by [`run_jobs`].
pub struct SchedulerContext {
    pub episodes_dir: PathBuf,
    pub transport: Arc<dyn Transport>,
    pub embedder: Arc<dyn MetadataEmbedder>,
    pub prompter: Arc<dyn Prompter>,
    pub policy: Arc<ErrorPolicy>,
    pub control: Arc<RunControl>,
    pub stats: Arc<RunStats>,
    pub channel: ChannelMetadata,
    pub channel_artwork: Option<Arc<Vec<u8>>>,
    /// Manifest as loaded before the run; updated as jobs finish.
    pub manifest: ManifestStore,
    pub options: SchedulerOptions,
    /// Receives one report per finished job (CLI progress lines).
    pub progress: Option<mpsc::UnboundedSender<JobReport>>,
}

/// How one job ended, for progress output.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub filename: String,
    pub title: String,
    pub outcome: Outcome,
    pub bytes: u64,
    pub detail: Option<String>,
}

/// Result of [`run_jobs`].
#[derive(Debug)]
pub struct RunOutcome {
    pub stats: StatsSnapshot,
    pub manifest: ManifestStore,
    pub aborted: bool,
}

/// Runs `jobs` to completion (or until abort). Every job ends up counted in
/// exactly one of downloaded/skipped/failed; jobs never started because of an
/// abort count as skipped.
pub async fn run_jobs(jobs: Vec<ArchivalJob>, ctx: SchedulerContext) -> Result<RunOutcome> {
    let concurrency = ctx.options.concurrency.max(1);
    let known: HashSet<String> = ctx.manifest.entries().map(|e| e.filename.clone()).collect();
    let (manifest_tx, manifest_rx) = mpsc::channel(MANIFEST_QUEUE);
    let writer = spawn_manifest_writer(ctx.manifest, manifest_rx);

    let stats = Arc::clone(&ctx.stats);
    let control = Arc::clone(&ctx.control);
    let progress = ctx.progress;
    let worker = Arc::new(Worker {
        episodes_dir: ctx.episodes_dir,
        transport: ctx.transport,
        embedder: ctx.embedder,
        prompter: ctx.prompter,
        policy: ctx.policy,
        control: ctx.control,
        channel: ctx.channel,
        channel_artwork: ctx.channel_artwork,
        options: ctx.options,
        known,
        manifest_tx,
    });

    let total = jobs.len();
    tracing::info!(jobs = total, concurrency, "scheduler starting");
    let mut queue = jobs.into_iter();
    let mut join_set = JoinSet::new();

    loop {
        while join_set.len() < concurrency && !control.is_aborted() {
            let Some(job) = queue.next() else {
                break;
            };
            let w = Arc::clone(&worker);
            join_set.spawn_blocking(move || w.execute(job));
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok(report) => {
                stats.record(report.outcome);
                if report.outcome == Outcome::Downloaded {
                    stats.add_bytes(report.bytes);
                }
                if let Some(tx) = &progress {
                    let _ = tx.send(report);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "episode task panicked or was cancelled");
                stats.record(Outcome::Failed);
            }
        }
    }

    let not_started = queue.count();
    for _ in 0..not_started {
        stats.record(Outcome::Skipped);
    }
    if not_started > 0 {
        tracing::warn!(not_started, "run aborted before all episodes started");
    }

    // Last sender goes away with the worker; the writer then drains and exits.
    drop(worker);
    let manifest = writer.await.context("manifest task join")?;
    manifest.persist().context("final manifest write")?;

    let snapshot = stats.snapshot();
    tracing::info!(
        downloaded = snapshot.downloaded,
        skipped = snapshot.skipped,
        failed = snapshot.failed,
        bytes = snapshot.bytes_downloaded,
        "scheduler finished"
    );
    Ok(RunOutcome {
        stats: snapshot,
        manifest,
        aborted: control.is_aborted(),
    })
}
