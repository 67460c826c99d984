//! One job, start to finish, on a blocking thread.
//!
//! Download → tag → digest → manifest entry. Each stage goes through the
//! retry loop first and then, if it still fails, through the run's
//! per-category decision.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::{JobError, JobReport, Outcome, RunControl, SchedulerOptions};
use crate::atomic;
use crate::checksum;
use crate::embed::{embed_with_fallback, EmbedOutcome, EpisodeTags, MetadataEmbedder};
use crate::feed::ChannelMetadata;
use crate::manifest::ManifestEntry;
use crate::planner::{is_likely_audio_url, ArchivalJob, UrlCheck};
use crate::policy::{DecisionContext, ErrorPolicy, Prompter, Resolution};
use crate::retry::{run_with_retry, Classify};
use crate::transport::Transport;

/// State shared by every worker of one run.
pub(crate) struct Worker {
    pub episodes_dir: PathBuf,
    pub transport: Arc<dyn Transport>,
    pub embedder: Arc<dyn MetadataEmbedder>,
    pub prompter: Arc<dyn Prompter>,
    pub policy: Arc<ErrorPolicy>,
    pub control: Arc<RunControl>,
    pub channel: ChannelMetadata,
    pub channel_artwork: Option<Arc<Vec<u8>>>,
    pub options: SchedulerOptions,
    /// Filenames the manifest already tracked when the run started.
    pub known: HashSet<String>,
    pub manifest_tx: mpsc::Sender<ManifestEntry>,
}

impl Worker {
    fn report(job: &ArchivalJob, outcome: Outcome, bytes: u64, detail: Option<String>) -> JobReport {
        JobReport {
            filename: job.filename.clone(),
            title: job.episode.title.clone(),
            outcome,
            bytes,
            detail,
        }
    }

    pub(crate) fn execute(&self, job: ArchivalJob) -> JobReport {
        let dest = self.episodes_dir.join(&job.filename);

        if self.options.skip_existing && dest.exists() {
            if !self.known.contains(&job.filename) {
                // Present on disk but never recorded: track it, tags unknown.
                self.send_entry(&job, &dest, false);
            }
            return Self::report(&job, Outcome::Skipped, 0, Some("already exists".into()));
        }

        if let UrlCheck::Rejected(reason) = is_likely_audio_url(&job.media_url) {
            tracing::warn!(file = %job.filename, url = %job.media_url, reason, "skipping episode with invalid media URL");
            return Self::report(&job, Outcome::Skipped, 0, Some(format!("invalid URL: {}", reason)));
        }

        let mut attempts = job.attempts;
        let downloaded = self.run_stage(&job, &mut attempts, || {
            atomic::write(&dest, |f: &mut File| {
                self.transport
                    .fetch_into(&job.media_url, f)
                    .map_err(JobError::from)
            })
        });
        let bytes = match downloaded {
            Ok(n) => n,
            Err(e) => {
                return Self::report(&job, Outcome::Failed, 0, Some(e.to_string()));
            }
        };
        tracing::info!(file = %job.filename, bytes, attempts, "episode downloaded");

        let tags = EpisodeTags::for_episode(
            &self.channel,
            &job.episode,
            job.track_number,
            job.track_total,
            self.artwork_for(&job),
        );
        let embedded = self.run_stage(&job, &mut attempts, || {
            atomic::replace_in_place(&dest, |tmp: &Path| {
                embed_with_fallback(self.embedder.as_ref(), tmp, &tags).map_err(JobError::from)
            })
        });
        match embedded {
            Ok(EmbedOutcome::Full) => {
                tracing::debug!(file = %job.filename, "metadata embedded");
            }
            Ok(EmbedOutcome::Simple { artwork }) => {
                tracing::info!(file = %job.filename, artwork, "metadata embedded with simple tags");
            }
            Err(e) => {
                // Audio stays on disk; verify --repair can retag it later.
                self.send_entry(&job, &dest, false);
                return Self::report(&job, Outcome::Failed, bytes, Some(e.to_string()));
            }
        }

        if self.send_entry(&job, &dest, true) {
            Self::report(&job, Outcome::Downloaded, bytes, None)
        } else {
            Self::report(&job, Outcome::Failed, bytes, Some("could not digest archived file".into()))
        }
    }

    /// Runs one stage with retries, then consults the category decision.
    /// `Retry` buys at most `max_policy_retries` extra rounds for this stage.
    fn run_stage<T>(
        &self,
        job: &ArchivalJob,
        attempts: &mut u32,
        mut op: impl FnMut() -> Result<T, JobError>,
    ) -> Result<T, JobError> {
        let mut rounds = 0u32;
        loop {
            let err = match run_with_retry(&self.options.retry, &self.control, attempts, &mut op) {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };
            if self.control.is_aborted() {
                return Err(err);
            }
            let ctx = DecisionContext {
                category: err.category(),
                filename: job.filename.clone(),
                url: job.media_url.clone(),
                attempts: *attempts,
                message: err.to_string(),
            };
            tracing::warn!(%ctx, "episode stage failed");
            match self.policy.decide(&ctx, |c| self.prompter.resolve(c)) {
                Resolution::Retry if rounds < self.options.max_policy_retries => {
                    rounds += 1;
                    tracing::info!(file = %job.filename, round = rounds, "retrying after operator decision");
                }
                Resolution::Retry => {
                    tracing::warn!(file = %job.filename, "retry rounds exhausted");
                    return Err(err);
                }
                Resolution::SkipAllOfCategory => return Err(err),
                Resolution::AbortRun => {
                    self.control.request_abort();
                    return Err(err);
                }
            }
        }
    }

    /// Episode artwork when it differs from the channel's, else the channel's.
    /// Best effort: a failed fetch falls back silently.
    fn artwork_for(&self, job: &ArchivalJob) -> Option<Arc<Vec<u8>>> {
        let url = job.episode.artwork_url.as_deref();
        match url {
            Some(u) if Some(u) != self.channel.image_url.as_deref() => {
                match self.transport.fetch(u) {
                    Ok(bytes) if !bytes.is_empty() => Some(Arc::new(bytes)),
                    Ok(_) => self.channel_artwork.clone(),
                    Err(e) => {
                        tracing::debug!(file = %job.filename, url = u, error = %e, "episode artwork unavailable");
                        self.channel_artwork.clone()
                    }
                }
            }
            _ => self.channel_artwork.clone(),
        }
    }

    /// Digests `dest` and hands the entry to the manifest task.
    fn send_entry(&self, job: &ArchivalJob, dest: &Path, metadata_embedded: bool) -> bool {
        let digest = match checksum::digest_path(dest, self.options.compute_checksums) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(file = %job.filename, error = %format!("{:#}", e), "digest failed");
                return false;
            }
        };
        let entry = ManifestEntry {
            filename: job.filename.clone(),
            source_url: job.media_url.clone(),
            published: job.episode.published,
            content_length: digest.len,
            checksum: digest.sha256,
            metadata_embedded,
            last_verified: None,
        };
        if self.manifest_tx.blocking_send(entry).is_err() {
            tracing::error!(file = %job.filename, "manifest task gone; entry dropped");
            return false;
        }
        true
    }
}
