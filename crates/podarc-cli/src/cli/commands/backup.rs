//! `podarc backup` – archive every episode of a feed.

use anyhow::Result;
use podarc_core::archive::{self, BackupDeps, BackupRequest};
use podarc_core::config::ArchiveConfig;
use podarc_core::embed::LoftyEmbedder;
use podarc_core::planner::format_size;
use podarc_core::policy::{AutoResolve, Prompter};
use podarc_core::scheduler::{JobReport, Outcome, RunControl};
use podarc_core::transport::{CurlTransport, TransportOptions};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::prompt::TerminalPrompter;

/// Parsed `backup` flags.
#[derive(Debug, Clone)]
pub struct BackupArgs {
    pub feed_url: String,
    pub output: Option<PathBuf>,
    pub limit: Option<usize>,
    pub skip_existing: bool,
    pub import_feed: bool,
    pub base_url: Option<String>,
    pub non_interactive: bool,
    pub yes: bool,
    pub parallel: Option<usize>,
}

fn prompter_for(cfg: &ArchiveConfig, args: &BackupArgs) -> Arc<dyn Prompter> {
    if args.non_interactive || !std::io::stdin().is_terminal() {
        tracing::info!(
            resolution = %cfg.non_interactive_resolution,
            "running without prompts"
        );
        Arc::new(AutoResolve(cfg.non_interactive_resolution))
    } else {
        Arc::new(TerminalPrompter::new(args.yes))
    }
}

pub async fn run_backup(cfg: &ArchiveConfig, args: BackupArgs) -> Result<()> {
    let control = Arc::new(RunControl::new());
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted: finishing in-flight episodes, no new downloads.");
                control.request_abort();
            }
        });
    }

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel::<JobReport>();
    let progress_handle = tokio::spawn(async move {
        let mut n = 0usize;
        while let Some(report) = progress_rx.recv().await {
            n += 1;
            match report.outcome {
                Outcome::Downloaded => {
                    println!("[{}] OK: {} ({})", n, report.title, format_size(report.bytes))
                }
                Outcome::Skipped => match &report.detail {
                    Some(why) => println!("[{}] SKIP: {} ({})", n, report.title, why),
                    None => println!("[{}] SKIP: {}", n, report.title),
                },
                Outcome::Failed => println!(
                    "[{}] FAILED: {}: {}",
                    n,
                    report.title,
                    report.detail.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    });

    let request = BackupRequest {
        feed_url: args.feed_url.clone(),
        output_dir: args.output.clone(),
        limit: args.limit,
        skip_existing: args.skip_existing,
        write_import_feed: args.import_feed,
        base_url: args.base_url.clone(),
        concurrency: args.parallel,
    };
    let deps = BackupDeps {
        transport: Arc::new(CurlTransport::new(TransportOptions::from_config(cfg))),
        embedder: Arc::new(LoftyEmbedder),
        prompter: prompter_for(cfg, &args),
        control,
        progress: Some(progress_tx),
    };

    let result = archive::backup(&request, cfg, deps).await;
    let _ = progress_handle.await;
    let report = result?;

    println!();
    println!("Podcast:  {}", report.channel.title);
    println!("Archive:  {}", report.layout.root().display());
    println!(
        "Episodes: {} in feed, {} planned",
        report.episodes_in_feed, report.planned
    );
    let Some(run) = report.run else {
        println!("Download cancelled.");
        return Ok(());
    };
    println!("{}", run.stats);
    if run.aborted {
        println!("Run aborted; re-run the same command to continue.");
    }
    if report.import_feed_written {
        println!(
            "Import feed: {}",
            report.layout.import_feed_path().display()
        );
    }
    if run.stats.failed > 0 {
        anyhow::bail!("{} episode(s) failed", run.stats.failed);
    }
    Ok(())
}
