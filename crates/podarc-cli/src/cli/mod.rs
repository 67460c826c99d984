//! CLI for the podarc podcast archiver.

mod commands;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use podarc_core::config;
use std::path::{Path, PathBuf};

use commands::{run_backup, run_checksum, run_completions, run_man, run_verify, BackupArgs};

/// Top-level CLI for podarc.
#[derive(Debug, Parser)]
#[command(name = "podarc", version)]
#[command(about = "podarc: archive podcast feeds into tagged, verifiable local backups", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Back up every episode of a podcast feed.
    Backup {
        /// RSS feed URL.
        feed_url: String,

        /// Show directory (default: ./<podcast title>).
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Only the first N episodes in feed order (newest first for most feeds).
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Download again even if the episode file already exists.
        #[arg(long)]
        no_skip: bool,

        /// Do not write import_feed.xml.
        #[arg(long)]
        no_import_feed: bool,

        /// Prefix for links in import_feed.xml (e.g. where the archive is hosted).
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Never prompt; apply the configured resolution to every error category.
        #[arg(long)]
        non_interactive: bool,

        /// Skip the download confirmation.
        #[arg(short, long)]
        yes: bool,

        /// Download up to N episodes at once (default from config).
        #[arg(short, long, value_name = "N")]
        parallel: Option<usize>,
    },

    /// Check an archive against its manifest.
    Verify {
        /// Show directory containing manifest.json.
        dir: PathBuf,

        /// Re-embed missing tags and remove stale temp files (no downloads).
        #[arg(long)]
        repair: bool,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: String,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page to stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Backup {
                feed_url,
                output,
                limit,
                no_skip,
                no_import_feed,
                base_url,
                non_interactive,
                yes,
                parallel,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let args = BackupArgs {
                    feed_url,
                    output,
                    limit,
                    skip_existing: !no_skip,
                    import_feed: !no_import_feed,
                    base_url,
                    non_interactive,
                    yes,
                    parallel,
                };
                run_backup(&cfg, args).await?;
            }
            CliCommand::Verify { dir, repair } => {
                let cfg = config::load_or_init()?;
                run_verify(&cfg, &dir, repair).await?;
            }
            CliCommand::Checksum { path } => run_checksum(Path::new(&path)).await?,
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
