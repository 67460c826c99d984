//! Terminal prompter: asks the operator once per error category.

use podarc_core::planner::{format_size, DownloadEstimate};
use podarc_core::policy::{DecisionContext, Prompter, Resolution};
use std::io::{self, BufRead, Write};
use std::sync::{Mutex, PoisonError};

/// Interactive [`Prompter`] over stdin/stderr.
///
/// Prompts from concurrent workers are serialized so two menus never interleave.
pub struct TerminalPrompter {
    assume_yes: bool,
    lock: Mutex<()>,
}

impl TerminalPrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            lock: Mutex::new(()),
        }
    }
}

fn read_answer() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_lowercase()),
    }
}

/// Maps a menu answer to a resolution; `None` means ask again.
pub(crate) fn parse_resolution(answer: &str) -> Option<Resolution> {
    match answer {
        "1" | "r" | "retry" => Some(Resolution::Retry),
        "2" | "s" | "skip" => Some(Resolution::SkipAllOfCategory),
        "3" | "a" | "abort" => Some(Resolution::AbortRun),
        _ => None,
    }
}

/// Yes/no for the download confirmation; empty input means yes.
pub(crate) fn parse_confirmation(answer: &str) -> Option<bool> {
    match answer {
        "" | "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl Prompter for TerminalPrompter {
    fn resolve(&self, ctx: &DecisionContext) -> Resolution {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut err = io::stderr();
        let _ = writeln!(err);
        let _ = writeln!(err, "Error: {}", ctx);
        let _ = writeln!(
            err,
            "How should every '{}' failure be handled for the rest of this run?",
            ctx.category
        );
        let _ = writeln!(err, "  [1] retry");
        let _ = writeln!(err, "  [2] skip all of this kind");
        let _ = writeln!(err, "  [3] abort the run");
        loop {
            let _ = write!(err, "Choice [1-3]: ");
            let _ = err.flush();
            let Some(answer) = read_answer() else {
                tracing::warn!(category = %ctx.category, "stdin closed while prompting; aborting run");
                return Resolution::AbortRun;
            };
            if let Some(r) = parse_resolution(&answer) {
                return r;
            }
        }
    }

    fn confirm_download(&self, estimate: &DownloadEstimate) -> bool {
        let mut err = io::stderr();
        let _ = writeln!(
            err,
            "{} episode(s) to download ({} already present), about {}",
            estimate.to_download,
            estimate.existing,
            format_size(estimate.total_bytes)
        );
        if let Some(free) = estimate.free_bytes {
            let _ = writeln!(err, "Free space: {}", format_size(free));
        }
        if estimate.exceeds_free_space() {
            let _ = writeln!(err, "WARNING: not enough free space for the whole download");
        }
        if self.assume_yes {
            return true;
        }
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            let _ = write!(err, "Continue? [Y/n] ");
            let _ = err.flush();
            let Some(answer) = read_answer() else {
                return false;
            };
            if let Some(yes) = parse_confirmation(&answer) {
                return yes;
            }
        }
    }
}
