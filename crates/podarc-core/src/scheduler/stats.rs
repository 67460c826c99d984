//! Run counters shared by all workers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::planner::format_size;

/// Terminal state of one planned job. Each job is recorded exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Downloaded,
    Skipped,
    Failed,
}

#[derive(Debug, Default)]
pub struct RunStats {
    downloaded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    repaired: AtomicU64,
    bytes_downloaded: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Downloaded => &self.downloaded,
            Outcome::Skipped => &self.skipped,
            Outcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes(&self, n: u64) {
        self.bytes_downloaded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_repaired(&self) {
        self.repaired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            downloaded: self.downloaded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            repaired: self.repaired.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RunStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub repaired: u64,
    pub bytes_downloaded: u64,
}

impl StatsSnapshot {
    /// Jobs that reached a terminal state.
    pub fn finished(&self) -> u64 {
        self.downloaded + self.skipped + self.failed
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Downloaded: {}", self.downloaded)?;
        writeln!(f, "  Skipped:    {}", self.skipped)?;
        writeln!(f, "  Failed:     {}", self.failed)?;
        if self.repaired > 0 {
            writeln!(f, "  Repaired:   {}", self.repaired)?;
        }
        write!(f, "  Total size: {}", format_size(self.bytes_downloaded))
    }
}
