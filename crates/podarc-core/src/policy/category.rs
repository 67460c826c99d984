//! Error categories and operator resolutions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a job failure, used to batch operator decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// Connect or transfer timed out.
    NetworkTimeout,
    /// Non-2xx response, refused connection, DNS or reset.
    NetworkHttp,
    /// Temp file creation, write, sync or rename failed.
    DiskWrite,
    /// Both embedding tiers failed (or the file type is unsupported).
    MetadataEmbed,
    /// Body length disagrees with `Content-Length`, or a checksum mismatch.
    SizeMismatch,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 5] = [
        ErrorCategory::NetworkTimeout,
        ErrorCategory::NetworkHttp,
        ErrorCategory::DiskWrite,
        ErrorCategory::MetadataEmbed,
        ErrorCategory::SizeMismatch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::NetworkTimeout => "network-timeout",
            ErrorCategory::NetworkHttp => "network-http-error",
            ErrorCategory::DiskWrite => "disk-write-error",
            ErrorCategory::MetadataEmbed => "metadata-embed-error",
            ErrorCategory::SizeMismatch => "checksum-size-mismatch",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the operator wants done with every failure of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Re-attempt the failed stage (bounded by `max_policy_retries`).
    Retry,
    /// Mark the job failed and keep going with the rest.
    SkipAllOfCategory,
    /// Stop scheduling new jobs; in-flight jobs drain.
    AbortRun,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Retry => write!(f, "retry"),
            Resolution::SkipAllOfCategory => write!(f, "skip all of category"),
            Resolution::AbortRun => write!(f, "abort run"),
        }
    }
}
