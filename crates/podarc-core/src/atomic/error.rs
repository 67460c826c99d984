//! Write failure raised by the atomic writer.

use std::io;
use std::path::PathBuf;

use crate::policy::ErrorCategory;

/// A filesystem failure while producing, syncing or renaming an archive file.
///
/// Always classified as `disk-write-error`: insufficient space, permission
/// problems and a missing destination directory all surface here.
#[derive(Debug, thiserror::Error)]
#[error("{op} {}: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    pub op: &'static str,
    #[source]
    pub source: io::Error,
}

impl WriteError {
    pub(crate) fn new(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            op,
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::DiskWrite
    }
}
