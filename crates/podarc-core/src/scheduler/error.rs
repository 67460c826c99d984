//! Per-job failure, classified for retry and operator decisions.

use crate::atomic::WriteError;
use crate::embed::EmbedError;
use crate::policy::ErrorCategory;
use crate::retry::{Classify, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("download: {0}")]
    Transport(#[from] TransportError),
    #[error("write: {0}")]
    Write(#[from] WriteError),
    #[error("tagging: {0}")]
    Embed(#[from] EmbedError),
}

impl Classify for JobError {
    fn category(&self) -> ErrorCategory {
        match self {
            JobError::Transport(e) => e.category(),
            JobError::Write(e) => e.category(),
            JobError::Embed(e) => e.category(),
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            JobError::Transport(e) => e.is_transient(),
            JobError::Write(_) | JobError::Embed(_) => false,
        }
    }
}
