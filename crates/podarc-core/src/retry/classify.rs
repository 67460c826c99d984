//! Classify transport failures into error categories and transient/terminal.

use crate::policy::ErrorCategory;
use crate::retry::error::TransportError;

/// Anything the retry loop and the error policy can reason about.
pub trait Classify {
    /// Category used to look up (or ask for) the operator's decision.
    fn category(&self) -> ErrorCategory;
    /// True if an immediate re-attempt with backoff may succeed.
    fn is_transient(&self) -> bool;
}

/// Whether an HTTP status is worth retrying: throttling (429) and server errors.
pub fn is_transient_http_status(code: u32) -> bool {
    matches!(code, 408 | 429 | 500..=599)
}

impl Classify for TransportError {
    fn category(&self) -> ErrorCategory {
        match self {
            TransportError::Timeout(_) => ErrorCategory::NetworkTimeout,
            TransportError::Connection(_) | TransportError::Http(_) | TransportError::Other(_) => {
                ErrorCategory::NetworkHttp
            }
            TransportError::PartialTransfer { .. } => ErrorCategory::SizeMismatch,
            TransportError::Sink(_) => ErrorCategory::DiskWrite,
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            TransportError::Timeout(_)
            | TransportError::Connection(_)
            | TransportError::PartialTransfer { .. } => true,
            TransportError::Http(code) => is_transient_http_status(*code),
            TransportError::Sink(_) | TransportError::Other(_) => false,
        }
    }
}
