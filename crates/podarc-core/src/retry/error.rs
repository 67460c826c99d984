//! Transport error type for retry classification.

use std::fmt;

/// Error returned by one fetch attempt (transfer failure, HTTP error, or sink failure).
/// Kept transport-agnostic so the scheduler can classify it before converting to anyhow.
#[derive(Debug)]
pub enum TransportError {
    /// Connect or transfer timed out (including low-speed aborts).
    Timeout(String),
    /// Network-level failure (refused, DNS, reset, empty reply).
    Connection(String),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Transfer completed but the body length disagrees with `Content-Length`
    /// (e.g. server closed early). Enables retry instead of silent corruption.
    PartialTransfer { expected: u64, received: u64 },
    /// Writing the body to its destination failed (disk full, permission denied).
    Sink(std::io::Error),
    /// Anything else the transport reported (bad URL, TLS setup, ...).
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout(msg) => write!(f, "timed out: {}", msg),
            TransportError::Connection(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Http(code) => write!(f, "HTTP {}", code),
            TransportError::PartialTransfer { expected, received } => {
                write!(f, "partial transfer: expected {} bytes, got {}", expected, received)
            }
            TransportError::Sink(e) => write!(f, "storage: {}", e),
            TransportError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Sink(e) => Some(e),
            _ => None,
        }
    }
}
