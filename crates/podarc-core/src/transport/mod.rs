//! HTTP transport boundary.
//!
//! The scheduler only sees [`Transport`]; production runs use
//! [`CurlTransport`], tests plug in scripted fakes.

mod curl;

use std::io::Write;
use std::time::Duration;

use crate::config::ArchiveConfig;
use crate::retry::TransportError;

pub use self::curl::CurlTransport;

/// Fetches URLs into caller-provided sinks. Blocking; call from
/// `spawn_blocking` when used from async code.
pub trait Transport: Send + Sync {
    /// Streams the body of `url` into `sink`, returning the byte count.
    ///
    /// A body shorter or longer than the advertised `Content-Length` is a
    /// [`TransportError::PartialTransfer`]; a failing sink is
    /// [`TransportError::Sink`].
    fn fetch_into(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError>;

    /// Whole body in memory (feed documents, artwork).
    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let mut buf = Vec::new();
        self.fetch_into(url, &mut buf)?;
        Ok(buf)
    }
}

/// Timeouts and identity for [`CurlTransport`].
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Abort when the transfer stays under 1 KiB/s for this long.
    pub low_speed_time: Duration,
    pub user_agent: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::from_config(&ArchiveConfig::default())
    }
}

impl TransportOptions {
    pub fn from_config(cfg: &ArchiveConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_time: Duration::from_secs(cfg.low_speed_timeout_secs),
            user_agent: cfg.user_agent.clone(),
        }
    }
}
