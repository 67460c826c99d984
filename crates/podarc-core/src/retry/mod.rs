//! Retry and backoff policy.
//!
//! This module encapsulates error classification (timeouts, throttling,
//! connection failures, short bodies) and exponential backoff decisions so the
//! scheduler retries transient failures before bothering the operator.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{is_transient_http_status, Classify};
pub use error::TransportError;
pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
