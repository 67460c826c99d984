//! Run-wide abort token.
//!
//! Set by the operator's "abort run" answer or by Ctrl-C in the CLI. Workers
//! check it before starting a job and the retry loop stops backing off once it
//! is set; an in-flight atomic write is always allowed to finish or roll back.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct RunControl {
    abort: AtomicBool,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_abort(&self) {
        if !self.abort.swap(true, Ordering::SeqCst) {
            tracing::warn!("abort requested; no new episodes will be started");
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }
}
