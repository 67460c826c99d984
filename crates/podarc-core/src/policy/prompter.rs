//! Operator boundary: how resolutions and confirmations are obtained.

use super::{DecisionContext, Resolution};
use crate::planner::DownloadEstimate;

/// Source of operator decisions. The CLI implements this over the terminal;
/// unattended runs use [`AutoResolve`].
///
/// `resolve` may block on operator input. It is only ever called from a
/// worker's blocking thread, at most once per category per run.
pub trait Prompter: Send + Sync {
    fn resolve(&self, ctx: &DecisionContext) -> Resolution;

    /// Asked once before any download starts. Returning false cancels the run.
    fn confirm_download(&self, _estimate: &DownloadEstimate) -> bool {
        true
    }
}

/// Non-interactive prompter: answers every category with a fixed resolution
/// and never asks for confirmation.
#[derive(Debug, Clone, Copy)]
pub struct AutoResolve(pub Resolution);

impl Prompter for AutoResolve {
    fn resolve(&self, ctx: &DecisionContext) -> Resolution {
        tracing::info!(
            category = %ctx.category,
            resolution = %self.0,
            "non-interactive resolution applied"
        );
        self.0
    }
}
