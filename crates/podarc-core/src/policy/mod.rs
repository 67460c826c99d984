//! Per-run, per-category operator decision cache.
//!
//! The first failure of a category asks the operator (or the configured
//! non-interactive default) and the answer governs every later failure of the
//! same category for the rest of the run. A network blip that fails fifty
//! downloads the same way yields one question, not fifty.

mod category;
mod prompter;

pub use category::{ErrorCategory, Resolution};
pub use prompter::{AutoResolve, Prompter};

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// What the operator sees when a category first fails.
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub category: ErrorCategory,
    /// Destination filename of the failing job.
    pub filename: String,
    /// Remote URL of the failing job.
    pub url: String,
    /// Attempts made so far for this job (all rounds).
    pub attempts: u32,
    /// Rendered error message.
    pub message: String,
}

impl fmt::Display for DecisionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) after {} attempt(s): {}",
            self.category, self.filename, self.url, self.attempts, self.message
        )
    }
}

/// Write-once decision cache keyed by [`ErrorCategory`].
///
/// Owned by one scheduler run and shared with workers by reference; a new run
/// starts with a fresh policy. Concurrent first occurrences of the same
/// category serialize on that category's cell so the prompt runs exactly once;
/// other categories are not blocked while an operator is answering.
#[derive(Debug, Default)]
pub struct ErrorPolicy {
    decisions: Mutex<HashMap<ErrorCategory, Arc<OnceLock<Resolution>>>>,
}

impl ErrorPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, category: ErrorCategory) -> Arc<OnceLock<Resolution>> {
        let mut map = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(category).or_default())
    }

    /// Returns the cached resolution for `ctx.category`, invoking `prompt`
    /// only if this is the first occurrence of that category in the run.
    pub fn decide<F>(&self, ctx: &DecisionContext, prompt: F) -> Resolution
    where
        F: FnOnce(&DecisionContext) -> Resolution,
    {
        let cell = self.cell(ctx.category);
        *cell.get_or_init(|| {
            let resolution = prompt(ctx);
            tracing::info!(
                category = %ctx.category,
                resolution = %resolution,
                "operator decision recorded for category"
            );
            resolution
        })
    }

    /// Cached resolution for `category`, if one was made this run.
    pub fn cached(&self, category: ErrorCategory) -> Option<Resolution> {
        let map = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(&category).and_then(|cell| cell.get().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ctx(category: ErrorCategory, filename: &str) -> DecisionContext {
        DecisionContext {
            category,
            filename: filename.to_string(),
            url: format!("https://cdn.example.com/{}", filename),
            attempts: 3,
            message: "operation timed out".to_string(),
        }
    }

    #[test]
    fn prompts_once_per_category() {
        let policy = ErrorPolicy::new();
        let prompts = AtomicUsize::new(0);
        for i in 0..50 {
            let r = policy.decide(&ctx(ErrorCategory::NetworkTimeout, &format!("ep{}.mp3", i)), |_| {
                prompts.fetch_add(1, Ordering::SeqCst);
                Resolution::SkipAllOfCategory
            });
            assert_eq!(r, Resolution::SkipAllOfCategory);
        }
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn categories_are_independent() {
        let policy = ErrorPolicy::new();
        let prompts = AtomicUsize::new(0);
        let answer = |c: ErrorCategory| match c {
            ErrorCategory::DiskWrite => Resolution::AbortRun,
            _ => Resolution::Retry,
        };
        for category in ErrorCategory::ALL {
            for _ in 0..3 {
                let r = policy.decide(&ctx(category, "a.mp3"), |c| {
                    prompts.fetch_add(1, Ordering::SeqCst);
                    answer(c.category)
                });
                assert_eq!(r, answer(category));
            }
        }
        assert_eq!(prompts.load(Ordering::SeqCst), ErrorCategory::ALL.len());
        assert_eq!(policy.cached(ErrorCategory::DiskWrite), Some(Resolution::AbortRun));
    }

    #[test]
    fn no_cached_decision_before_first_failure() {
        let policy = ErrorPolicy::new();
        assert_eq!(policy.cached(ErrorCategory::MetadataEmbed), None);
    }

    #[test]
    fn concurrent_first_occurrence_prompts_exactly_once() {
        let policy = Arc::new(ErrorPolicy::new());
        let prompts = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let policy = Arc::clone(&policy);
                let prompts = Arc::clone(&prompts);
                std::thread::spawn(move || {
                    policy.decide(&ctx(ErrorCategory::NetworkHttp, &format!("{}.mp3", i)), |_| {
                        prompts.fetch_add(1, Ordering::SeqCst);
                        // Slow operator: other workers arrive while we "wait for input".
                        std::thread::sleep(Duration::from_millis(50));
                        Resolution::Retry
                    })
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Resolution::Retry);
        }
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn auto_resolve_answers_fixed_resolution() {
        let auto = AutoResolve(Resolution::AbortRun);
        assert_eq!(auto.resolve(&ctx(ErrorCategory::SizeMismatch, "x.mp3")), Resolution::AbortRun);
    }
}
