//! Retry loop: run a closure until success, a terminal error, or the round is spent.

use super::classify::Classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::scheduler::RunControl;

/// Runs `f` until it succeeds or the retry policy says to stop.
/// On transient failure, sleeps for the backoff duration then tries again.
///
/// `attempts` is incremented once per call of `f` so callers can report the
/// total across rounds. Stops early (returning the last error) once `control`
/// reports an abort, so a cancelled run does not sit in backoff sleeps.
pub fn run_with_retry<T, E, F>(
    policy: &RetryPolicy,
    control: &RunControl,
    attempts: &mut u32,
    mut f: F,
) -> Result<T, E>
where
    E: Classify + std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 1u32;
    loop {
        *attempts += 1;
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt, e.is_transient()) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(_) if control.is_aborted() => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    tracing::debug!(
                        attempt,
                        delay_ms = d.as_millis() as u64,
                        category = %e.category(),
                        error = %e,
                        "transient failure, backing off"
                    );
                    std::thread::sleep(d);
                    attempt += 1;
                }
            },
        }
    }
}
