//! Retry loop: run a closure until success or the policy says stop.

use rand::Rng;

use crate::interrupt::InterruptFlag;

use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};
use super::sleep::Sleeper;

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// `f` receives the 1-based attempt number. On failure the policy's delay is
/// slept through `sleeper` before the next attempt; nothing is slept before the
/// first attempt or after the last. The final error is returned as-is.
///
/// Once `interrupt` is triggered no further attempt is started; the last
/// error is returned instead.
pub fn run_with_retry<T, F, S, R>(
    policy: &RetryPolicy,
    sleeper: &mut S,
    rng: &mut R,
    interrupt: &InterruptFlag,
    mut f: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Result<T, FetchError>,
    S: Sleeper + ?Sized,
    R: Rng + ?Sized,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt, rng) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(_) if interrupt.is_triggered() => {
                    tracing::info!(attempt, "interrupted, not retrying: {}", e);
                    return Err(e);
                }
                RetryDecision::RetryAfter(d) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = d.as_millis() as u64,
                        "attempt failed, retrying: {}",
                        e
                    );
                    sleeper.sleep(d);
                    if interrupt.is_triggered() {
                        tracing::info!(attempt, "interrupted during backoff: {}", e);
                        return Err(e);
                    }
                    attempt += 1;
                }
            },
        }
    }
}
