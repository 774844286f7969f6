use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    /// Out of attempts; give up.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Bounded retries with a jittered delay that grows linearly with the attempt.
///
/// The wait after failed attempt `n` is `uniform(min_backoff, max_backoff) * n`,
/// which doubles as human-looking pacing between requests to the same host.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Lower bound of the per-attempt backoff factor.
    pub min_backoff: Duration,
    /// Upper bound of the per-attempt backoff factor.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        let min = cfg.min_backoff_secs.max(0.0);
        let max = cfg.max_backoff_secs.max(min);
        Self {
            max_attempts: cfg.max_attempts,
            min_backoff: Duration::from_secs_f64(min),
            max_backoff: Duration::from_secs_f64(max),
        }
    }

    /// Attempts actually made; zero is treated as one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Decide what to do after failed attempt `attempt` (1-based).
    pub fn decide<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> RetryDecision {
        if attempt >= self.attempts() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(attempt, rng))
    }

    fn backoff<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let (min, max) = (self.min_backoff.as_secs_f64(), self.max_backoff.as_secs_f64());
        let factor = if max > min { rng.gen_range(min..max) } else { min };
        Duration::from_secs_f64(factor * f64::from(attempt))
    }
}
