//! Retrying download of one receipt into the download directory.

use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http::HttpClient;
use crate::interrupt::InterruptFlag;
use crate::retry::{run_with_retry, FetchError, RetryPolicy, Sleeper};
use crate::storage;

/// Definitive result of fetching one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was written to `path`.
    Success { path: PathBuf },
    /// Every attempt failed; `reason` is the last error.
    Failure { reason: String },
}

/// Extra headers sent with every receipt request.
fn no_cache_headers() -> Vec<(String, String)> {
    vec![
        ("Cache-Control".to_string(), "no-cache".to_string()),
        ("Pragma".to_string(), "no-cache".to_string()),
    ]
}

/// Fetches receipts through `client` with bounded, jittered retries.
#[derive(Debug, Clone)]
pub struct RetryingFetcher<C> {
    client: C,
    policy: RetryPolicy,
    timeout: Duration,
    interrupt: InterruptFlag,
}

impl<C: HttpClient> RetryingFetcher<C> {
    pub fn new(client: C, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            client,
            policy,
            timeout,
            interrupt: InterruptFlag::new(),
        }
    }

    /// Stops retrying once `interrupt` is triggered.
    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Downloads `url` and stores it as a collision-free variant of `filename`
    /// in `dir`.
    ///
    /// Non-2xx statuses, transport errors and local write errors all consume an
    /// attempt. Exactly one file exists afterwards on `Success`, none on
    /// `Failure`. Never returns an error. After an interrupt the attempt in
    /// flight finishes but no new one starts.
    pub fn fetch<S, R>(
        &self,
        url: &str,
        dir: &Path,
        filename: &str,
        sleeper: &mut S,
        rng: &mut R,
    ) -> FetchOutcome
    where
        S: Sleeper + ?Sized,
        R: Rng + ?Sized,
    {
        let headers = no_cache_headers();
        let result = run_with_retry(&self.policy, sleeper, rng, &self.interrupt, |attempt| {
            tracing::debug!(url, attempt, "requesting receipt");
            let response = self.client.get(url, &headers, self.timeout)?;
            if !response.is_success() {
                return Err(FetchError::Http(response.status));
            }
            Ok(storage::persist_unique(dir, filename, &response.body)?)
        });

        match result {
            Ok(path) => {
                tracing::info!(url, path = %path.display(), "receipt saved");
                FetchOutcome::Success { path }
            }
            Err(e) => {
                tracing::warn!(url, "receipt failed after {} attempt(s): {}", self.policy.attempts(), e);
                FetchOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        }
    }
}
