//! Retry and backoff policy.
//!
//! Every failure of a receipt download (transport error, non-2xx status,
//! local write error) is retried up to the attempt bound, with a jittered,
//! linearly growing delay between attempts.

mod error;
mod policy;
mod run;
mod sleep;

pub use error::FetchError;
pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
pub use sleep::{RecordingSleeper, Sleeper, ThreadSleeper};
