//! Manual interruption: a shared flag the Ctrl-C handler sets and the
//! pipeline polls between receipts and during pacing sleeps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error-like marker for a run stopped by the user.
#[derive(Debug)]
pub struct RunInterrupted;

impl std::fmt::Display for RunInterrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run interrupted by user")
    }
}

impl std::error::Error for RunInterrupted {}

/// Cloneable interrupt token. All clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request interruption. Safe to call from a signal-handler thread.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(RunInterrupted)` once triggered, so callers can use `?`.
    pub fn check(&self) -> Result<(), RunInterrupted> {
        if self.is_triggered() {
            Err(RunInterrupted)
        } else {
            Ok(())
        }
    }
}
