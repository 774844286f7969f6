//! Randomized pauses between receipts.

use rand::Rng;
use std::time::Duration;

use crate::config::PacingConfig;
use crate::interrupt::{InterruptFlag, RunInterrupted};
use crate::retry::Sleeper;

/// Longest single sleep before the interrupt flag is looked at again.
const SLICE: Duration = Duration::from_millis(250);

/// Kind of pause taken after a receipt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pause {
    Short(Duration),
    /// The periodic longer break.
    Long(Duration),
}

impl Pause {
    pub fn duration(self) -> Duration {
        match self {
            Pause::Short(d) | Pause::Long(d) => d,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Pacing {
    cfg: PacingConfig,
}

impl Pacing {
    pub(crate) fn new(cfg: PacingConfig) -> Self {
        Self { cfg }
    }

    /// Pause after the `processed`-th receipt (1-based): a long break every
    /// `long_break_every` receipts, a short one otherwise.
    pub(crate) fn pause_after<R: Rng + ?Sized>(&self, processed: usize, rng: &mut R) -> Pause {
        let every = self.cfg.long_break_every;
        if every > 0 && processed % every == 0 {
            Pause::Long(uniform(rng, self.cfg.long_min_secs, self.cfg.long_max_secs))
        } else {
            Pause::Short(uniform(rng, self.cfg.short_min_secs, self.cfg.short_max_secs))
        }
    }

    pub(crate) fn release_grace(&self) -> Duration {
        Duration::from_secs_f64(self.cfg.release_grace_secs.max(0.0))
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> Duration {
    let min = min.max(0.0);
    let secs = if max > min { rng.gen_range(min..max) } else { min };
    Duration::from_secs_f64(secs)
}

/// Sleeps `total` in slices, stopping early once `interrupt` is triggered.
pub(crate) fn sleep_interruptibly<S: Sleeper + ?Sized>(
    sleeper: &mut S,
    total: Duration,
    interrupt: &InterruptFlag,
) -> Result<(), RunInterrupted> {
    let mut left = total;
    while !left.is_zero() {
        interrupt.check()?;
        let step = left.min(SLICE);
        sleeper.sleep(step);
        left -= step;
    }
    interrupt.check()
}
