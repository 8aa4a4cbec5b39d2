// ABOUTME: Linear retry delay between tag queries.
// ABOUTME: Grows by a fixed step per retry and is capped so the loop never busy-spins.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackoffError {
    #[error("initial backoff delay must be greater than zero")]
    ZeroInitial,

    #[error("maximum backoff delay ({max:?}) is below the initial delay ({initial:?})")]
    MaxBelowInitial { initial: Duration, max: Duration },
}

/// Delay before retry `n` is `min(initial + n * step, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    step: Duration,
    max: Duration,
}

impl Backoff {
    pub const DEFAULT_INITIAL: Duration = Duration::from_millis(1000);
    pub const DEFAULT_STEP: Duration = Duration::from_millis(10);
    pub const DEFAULT_MAX: Duration = Duration::from_secs(5);

    pub fn new(initial: Duration, step: Duration, max: Duration) -> Result<Self, BackoffError> {
        if initial.is_zero() {
            return Err(BackoffError::ZeroInitial);
        }
        if max < initial {
            return Err(BackoffError::MaxBelowInitial { initial, max });
        }
        Ok(Self { initial, step, max })
    }

    /// Constant delay, no ramp.
    pub fn fixed(delay: Duration) -> Result<Self, BackoffError> {
        Self::new(delay, Duration::ZERO, delay)
    }

    pub fn delay(&self, retry: u32) -> Duration {
        self.step
            .checked_mul(retry)
            .and_then(|ramp| self.initial.checked_add(ramp))
            .map_or(self.max, |delay| delay.min(self.max))
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Self::DEFAULT_INITIAL,
            step: Self::DEFAULT_STEP,
            max: Self::DEFAULT_MAX,
        }
    }
}
