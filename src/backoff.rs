//! Wait-time policies for retry loops.

use std::time::Duration;

use rand::Rng;

/// Computes how long to wait before a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `initial * 2^attempt` plus a uniformly random jitter in `[0, max_jitter)`.
    Exponential {
        /// Wait before the first retry, excluding jitter.
        initial: Duration,
        /// Exclusive upper bound of the random jitter.
        max_jitter: Duration,
    },
    /// `initial * 2^attempt`, never more than `max`. No jitter.
    Capped {
        /// Wait before the first retry.
        initial: Duration,
        /// Upper bound on any single wait.
        max: Duration,
    },
}

impl Backoff {
    /// Exponential backoff with jitter.
    pub const fn exponential(initial: Duration, max_jitter: Duration) -> Self {
        Self::Exponential {
            initial,
            max_jitter,
        }
    }

    /// Doubling backoff with a ceiling.
    pub const fn capped(initial: Duration, max: Duration) -> Self {
        Self::Capped { initial, max }
    }

    /// Login backoff: 2s doubling, plus up to a second of jitter.
    pub const fn login() -> Self {
        Self::exponential(Duration::from_secs(2), Duration::from_millis(1000))
    }

    /// Polling cadence while waiting for upstream provisioning.
    pub const fn provisioning() -> Self {
        Self::capped(Duration::from_millis(500), Duration::from_secs(10))
    }

    /// Wait before retry number `attempt` (0 is the first retry).
    ///
    /// `jitter` is added as-is for [`Backoff::Exponential`] and ignored for
    /// [`Backoff::Capped`].
    pub fn delay(&self, attempt: u32, jitter: Duration) -> Duration {
        match *self {
            Self::Exponential { initial, .. } => doubled(initial, attempt).saturating_add(jitter),
            Self::Capped { initial, max } => doubled(initial, attempt).min(max),
        }
    }

    /// Draw a fresh jitter for one attempt.
    pub fn jitter(&self) -> Duration {
        match *self {
            Self::Exponential { max_jitter, .. } => {
                let bound = max_jitter.as_millis() as u64;
                if bound == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::thread_rng().gen_range(0..bound))
                }
            }
            Self::Capped { .. } => Duration::ZERO,
        }
    }

    /// [`Backoff::delay`] with a freshly drawn jitter.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.delay(attempt, self.jitter())
    }
}

fn doubled(initial: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    initial.saturating_mul(factor)
}
