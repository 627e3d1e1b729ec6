//! # Cooldown policy for restarting failed sources.
//!
//! [`BackoffPolicy`] controls how long a supervisor sleeps after its source fails.
//! It is parameterized by:
//! - [`BackoffPolicy::first`] the cooldown after the first failure;
//! - [`BackoffPolicy::factor`] the multiplicative growth per consecutive failure;
//! - [`BackoffPolicy::max`] the cap.
//!
//! The cooldown for consecutive failure `n` (0-based) is `first × factor^n`, clamped
//! to `max`, then jittered. The base is derived purely from `n`, so jitter output
//! never feeds back into later delays.
//!
//! The default is a fixed cooldown: a source that keeps crashing is retried every
//! few seconds forever, never in a tight loop.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use statusvisor::{BackoffPolicy, JitterPolicy};
//!
//! let fixed = BackoffPolicy::fixed(Duration::from_secs(3));
//! assert_eq!(fixed.next(0), Duration::from_secs(3));
//! assert_eq!(fixed.next(7), Duration::from_secs(3));
//!
//! let growing = BackoffPolicy {
//!     first: Duration::from_secs(1),
//!     max: Duration::from_secs(30),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//! assert_eq!(growing.next(2), Duration::from_secs(4));
//! assert_eq!(growing.next(10), Duration::from_secs(30));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Restart cooldown policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Cooldown after the first failure.
    pub first: Duration,
    /// Maximum cooldown.
    pub max: Duration,
    /// Multiplicative growth factor (`1.0` = fixed cooldown).
    pub factor: f64,
    /// Jitter policy.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a fixed 3s cooldown capped at 60s, without jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(3),
            max: Duration::from_secs(60),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant cooldown of `d` after every failure.
    pub fn fixed(d: Duration) -> Self {
        Self {
            first: d,
            max: d,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the cooldown for the given consecutive failure (0-indexed).
    ///
    /// Non-finite or negative intermediate values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, failures: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = failures.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}
