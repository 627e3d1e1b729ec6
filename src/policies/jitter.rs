//! # Jitter policy for restart cooldowns.
//!
//! [`JitterPolicy`] adds randomness to cooldowns so sources that fail together
//! (e.g. several sources talking to the same sound server) do not restart in lockstep.

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of cooldowns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Exact cooldown.
    #[default]
    None,

    /// Random cooldown in [0, base].
    Full,

    /// base/2 + random[0, base/2].
    Equal,

    /// random[first, base * 3], capped at max.
    ///
    /// Needs context, see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to the given cooldown.
    ///
    /// `Decorrelated` returns the input unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => self.full_jitter(delay),
            JitterPolicy::Equal => self.equal_jitter(delay),
            JitterPolicy::Decorrelated => delay,
        }
    }

    /// Decorrelated jitter: a value in `[floor, min(current * 3, max)]`.
    ///
    /// Falls back to `apply(current)` for other policies.
    pub fn apply_decorrelated(&self, floor: Duration, current: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(current);
        }

        let floor_ms = floor.as_millis() as u64;
        let upper = (current.as_millis() as u64)
            .saturating_mul(3)
            .min(max.as_millis() as u64)
            .max(floor_ms);

        if floor_ms >= upper {
            return floor;
        }
        Duration::from_millis(rand::rng().random_range(floor_ms..=upper))
    }

    fn full_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::rng();
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.random_range(0..=ms))
    }

    fn equal_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::rng();
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let half = ms / 2;
        let jitter = if half == 0 {
            0
        } else {
            rng.random_range(0..=half)
        };
        Duration::from_millis(half + jitter)
    }
}
