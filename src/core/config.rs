//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the aggregator runtime.
//!
//! Config is used in two ways:
//! 1. **Aggregator creation**: `Aggregator::builder(config, layout, sink)`
//! 2. **SourceSpec defaults**: `SourceSpec::with_defaults(source, &config)`
//!
//! ## Sentinel values
//! - `priming_timeout = 0s` → no priming timeout
//! - `sink_retry = 0s` → a failed render is retried only when the next update arrives

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the aggregator runtime.
///
/// ## Field semantics
/// - `cooldown`: Default restart cooldown after a source failure (per-source overridable)
/// - `priming_timeout`: Default limit for an attempt's first update (`0s` = none)
/// - `sink_retry`: Delay before re-rendering after a sink failure (`0s` = wait for next update)
/// - `grace`: Maximum wait for supervisors to stop on shutdown
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `log_events`: Install the built-in tracing [`LogWriter`](crate::LogWriter)
///
/// All fields are public; prefer the helper accessors over checking `0` sentinels inline.
#[derive(Clone, Debug)]
pub struct Config {
    /// Default restart cooldown for sources.
    pub cooldown: BackoffPolicy,

    /// Default time allowed for the priming update of each attempt.
    pub priming_timeout: Duration,

    /// Delay before retrying a render the sink refused.
    pub sink_retry: Duration,

    /// Maximum time to wait for supervisors on shutdown before aborting them.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Whether the aggregator logs lifecycle events through `tracing`.
    pub log_events: bool,
}

impl Config {
    /// Returns the priming timeout as an `Option` (`None` = unbounded).
    #[inline]
    pub fn priming_timeout(&self) -> Option<Duration> {
        Some(self.priming_timeout).filter(|d| !d.is_zero())
    }

    /// Returns the sink retry delay as an `Option` (`None` = next update only).
    #[inline]
    pub fn sink_retry(&self) -> Option<Duration> {
        Some(self.sink_retry).filter(|d| !d.is_zero())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `cooldown = 3s` fixed
    /// - `priming_timeout = 10s`
    /// - `sink_retry = 2s`
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `log_events = true`
    fn default() -> Self {
        Self {
            cooldown: BackoffPolicy::default(),
            priming_timeout: Duration::from_secs(10),
            sink_retry: Duration::from_secs(2),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            log_events: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels_map_to_none() {
        let cfg = Config {
            priming_timeout: Duration::ZERO,
            sink_retry: Duration::ZERO,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.priming_timeout(), None);
        assert_eq!(cfg.sink_retry(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn defaults_are_bounded() {
        let cfg = Config::default();
        assert_eq!(cfg.priming_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(cfg.sink_retry(), Some(Duration::from_secs(2)));
        assert_eq!(cfg.cooldown.next(0), Duration::from_secs(3));
    }
}
