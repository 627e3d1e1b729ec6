//! # Source specification for supervised execution.
//!
//! Defines [`SourceSpec`]: a source plus the knobs its supervisor applies
//! (restart cooldown, priming timeout).
//!
//! A spec can be created:
//! - **Explicitly** with [`SourceSpec::new`]
//! - **From config** with [`SourceSpec::with_defaults`]

use std::time::Duration;

use crate::{core::Config, policies::BackoffPolicy, sources::SourceRef};

/// Specification for running a source under supervision.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use futures::stream;
/// use statusvisor::{BackoffPolicy, Config, SourceError, SourceFn, SourceRef, SourceSpec, Update};
///
/// let date: SourceRef = SourceFn::arc("date", ["date"], || {
///     stream::iter([Ok::<_, SourceError>(Update::new().set("date", "Mon"))])
/// });
///
/// let spec = SourceSpec::with_defaults(date.clone(), &Config::default());
/// assert_eq!(spec.priming_timeout(), Some(Duration::from_secs(10)));
///
/// let spec = SourceSpec::new(date, BackoffPolicy::fixed(Duration::from_secs(1)), None);
/// assert_eq!(spec.cooldown().first, Duration::from_secs(1));
/// ```
#[derive(Clone)]
pub struct SourceSpec {
    source: SourceRef,
    cooldown: BackoffPolicy,
    priming_timeout: Option<Duration>,
}

impl SourceSpec {
    /// Creates a spec with explicit parameters.
    ///
    /// - `cooldown`: delay between a failure and the next restart
    /// - `priming_timeout`: how long an attempt may take to produce its first update (`None` = unbounded)
    pub fn new(
        source: SourceRef,
        cooldown: BackoffPolicy,
        priming_timeout: Option<Duration>,
    ) -> Self {
        Self {
            source,
            cooldown,
            priming_timeout,
        }
    }

    /// Creates a spec inheriting cooldown and priming timeout from `cfg`.
    pub fn with_defaults(source: SourceRef, cfg: &Config) -> Self {
        Self {
            source,
            cooldown: cfg.cooldown,
            priming_timeout: cfg.priming_timeout(),
        }
    }

    /// Returns the source.
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Convenience: returns the source name.
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Returns the cooldown policy.
    pub fn cooldown(&self) -> BackoffPolicy {
        self.cooldown
    }

    /// Returns the priming timeout, if any.
    pub fn priming_timeout(&self) -> Option<Duration> {
        self.priming_timeout
    }

    /// Returns a new spec with updated cooldown.
    pub fn with_cooldown(mut self, cooldown: BackoffPolicy) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Returns a new spec with updated priming timeout.
    pub fn with_priming_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.priming_timeout = timeout;
        self
    }
}
