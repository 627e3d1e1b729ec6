//! # Lifecycle events emitted by the aggregator, supervisors and merger.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Source lifecycle**: attempt flow (starting, failed, exhausted, cooldown)
//! - **Merge/render**: rejected keys, successful renders, sink failures
//! - **Shutdown**: signal observed, grace outcome
//! - **Subscriber**: overflow and panic of event subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, source
//! name, reasons, and cooldown delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use statusvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CooldownScheduled)
//!     .with_source("volume")
//!     .with_reason("pactl exited with code 1")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(3));
//!
//! assert_eq!(ev.kind, EventKind::CooldownScheduled);
//! assert_eq!(ev.source.as_deref(), Some("volume"));
//! assert_eq!(ev.delay_ms, Some(3000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `source` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `source` (subscriber name) and `reason` ("full" / "closed").
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (signal or caller-provided future).
    ShutdownRequested,

    /// All supervisors stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some supervisors did not stop in time.
    ///
    /// Sets `reason` (names of stuck sources).
    GraceExceeded,

    // === Source lifecycle events ===
    /// A source sequence is (re)starting.
    ///
    /// Sets `source` and `attempt` (1-based, per supervisor).
    SourceStarting,

    /// A source sequence failed; the supervisor will cool down and restart.
    ///
    /// Sets `source`, `attempt`, `reason`.
    SourceFailed,

    /// A source sequence ended cleanly after priming; restarted immediately.
    ///
    /// Sets `source`, `attempt`.
    SourceExhausted,

    /// Restart scheduled after a failure.
    ///
    /// Sets `source`, `attempt` (the failed one), `delay_ms`, `reason`.
    CooldownScheduled,

    // === Merge/render events ===
    /// Keys outside the source's declared slots were stripped from an update.
    ///
    /// Sets `source` and `reason` (offending keys).
    UpdateRejected,

    /// The merger delivered a new line to the sink.
    ///
    /// Sets `reason` (the rendered line).
    Rendered,

    /// The sink refused a render; it stays pending and will be retried.
    ///
    /// Sets `reason` (sink error).
    SinkFailed,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the source (or subscriber), if applicable.
    pub source: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Cooldown before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, rejected keys, rendered text).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a source name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a cooldown delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::Rendered);
        let b = Event::new(EventKind::Rendered);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates_at_u32() {
        let ev = Event::new(EventKind::CooldownScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
