//! # LogWriter: lifecycle events as `tracing` records
//!
//! Installed by default (see `Config::log_events`). Restarts and sink trouble
//! are `warn`, lifecycle milestones are `info`, per-render chatter is `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  statusvisor: source starting source="volume" attempt=1
//! WARN  statusvisor: source failed source="volume" attempt=1 reason="pactl exited with code 1"
//! WARN  statusvisor: cooldown scheduled source="volume" delay_ms=3000 attempt=1
//! DEBUG statusvisor: rendered line=" 🔊 40% "
//! INFO  statusvisor: shutdown requested
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that logs events through `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::SourceStarting => {
                tracing::info!(target: "statusvisor", source, attempt = e.attempt, "source starting");
            }
            EventKind::SourceExhausted => {
                tracing::debug!(target: "statusvisor", source, attempt = e.attempt, "source sequence ended, restarting");
            }
            EventKind::SourceFailed => {
                tracing::warn!(target: "statusvisor", source, attempt = e.attempt, reason, "source failed");
            }
            EventKind::CooldownScheduled => {
                tracing::warn!(target: "statusvisor", source, attempt = e.attempt, delay_ms = e.delay_ms, "cooldown scheduled");
            }
            EventKind::UpdateRejected => {
                tracing::warn!(target: "statusvisor", source, keys = reason, "update touched slots it does not own");
            }
            EventKind::Rendered => {
                tracing::debug!(target: "statusvisor", line = reason, "rendered");
            }
            EventKind::SinkFailed => {
                tracing::warn!(target: "statusvisor", sink = source, reason, "sink failed, render pending");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "statusvisor", "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "statusvisor", "all sources stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::error!(target: "statusvisor", stuck = reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "statusvisor", subscriber = source, reason, "subscriber dropped an event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "statusvisor", subscriber = source, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
