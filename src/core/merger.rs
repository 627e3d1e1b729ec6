//! # Merger: single consumer of the update channel.
//!
//! Owns the [`Snapshot`], folds every received [`Envelope`] into it and renders
//! only on an observable change.
//!
//! ## Flow
//! ```text
//! loop {
//!   select {
//!     envelope = rx.recv() ──► changed = snapshot.apply(update)
//!                              changed || pending ─► render()
//!     channel closed       ──► return snapshot
//!     retry timer (pending && sink_retry set) ─► render()
//!   }
//! }
//!
//! render():
//!   line = layout.render(&snapshot)
//!   sink.render(line)
//!     ├─ Ok  ─► pending = false, publish Rendered
//!     └─ Err ─► pending = true,  publish SinkFailed
//! ```
//!
//! ## Rules
//! - The merger is the only writer of the snapshot; no lock is involved.
//! - Updates are applied in channel (FIFO) order.
//! - A no-op update triggers no render, unless a previous render is pending.
//! - A sink failure never ends the loop and never loses snapshot state; a
//!   panicking sink is treated as a failed render.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::{select, sync::mpsc, time};

use crate::{
    error::{SinkError, panic_message},
    events::{Bus, Event, EventKind},
    render::Layout,
    sink::Sink,
    state::{Envelope, Snapshot},
};

/// Folds updates into the snapshot and drives the sink.
pub struct Merger {
    snapshot: Snapshot,
    layout: Arc<Layout>,
    sink: Arc<dyn Sink>,
    bus: Bus,
    sink_retry: Option<Duration>,
    pending: bool,
}

impl Merger {
    /// Creates a merger with an empty snapshot.
    pub fn new(layout: Arc<Layout>, sink: Arc<dyn Sink>, bus: Bus, sink_retry: Option<Duration>) -> Self {
        Self {
            snapshot: Snapshot::new(),
            layout,
            sink,
            bus,
            sink_retry,
            pending: false,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Drains `rx` until every sender is gone, then returns the final snapshot.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Envelope>) -> Snapshot {
        loop {
            let retry = self.sink_retry.filter(|_| self.pending);
            let envelope = select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(envelope) => envelope,
                    None => break,
                },
                _ = sleep_or_never(retry) => {
                    tracing::debug!(sink = self.sink.name(), "retrying pending render");
                    self.render().await;
                    continue;
                }
            };
            self.merge(envelope).await;
        }
        self.snapshot
    }

    /// Applies one envelope; renders when the state changed or a render is pending.
    ///
    /// Returns whether a render was attempted.
    pub async fn merge(&mut self, envelope: Envelope) -> bool {
        let changed = self.snapshot.apply(&envelope.update);
        if !changed && !self.pending {
            tracing::trace!(source = %envelope.source, "no-op update");
            return false;
        }
        self.render().await;
        true
    }

    async fn render(&mut self) {
        let line = self.layout.render(&self.snapshot);
        let outcome = AssertUnwindSafe(self.sink.render(&line))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(SinkError::Panicked {
                    reason: panic_message(&*payload),
                })
            });
        match outcome {
            Ok(()) => {
                self.pending = false;
                self.bus
                    .publish(Event::new(EventKind::Rendered).with_reason(line));
            }
            Err(e) => {
                self.pending = true;
                self.bus.publish(
                    Event::new(EventKind::SinkFailed)
                        .with_source(self.sink.name())
                        .with_reason(e.to_string()),
                );
            }
        }
    }
}

async fn sleep_or_never(delay: Option<Duration>) {
    match delay {
        Some(d) => time::sleep(d).await,
        None => std::future::pending().await,
    }
}
