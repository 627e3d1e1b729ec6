//! # Supervisor: restart loop around one source.
//!
//! Runs exactly one [`Source`](crate::Source) forever, forwarding every update
//! to the merger channel, and isolates its failures from everything else.
//!
//! ## Architecture
//! ```text
//! SourceSpec ──► Aggregator ──► Supervisor::run()
//!
//! loop {
//!   ├─► publish SourceStarting{attempt}
//!   ├─► run_once() ──► source.updates() ──► channel
//!   │       │
//!   │       ├─ Exhausted ──► publish SourceExhausted, yield, restart now
//!   │       ├─ Cancelled / ChannelClosed ──► exit
//!   │       └─ Err(e) ──► publish SourceFailed
//!   │                     ├─ delay = cooldown.next(consecutive_failures)
//!   │                     ├─ publish CooldownScheduled
//!   │                     └─ sleep(delay) (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - No retry limit: a permanently broken source just leaves its slots stale.
//! - Consecutive-failure count resets once an attempt delivers its priming update.
//! - Each restart begins with a fresh priming update, so stale data self-heals.

use std::sync::Arc;

use tokio::{select, sync::mpsc, time};
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::{AttemptEnd, run_once},
    events::{Bus, Event, EventKind},
    sources::SourceSpec,
    state::Envelope,
};

/// Supervises one source with restarts and cooldown.
pub struct Supervisor {
    spec: SourceSpec,
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Envelope>,
    bus: Bus,
}

impl Supervisor {
    /// Creates a supervisor feeding `tx`.
    pub fn new(spec: SourceSpec, tx: mpsc::UnboundedSender<Envelope>, bus: Bus) -> Self {
        let name: Arc<str> = Arc::from(spec.name());
        Self {
            spec,
            name,
            tx,
            bus,
        }
    }

    /// Source name.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Runs until `runtime_token` is cancelled or the merger channel closes.
    ///
    /// Returns the source name so the caller can tell which supervisors are done.
    ///
    /// ### Cancellation semantics
    /// Checked before each attempt, while awaiting the next update, and during
    /// the cooldown sleep.
    pub async fn run(self, runtime_token: CancellationToken) -> Arc<str> {
        let mut attempt: u32 = 0;
        let mut failures: u32 = 0;

        while !runtime_token.is_cancelled() {
            attempt = attempt.saturating_add(1);
            self.bus.publish(
                Event::new(EventKind::SourceStarting)
                    .with_source(Arc::clone(&self.name))
                    .with_attempt(attempt),
            );

            let report = run_once(
                self.spec.source().as_ref(),
                &self.name,
                &runtime_token,
                self.spec.priming_timeout(),
                &self.tx,
                &self.bus,
            )
            .await;
            if report.primed {
                failures = 0;
            }

            match report.result {
                Ok(AttemptEnd::Exhausted) => {
                    self.bus.publish(
                        Event::new(EventKind::SourceExhausted)
                            .with_source(Arc::clone(&self.name))
                            .with_attempt(attempt),
                    );
                    tokio::task::yield_now().await;
                }
                Ok(AttemptEnd::Cancelled) => break,
                Ok(AttemptEnd::ChannelClosed) => {
                    tracing::debug!(source = %self.name, "merger channel closed, supervisor exiting");
                    break;
                }
                Err(e) => {
                    let reason = e.to_string();
                    self.bus.publish(
                        Event::new(EventKind::SourceFailed)
                            .with_source(Arc::clone(&self.name))
                            .with_attempt(attempt)
                            .with_reason(reason.as_str()),
                    );

                    let delay = self.spec.cooldown().next(failures);
                    failures = failures.saturating_add(1);
                    self.bus.publish(
                        Event::new(EventKind::CooldownScheduled)
                            .with_source(Arc::clone(&self.name))
                            .with_attempt(attempt)
                            .with_delay(delay)
                            .with_reason(reason),
                    );

                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    select! {
                        _ = &mut sleep => {}
                        _ = runtime_token.cancelled() => break,
                    }
                }
            }
        }
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::SourceError,
        policies::BackoffPolicy,
        sources::{SourceFn, SourceRef},
        state::Update,
    };
    use futures::{StreamExt, stream};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn spec(source: SourceRef) -> SourceSpec {
        SourceSpec::new(source, BackoffPolicy::fixed(Duration::from_secs(3)), None)
    }

    #[tokio::test(start_paused = true)]
    async fn failure_restarts_after_cooldown_with_fresh_priming() {
        let starts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&starts);
        let flaky: SourceRef = SourceFn::arc("flaky", ["b"], move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            stream::iter([
                Ok(Update::new().set("b", format!("prime-{n}"))),
                Ok(Update::new().set("b", format!("next-{n}"))),
                Err(SourceError::fail("boom")),
            ])
            .chain(stream::pending())
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let handle = tokio::spawn(Supervisor::new(spec(flaky), tx, Bus::new(64)).run(token.clone()));

        let started = time::Instant::now();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let env = rx.recv().await.unwrap();
            seen.push(env.update.get("b").flatten().unwrap().to_string());
        }
        assert_eq!(seen, ["prime-0", "next-0", "prime-1", "next-1"]);
        assert!(started.elapsed() >= Duration::from_secs(3));

        token.cancel();
        assert_eq!(&*handle.await.unwrap(), "flaky");
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_source_is_restarted_after_cooldown() {
        let starts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&starts);
        let buggy: SourceRef = SourceFn::arc("buggy", ["b"], move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            stream::iter([Ok::<_, SourceError>(Update::new().set("b", format!("p{n}")))]).chain(
                stream::poll_fn(|_| -> std::task::Poll<Option<Result<Update, SourceError>>> {
                    panic!("parser bug")
                }),
            )
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let token = CancellationToken::new();
        let handle = tokio::spawn(Supervisor::new(spec(buggy), tx, bus).run(token.clone()));

        time::sleep(Duration::from_secs(10)).await;
        token.cancel();
        handle.await.unwrap();

        assert!(starts.load(Ordering::SeqCst) >= 3);
        let mut last = None;
        while let Ok(env) = rx.try_recv() {
            last = env.update.get("b").flatten().map(str::to_string);
        }
        assert_eq!(last.as_deref(), Some("p3"));

        let mut failed = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::SourceFailed {
                assert!(ev.reason.as_deref().unwrap_or("").contains("parser bug"));
                failed += 1;
            }
        }
        assert!(failed >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn clean_end_restarts_without_cooldown() {
        let src: SourceRef = SourceFn::arc("once", ["x"], || {
            stream::iter([Ok::<_, SourceError>(Update::new().set("x", "1"))])
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let handle = tokio::spawn(Supervisor::new(spec(src), tx, Bus::new(64)).run(token.clone()));

        let started = time::Instant::now();
        for _ in 0..3 {
            rx.recv().await.unwrap();
        }
        assert!(started.elapsed() < Duration::from_secs(3));

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_cooldown() {
        let src: SourceRef = SourceFn::arc("dead", ["x"], || {
            stream::iter([Err::<Update, _>(SourceError::fail("always"))])
        });
        let (tx, _rx) = mpsc::unbounded_channel();
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let token = CancellationToken::new();
        let handle = tokio::spawn(
            Supervisor::new(spec(src), tx, bus).run(token.clone()),
        );

        loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::CooldownScheduled {
                assert_eq!(ev.delay_ms, Some(3000));
                break;
            }
        }
        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn exits_when_merger_is_gone() {
        let src: SourceRef = SourceFn::arc("x", ["x"], || {
            stream::iter([Ok::<_, SourceError>(Update::new().set("x", "1"))]).chain(stream::pending())
        });
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let name = Supervisor::new(spec(src), tx, Bus::new(8))
            .run(CancellationToken::new())
            .await;
        assert_eq!(&*name, "x");
    }
}
