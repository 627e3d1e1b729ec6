//! # Aggregator: wires supervisors, the merger, subscribers and shutdown.
//!
//! The [`Aggregator`] owns the event bus, the [`SubscriberSet`], the layout and
//! the sink. [`Aggregator::run`] validates the sources, spawns one
//! [`Supervisor`] per source plus one [`Merger`], and runs until a termination
//! signal arrives.
//!
//! ## High-level architecture
//! ```text
//! Inputs to run():
//!   Vec<SourceSpec> ──► validate(layout)  (UnknownSlot / SlotConflict)
//!
//! Spawn:
//!   SourceSpec[0]   SourceSpec[1]  ...  SourceSpec[N-1]
//!       │               │                   │
//!       └──► Supervisor::new(spec, tx.clone(), bus)     (one per spec)
//!                └──► child CancellationToken, set.spawn(sup.run(child))
//!
//!   Supervisors ── Envelope ──► unbounded mpsc ──► Merger ──► Layout::render ──► Sink
//!   everything  ── Event ─────► Bus ──► subscriber_listener ──► SubscriberSet (LogWriter, ...)
//!
//! With no sources, run() idles until the shutdown future completes.
//!
//! Shutdown path:
//!   shutdown future completes
//!             └─► Bus.publish(ShutdownRequested)
//!             └─► runtime_token.cancel()   → propagates to child tokens
//!             └─► wait_all_with_grace(cfg.grace):
//!                    ├─ Ok (all joined)    → Bus.publish(AllStoppedWithin)
//!                    └─ Timeout exceeded   → Bus.publish(GraceExceeded), abort the rest
//!             └─► every sender dropped → Merger drains the backlog and returns the Snapshot
//!             └─► subscriber_listener forwards queued events and unsubscribes
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures::{StreamExt, stream};
//! use statusvisor::{Aggregator, Config, Layout, Slot, SourceError, SourceFn, SourceSpec, StdoutSink, Update};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let layout = Layout::new(vec![Slot::new("greeting", "👋")]);
//!     let agg = Aggregator::builder(cfg.clone(), layout, Arc::new(StdoutSink)).build();
//!
//!     let hello = SourceFn::arc("hello", ["greeting"], || {
//!         stream::iter([Ok::<_, SourceError>(Update::new().set("greeting", "hi"))])
//!             .chain(stream::pending())
//!     });
//!
//!     agg.run(vec![SourceSpec::with_defaults(hello, &cfg)]).await?;
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::{
    sync::{
        broadcast::error::{RecvError, TryRecvError},
        mpsc,
    },
    task::{JoinHandle, JoinSet},
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{Config, builder::AggregatorBuilder, merger::Merger, shutdown, supervisor::Supervisor},
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    render::Layout,
    sink::Sink,
    sources::SourceSpec,
    state::Snapshot,
    subscribers::SubscriberSet,
};

/// Coordinates supervisors, the merger, event delivery and graceful shutdown.
pub struct Aggregator {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    layout: Arc<Layout>,
    sink: Arc<dyn Sink>,
}

impl Aggregator {
    /// Starts building an aggregator.
    pub fn builder(cfg: Config, layout: Layout, sink: Arc<dyn Sink>) -> AggregatorBuilder {
        AggregatorBuilder::new(cfg, layout, sink)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        layout: Arc<Layout>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            layout,
            sink,
        }
    }

    /// Event bus, for publishing custom events or attaching raw receivers.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs until SIGINT/SIGTERM/SIGQUIT (Ctrl-C on non-unix).
    ///
    /// If signal handlers cannot be installed, runs until the process is killed.
    pub async fn run(&self, sources: Vec<SourceSpec>) -> Result<Snapshot, RuntimeError> {
        self.run_until(sources, async {
            if let Err(e) = shutdown::wait_for_shutdown_signal().await {
                tracing::error!(error = %e, "cannot listen for shutdown signals");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs until `shutdown` completes, then stops every supervisor and returns
    /// the snapshot after the merger drained its backlog.
    pub async fn run_until<F>(&self, sources: Vec<SourceSpec>, shutdown: F) -> Result<Snapshot, RuntimeError>
    where
        F: Future<Output = ()>,
    {
        validate(&self.layout, &sources)?;
        let listener_stop = CancellationToken::new();
        let listener = self.subscriber_listener(listener_stop.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let merger = Merger::new(
            Arc::clone(&self.layout),
            Arc::clone(&self.sink),
            self.bus.clone(),
            self.cfg.sink_retry(),
        );
        let merger = tokio::spawn(merger.run(rx));

        let token = CancellationToken::new();
        let mut set = JoinSet::new();
        let mut alive = HashSet::new();
        let has_sources = !sources.is_empty();
        for spec in sources {
            let sup = Supervisor::new(spec, tx.clone(), self.bus.clone());
            alive.insert(Arc::clone(sup.name()));
            set.spawn(sup.run(token.child_token()));
        }
        drop(tx);

        let requested = tokio::select! {
            _ = shutdown => true,
            _ = join_all(&mut set, &mut alive), if has_sources => false,
        };
        let outcome = if requested {
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
            token.cancel();
            self.wait_all_with_grace(&mut set, &mut alive).await
        } else {
            Ok(())
        };

        let snapshot = merger.await.map_err(|e| RuntimeError::MergerLost {
            reason: e.to_string(),
        });

        listener_stop.cancel();
        if let Err(e) = listener.await {
            tracing::error!(error = %e, "event listener ended abnormally");
        }
        let snapshot = snapshot?;
        outcome.map(|()| snapshot)
    }

    /// Subscribes to the bus and forwards events to the subscriber set until
    /// `stop` fires, then forwards what is already queued and unsubscribes.
    fn subscriber_listener(&self, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(TryRecvError::Lagged(n)) => {
                                    tracing::warn!(skipped = n, "event listener lagged");
                                }
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
        })
    }

    /// Waits for all supervisors within the configured grace period.
    ///
    /// On timeout the remaining supervisors are aborted (dropping their channel
    /// senders) and [`RuntimeError::GraceExceeded`] lists them.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<Arc<str>>,
        alive: &mut HashSet<Arc<str>>,
    ) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        match time::timeout(grace, join_all(set, alive)).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let mut stuck: Vec<String> = alive.iter().map(|n| n.to_string()).collect();
                stuck.sort();
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")));
                set.abort_all();
                while set.join_next().await.is_some() {}
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

/// Joins supervisors as they finish, keeping `alive` current.
async fn join_all(set: &mut JoinSet<Arc<str>>, alive: &mut HashSet<Arc<str>>) {
    while let Some(res) = set.join_next().await {
        match res {
            Ok(name) => {
                alive.remove(&name);
            }
            Err(e) => tracing::error!(error = %e, "supervisor task ended abnormally"),
        }
    }
}

/// Checks that every declared slot exists in the layout and has a single owner.
fn validate(layout: &Layout, sources: &[SourceSpec]) -> Result<(), RuntimeError> {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for spec in sources {
        for slot in spec.source().slots() {
            if !layout.contains(slot) {
                return Err(RuntimeError::UnknownSlot {
                    source_name: spec.name().to_string(),
                    slot: slot.clone(),
                });
            }
            if let Some(first) = owners.insert(slot.as_str(), spec.name()) {
                return Err(RuntimeError::SlotConflict {
                    slot: slot.clone(),
                    first: first.to_string(),
                    second: spec.name().to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{SinkError, SourceError},
        render::Slot,
        sources::{SourceFn, SourceRef},
        state::Update,
    };
    use async_trait::async_trait;
    use futures::{StreamExt, stream};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl Sink for Recorder {
        async fn render(&self, text: &str) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn quiet() -> Config {
        Config {
            log_events: false,
            ..Config::default()
        }
    }

    fn spec(name: &'static str, slots: &'static [&'static str]) -> SourceSpec {
        let src = SourceFn::arc(name, slots.iter().copied(), || {
            stream::iter(Vec::<Result<Update, SourceError>>::new())
        });
        SourceSpec::with_defaults(src, &Config::default())
    }

    fn layout() -> Layout {
        Layout::new(vec![Slot::new("a", ""), Slot::new("b", "")])
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let err = validate(&layout(), &[spec("s", &["a", "z"])]).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownSlot { ref slot, .. } if slot == "z"));
    }

    #[test]
    fn shared_slot_is_rejected() {
        let err = validate(&layout(), &[spec("s1", &["a"]), spec("s2", &["b", "a"])]).unwrap_err();
        match err {
            RuntimeError::SlotConflict { slot, first, second } => {
                assert_eq!((slot.as_str(), first.as_str(), second.as_str()), ("a", "s1", "s2"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn disjoint_sources_pass() {
        validate(&layout(), &[spec("s1", &["a"]), spec("s2", &["b"])]).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_value_is_rendered_once() {
        let sink = Arc::new(Recorder::default());
        let layout = Layout::new(vec![Slot::new("cpu", "⚙")]);
        let agg = Aggregator::builder(quiet(), layout, sink.clone()).build();

        let cpu: SourceRef = SourceFn::arc("cpu", ["cpu"], || {
            stream::iter([
                Ok::<_, SourceError>(Update::new().set("cpu", "10%")),
                Ok(Update::new().set("cpu", "10%")),
                Ok(Update::new().set("cpu", "20%")),
            ])
            .chain(stream::pending())
        });

        let snap = agg
            .run_until(
                vec![SourceSpec::with_defaults(cpu, &quiet())],
                time::sleep(Duration::from_secs(1)),
            )
            .await
            .unwrap();

        assert_eq!(*sink.0.lock().unwrap(), [" ⚙ 10% ", " ⚙ 20% "]);
        assert_eq!(snap.get("cpu"), Some("20%"));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_source_recovers_while_others_keep_rendering() {
        let sink = Arc::new(Recorder::default());
        let layout = Layout::new(vec![Slot::new("a", "A"), Slot::new("b", "B")]);
        let agg = Aggregator::builder(quiet(), layout, sink.clone()).build();
        let mut events = agg.bus().subscribe();

        let ticker: SourceRef = SourceFn::arc("ticker", ["a"], || {
            stream::unfold(0u32, |n| async move {
                if n > 0 {
                    time::sleep(Duration::from_secs(1)).await;
                }
                Some((Ok::<_, SourceError>(Update::new().set("a", format!("c{n}"))), n + 1))
            })
        });

        let starts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&starts);
        let flaky: SourceRef = SourceFn::arc("flaky", ["b"], move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            stream::iter([
                Ok(Update::new().set("b", format!("prime-{n}"))),
                Ok(Update::new().set("b", format!("next-{n}"))),
                Err(SourceError::fail("exit status 1")),
            ])
        });

        let cfg = quiet();
        let snap = agg
            .run_until(
                vec![SourceSpec::with_defaults(ticker, &cfg), SourceSpec::with_defaults(flaky, &cfg)],
                time::sleep(Duration::from_millis(4500)),
            )
            .await
            .unwrap();

        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(snap.get("b"), Some("next-1"));

        let lines = sink.0.lock().unwrap().clone();
        assert!(lines.iter().any(|l| l.contains("B prime-1")));
        for n in 0..=4 {
            assert!(
                lines.iter().any(|l| l.contains(&format!("A c{n} "))),
                "tick c{n} never rendered: {lines:?}"
            );
        }

        let mut cooldowns = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::CooldownScheduled {
                assert_eq!(ev.source.as_deref(), Some("flaky"));
                assert_eq!(ev.delay_ms, Some(3000));
                cooldowns += 1;
            }
        }
        assert_eq!(cooldowns, 2);
    }

    #[tokio::test]
    async fn invalid_sources_never_start() {
        let agg = Aggregator::builder(quiet(), layout(), Arc::new(Recorder::default())).build();
        let err = agg
            .run_until(vec![spec("s", &["nope"])], std::future::ready(()))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "runtime_unknown_slot");
    }

    #[tokio::test]
    async fn shutdown_publishes_lifecycle_events() {
        let agg = Aggregator::builder(quiet(), layout(), Arc::new(Recorder::default())).build();
        let mut events = agg.bus().subscribe();
        let idle: SourceRef = SourceFn::arc("idle", ["a"], || {
            stream::iter([Ok::<_, SourceError>(Update::new().set("a", "1"))]).chain(stream::pending())
        });

        let snap = agg
            .run_until(
                vec![SourceSpec::with_defaults(idle, &quiet())],
                time::sleep(Duration::from_millis(20)),
            )
            .await
            .unwrap();
        assert_eq!(snap.get("a"), Some("1"));

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        let requested = kinds.iter().position(|k| *k == EventKind::ShutdownRequested).unwrap();
        let stopped = kinds.iter().position(|k| *k == EventKind::AllStoppedWithin).unwrap();
        assert!(requested < stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn each_run_releases_its_event_listener() {
        let agg = Aggregator::builder(quiet(), layout(), Arc::new(Recorder::default())).build();
        for _ in 0..2 {
            let idle: SourceRef = SourceFn::arc("idle", ["a"], || {
                stream::iter([Ok::<_, SourceError>(Update::new().set("a", "1"))]).chain(stream::pending())
            });
            agg.run_until(
                vec![SourceSpec::with_defaults(idle, &quiet())],
                time::sleep(Duration::from_millis(20)),
            )
            .await
            .unwrap();
            assert_eq!(agg.bus().receiver_count(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_sources_waits_for_shutdown() {
        let sink = Arc::new(Recorder::default());
        let agg = Aggregator::builder(quiet(), layout(), sink.clone()).build();
        let started = time::Instant::now();

        let snap = agg
            .run_until(Vec::new(), time::sleep(Duration::from_secs(2)))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(snap.is_empty());
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
