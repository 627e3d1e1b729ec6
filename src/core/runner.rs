//! # Run a single attempt of a source sequence.
//!
//! Drives one fresh [`UpdateStream`] until it ends, fails, or the supervisor is
//! cancelled, forwarding every admitted update to the merger channel.
//!
//! ## Flow
//! ```text
//! source.updates()
//!   ├─► first item within priming_timeout?  ── no ──► Err(PrimingTimeout)
//!   ├─► Ok(update) ─► admit() ─► channel.send(Envelope)
//!   │        admit(): strip foreign keys (publish UpdateRejected)
//!   │                 priming update: complete owned slots with absent
//!   ├─► Err(e)                 ─► Err(e)
//!   ├─► end, primed            ─► Ok(Exhausted)
//!   ├─► end, not primed        ─► Err(NoPriming)
//!   └─► cancelled / channel gone ─► Ok(Cancelled / ChannelClosed)
//! ```
//!
//! ## Rules
//! - A panic while building or polling the stream ends the attempt with
//!   `SourceError::Panicked`; the supervisor restarts it like any failure.
//! - The stream is dropped when the attempt ends; process-backed sources kill
//!   their children on drop.
//! - Per-source order is preserved: updates are sent in the order yielded.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use tokio::{select, sync::mpsc, time};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{SourceError, panic_message},
    events::{Bus, Event, EventKind},
    sources::{Source, UpdateStream},
    state::{Envelope, Update},
};

/// How an attempt ended without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptEnd {
    /// The sequence ended cleanly after priming.
    Exhausted,
    /// The runtime token was cancelled.
    Cancelled,
    /// The merger is gone; nothing left to feed.
    ChannelClosed,
}

/// Outcome of one attempt.
#[derive(Debug)]
pub(crate) struct AttemptReport {
    /// Whether the priming update was delivered.
    pub primed: bool,
    pub result: Result<AttemptEnd, SourceError>,
}

/// Executes a single attempt of `source`.
pub(crate) async fn run_once(
    source: &dyn Source,
    name: &Arc<str>,
    token: &CancellationToken,
    priming_timeout: Option<Duration>,
    tx: &mpsc::UnboundedSender<Envelope>,
    bus: &Bus,
) -> AttemptReport {
    let mut stream = match std::panic::catch_unwind(AssertUnwindSafe(|| source.updates())) {
        Ok(stream) => stream,
        Err(payload) => {
            return AttemptReport {
                primed: false,
                result: Err(SourceError::Panicked {
                    reason: panic_message(&*payload),
                }),
            };
        }
    };
    let mut primed = false;

    loop {
        let limit = if primed { None } else { priming_timeout };
        let item = select! {
            biased;
            _ = token.cancelled() => {
                return AttemptReport { primed, result: Ok(AttemptEnd::Cancelled) };
            }
            item = next_within(&mut stream, limit) => item,
        };

        let update = match item {
            Ok(Some(Ok(update))) => update,
            Ok(Some(Err(e))) => return AttemptReport { primed, result: Err(e) },
            Ok(None) if primed => {
                return AttemptReport { primed, result: Ok(AttemptEnd::Exhausted) };
            }
            Ok(None) => {
                return AttemptReport { primed, result: Err(SourceError::NoPriming) };
            }
            Err(timeout) => {
                return AttemptReport {
                    primed,
                    result: Err(SourceError::PrimingTimeout { timeout }),
                };
            }
        };

        let update = admit(source, name, update, !primed, bus);
        primed = true;
        if update.is_empty() {
            continue;
        }

        let envelope = Envelope {
            source: Arc::clone(name),
            update,
        };
        if tx.send(envelope).is_err() {
            return AttemptReport { primed, result: Ok(AttemptEnd::ChannelClosed) };
        }
    }
}

/// Next stream item, bounded by `limit` when set. `Err` carries the elapsed limit.
async fn next_within(
    stream: &mut UpdateStream,
    limit: Option<Duration>,
) -> Result<Option<Result<Update, SourceError>>, Duration> {
    match limit {
        Some(d) => time::timeout(d, next_item(stream)).await.map_err(|_| d),
        None => Ok(next_item(stream).await),
    }
}

/// Next stream item; a panic inside `poll_next` becomes an error item.
async fn next_item(stream: &mut UpdateStream) -> Option<Result<Update, SourceError>> {
    match AssertUnwindSafe(stream.next()).catch_unwind().await {
        Ok(item) => item,
        Err(payload) => Some(Err(SourceError::Panicked {
            reason: panic_message(&*payload),
        })),
    }
}

/// Enforces slot ownership and priming completeness at the source boundary.
fn admit(source: &dyn Source, name: &Arc<str>, mut update: Update, priming: bool, bus: &Bus) -> Update {
    let owned = source.slots();
    let rejected = update.split_off_where(|key| owned.iter().any(|s| s == key));
    if !rejected.is_empty() {
        bus.publish(
            Event::new(EventKind::UpdateRejected)
                .with_source(Arc::clone(name))
                .with_reason(rejected.join(",")),
        );
    }

    if priming {
        for slot in owned {
            if !update.contains(slot) {
                tracing::debug!(source = %name, slot = %slot, "priming update missing slot, clearing it");
                update.insert(slot.clone(), None);
            }
        }
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceFn;
    use futures::stream;

    fn channel() -> (
        mpsc::UnboundedSender<Envelope>,
        mpsc::UnboundedReceiver<Envelope>,
    ) {
        mpsc::unbounded_channel()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Envelope>) -> Vec<Update> {
        let mut out = Vec::new();
        while let Ok(env) = rx.try_recv() {
            out.push(env.update);
        }
        out
    }

    #[tokio::test]
    async fn priming_is_completed_with_absent() {
        let src = SourceFn::new("av", ["media", "vol"], || {
            stream::iter([Ok::<_, SourceError>(Update::new().set("vol", "40%"))])
        });
        let (tx, mut rx) = channel();
        let name: Arc<str> = Arc::from("av");
        let report = run_once(&src, &name, &CancellationToken::new(), None, &tx, &Bus::new(8)).await;

        assert!(report.primed);
        assert!(matches!(report.result, Ok(AttemptEnd::Exhausted)));
        let got = drain(&mut rx);
        assert_eq!(got, vec![Update::new().clear("media").set("vol", "40%")]);
    }

    #[tokio::test]
    async fn foreign_keys_are_stripped_and_reported() {
        let src = SourceFn::new("cpu", ["cpu"], || {
            stream::iter([
                Ok::<_, SourceError>(Update::new().set("cpu", "1%")),
                Ok::<_, SourceError>(Update::new().set("cpu", "2%").set("date", "Mon")),
                Ok::<_, SourceError>(Update::new().set("date", "Tue")),
            ])
        });
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let (tx, mut rx) = channel();
        let name: Arc<str> = Arc::from("cpu");
        run_once(&src, &name, &CancellationToken::new(), None, &tx, &bus).await;

        let got = drain(&mut rx);
        assert_eq!(
            got,
            vec![Update::new().set("cpu", "1%"), Update::new().set("cpu", "2%")]
        );
        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::UpdateRejected);
        assert_eq!(ev.reason.as_deref(), Some("date"));
    }

    #[tokio::test]
    async fn empty_sequence_is_a_failure() {
        let src = SourceFn::new("empty", ["x"], || stream::iter(Vec::<Result<Update, SourceError>>::new()));
        let (tx, _rx) = channel();
        let name: Arc<str> = Arc::from("empty");
        let report = run_once(&src, &name, &CancellationToken::new(), None, &tx, &Bus::new(8)).await;
        assert!(!report.primed);
        assert!(matches!(report.result, Err(SourceError::NoPriming)));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_source_hits_priming_timeout() {
        let src = SourceFn::new("mute", ["x"], || stream::pending::<Result<Update, SourceError>>());
        let (tx, _rx) = channel();
        let name: Arc<str> = Arc::from("mute");
        let report = run_once(
            &src,
            &name,
            &CancellationToken::new(),
            Some(Duration::from_secs(10)),
            &tx,
            &Bus::new(8),
        )
        .await;
        assert!(matches!(
            report.result,
            Err(SourceError::PrimingTimeout { timeout }) if timeout == Duration::from_secs(10)
        ));
    }

    #[tokio::test]
    async fn panic_while_polling_fails_the_attempt() {
        let src = SourceFn::new("buggy", ["x"], || {
            stream::iter([Ok::<_, SourceError>(Update::new().set("x", "1"))]).chain(stream::poll_fn(
                |_| -> std::task::Poll<Option<Result<Update, SourceError>>> { panic!("index out of bounds") },
            ))
        });
        let (tx, mut rx) = channel();
        let name: Arc<str> = Arc::from("buggy");
        let report = run_once(&src, &name, &CancellationToken::new(), None, &tx, &Bus::new(8)).await;

        assert!(report.primed);
        assert!(matches!(
            report.result,
            Err(SourceError::Panicked { ref reason }) if reason == "index out of bounds"
        ));
        assert_eq!(drain(&mut rx), vec![Update::new().set("x", "1")]);
    }

    #[tokio::test]
    async fn panic_while_building_fails_the_attempt() {
        let src = SourceFn::new("broken", ["x"], || -> stream::Empty<Result<Update, SourceError>> {
            panic!("no device")
        });
        let (tx, _rx) = channel();
        let name: Arc<str> = Arc::from("broken");
        let report = run_once(&src, &name, &CancellationToken::new(), None, &tx, &Bus::new(8)).await;
        assert!(!report.primed);
        assert_eq!(report.result.unwrap_err().as_label(), "source_panicked");
    }

    #[tokio::test]
    async fn cancellation_ends_attempt() {
        let src = SourceFn::new("idle", ["x"], || {
            stream::iter([Ok::<_, SourceError>(Update::new().set("x", "1"))]).chain(stream::pending())
        });
        let (tx, _rx) = channel();
        let token = CancellationToken::new();
        token.cancel();
        let name: Arc<str> = Arc::from("idle");
        let report = run_once(&src, &name, &token, None, &tx, &Bus::new(8)).await;
        assert!(matches!(report.result, Ok(AttemptEnd::Cancelled)));
    }

    #[tokio::test]
    async fn closed_channel_stops_attempt() {
        let src = SourceFn::new("x", ["x"], || {
            stream::iter([Ok::<_, SourceError>(Update::new().set("x", "1"))]).chain(stream::pending())
        });
        let (tx, rx) = channel();
        drop(rx);
        let name: Arc<str> = Arc::from("x");
        let report = run_once(&src, &name, &CancellationToken::new(), None, &tx, &Bus::new(8)).await;
        assert!(matches!(report.result, Ok(AttemptEnd::ChannelClosed)));
    }
}
