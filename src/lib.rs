//! # statusvisor
//!
//! **Statusvisor** is a status-line aggregation engine.
//!
//! It runs several independent observers ("sources") concurrently, merges
//! their partial updates into one snapshot and renders a single text line,
//! only when something visible changed. A misbehaving source is restarted
//! after a cooldown without disturbing the others.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  SourceSpec  │   │  SourceSpec  │   │  SourceSpec  │
//!     │   (media)    │   │   (volume)   │   │    (load)    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Aggregator (runtime orchestrator)                                │
//! │  - validates slot ownership against the Layout                    │
//! │  - Bus (broadcast lifecycle events)                               │
//! │  - SubscriberSet (fans out to LogWriter and user subscribers)     │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Supervisor  │   │  Supervisor  │   │  Supervisor  │
//!     │(restart loop)│   │(restart loop)│   │(restart loop)│
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ Envelope         │ Envelope         │ Envelope
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │              unbounded mpsc channel (FIFO, never drops)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │         Merger         │
//!                       │ snapshot.apply(update) │
//!                       │ changed? ─► render     │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                        Layout::render ──► Sink
//! ```
//!
//! ### Lifecycle of one source
//! ```text
//! loop {
//!   ├─► publish SourceStarting{ source, attempt }
//!   ├─► run_once(source)
//!   │       ├─ first update completes every owned slot (missing ones become absent)
//!   │       ├─ foreign keys are stripped (UpdateRejected)
//!   │       ├─ clean end      ─► SourceExhausted, restart immediately
//!   │       └─ failure        ─► SourceFailed, CooldownScheduled, sleep (cancellable)
//!   └─ exit: runtime token cancelled or merger gone
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                         |
//! |-------------------|-----------------------------------------------------------------|--------------------------------------------|
//! | **Sources**       | Lazy, restartable sequences of partial updates.                 | [`Source`], [`SourceFn`], [`SourceSpec`]   |
//! | **State**         | Partial updates and the merged snapshot.                        | [`Update`], [`Snapshot`]                   |
//! | **Rendering**     | Ordered slots with icons, omission of absent values.            | [`Layout`], [`Slot`], [`Sink`]             |
//! | **Supervision**   | Restart with cooldown, graceful shutdown.                       | [`Aggregator`], [`Supervisor`], [`Merger`] |
//! | **Policies**      | Cooldown evolution and jitter.                                  | [`BackoffPolicy`], [`JitterPolicy`]        |
//! | **Subscriber API**| Hook into lifecycle events.                                     | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed errors for startup, sources and sinks.                    | [`RuntimeError`], [`SourceError`], [`SinkError`] |
//! | **Configuration** | Centralize runtime settings.                                    | [`Config`]                                 |
//!
//! ## Optional features
//! - `builtin` (default): clock, load, command-backed sources and presets.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use futures::{StreamExt, stream};
//! use statusvisor::{Aggregator, Config, Layout, Slot, SourceError, SourceFn, SourceRef, SourceSpec, StdoutSink, Update};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let layout = Layout::new(vec![Slot::new("cpu", "⚙"), Slot::new("date", "🕐")]);
//!     let agg = Aggregator::builder(cfg.clone(), layout, Arc::new(StdoutSink)).build();
//!
//!     let cpu: SourceRef = SourceFn::arc("cpu", ["cpu"], || {
//!         stream::iter([
//!             Ok::<_, SourceError>(Update::new().set("cpu", "10%")),
//!             Ok(Update::new().set("cpu", "10%")),
//!             Ok(Update::new().set("cpu", "20%")),
//!         ])
//!         .chain(stream::pending())
//!     });
//!
//!     let snapshot = agg
//!         .run_until(
//!             vec![SourceSpec::with_defaults(cpu, &cfg)],
//!             tokio::time::sleep(Duration::from_millis(50)),
//!         )
//!         .await?;
//!     assert_eq!(snapshot.get("cpu"), Some("20%"));
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod policies;
mod render;
mod sink;
mod sources;
mod state;
mod subscribers;

pub mod exec;

#[cfg(feature = "builtin")]
pub mod builtin;

// ---- Public re-exports ----

pub use crate::core::{Aggregator, AggregatorBuilder, Config, Merger, Supervisor};
pub use error::{RuntimeError, SinkError, SourceError};
pub use events::{Bus, Event, EventKind};
pub use exec::CommandLine;
pub use policies::{BackoffPolicy, JitterPolicy};
pub use render::{Layout, Slot};
pub use sink::{CommandSink, Sink, StdoutSink};
pub use sources::{Source, SourceFn, SourceRef, SourceSpec, UpdateStream};
pub use state::{Envelope, Snapshot, Update};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
