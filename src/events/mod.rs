//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the aggregator, the
//! per-source supervisors, the runner, the merger and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Aggregator`, `Supervisor`, `runner::run_once`, `Merger`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Aggregator::subscriber_listener()` (fans out to `SubscriberSet`).
//!
//! Updates themselves never travel on the bus; they use the merger's channel.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
