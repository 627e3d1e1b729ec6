//! # Event subscribers.
//!
//! Subscribers observe lifecycle events (restarts, cooldowns, renders, sink
//! failures) without ever touching the status state.
//!
//! - [`Subscribe`] extension trait for custom handlers
//! - [`SubscriberSet`] non-blocking fan-out with per-subscriber queues
//! - [`LogWriter`] built-in subscriber that forwards events to `tracing`
//!
//! ## Architecture
//! ```text
//! Supervisor / Merger ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                        │
//!                                                 SubscriberSet::emit
//!                                            ┌───────────┼───────────┐
//!                                            ▼           ▼           ▼
//!                                        LogWriter     Custom       ...
//! ```

mod embedded;
mod subscriber;
mod subscriber_set;

pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
