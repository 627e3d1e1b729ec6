//! # Source contract.
//!
//! A [`Source`] observes one fact (or a small group of related facts) about the
//! machine and describes it as a lazy, potentially infinite sequence of
//! [`Update`]s.
//!
//! ## Contract
//! - [`Source::updates`] starts a **fresh** sequence from the initial state every
//!   time it is called; the supervisor calls it again after every failure.
//! - The first item is the priming update: the full current state of every slot
//!   listed by [`Source::slots`].
//! - Afterwards an item is produced only on a relevant change (push where the
//!   platform supports it, fixed-interval polling otherwise).
//! - An `Err` item ends the attempt; the supervisor logs it and restarts after
//!   the cooldown. A source never yields partial or garbage updates instead.
//! - Sources share no mutable state with each other.

use std::sync::Arc;

use futures::stream::BoxStream;

use crate::error::SourceError;
use crate::state::Update;

/// Boxed sequence of updates produced by one source attempt.
pub type UpdateStream = BoxStream<'static, Result<Update, SourceError>>;

/// Shared handle to a source.
pub type SourceRef = Arc<dyn Source>;

/// # Observer of one monitored fact.
///
/// # Example
/// ```
/// use futures::stream::{self, StreamExt};
/// use statusvisor::{Source, Update, UpdateStream};
///
/// struct Hostname;
///
/// impl Source for Hostname {
///     fn name(&self) -> &str { "hostname" }
///
///     fn slots(&self) -> &[String] {
///         static SLOTS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
///         SLOTS.get_or_init(|| vec!["host".to_string()])
///     }
///
///     fn updates(&self) -> UpdateStream {
///         let prime = Update::new().set("host", "amber");
///         stream::once(async move { Ok(prime) })
///             .chain(stream::pending())
///             .boxed()
///     }
/// }
/// ```
pub trait Source: Send + Sync + 'static {
    /// Stable, human-readable source name.
    fn name(&self) -> &str;

    /// Slots this source owns. Keys outside this set are stripped from its updates.
    fn slots(&self) -> &[String];

    /// Starts a new sequence from the initial (priming) state.
    fn updates(&self) -> UpdateStream;
}
