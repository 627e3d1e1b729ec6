//! Status state: partial updates, the merged snapshot, and channel envelopes.
//!
//! - [`Update`] one partial-state delta produced by a source
//! - [`Snapshot`] the authoritative current value of every slot (merger-owned)
//! - [`Envelope`] an update tagged with the name of the source that produced it
//!
//! A slot value is `Option<String>`: `Some` sets the slot, `None` is the explicit
//! absent marker that clears it. A key missing from an update means "no news".

mod snapshot;
mod update;

use std::sync::Arc;

pub use snapshot::Snapshot;
pub use update::Update;

/// An update in flight on the merger channel.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// Name of the producing source.
    pub source: Arc<str>,
    /// The update itself.
    pub update: Update,
}
