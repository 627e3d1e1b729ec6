//! # Closure-backed source (`SourceFn`)
//!
//! [`SourceFn`] wraps a closure `F: Fn() -> S`, producing a fresh stream per
//! (re)start. State lives inside the stream the closure builds, so a restart
//! never sees leftovers of the previous attempt; if shared state is really
//! needed, capture an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use futures::stream;
//! use statusvisor::{SourceFn, SourceRef, SourceError, Update};
//!
//! let cpu: SourceRef = SourceFn::arc("cpu", ["cpu"], || {
//!     stream::iter([Ok::<_, SourceError>(Update::new().set("cpu", "3%"))])
//! });
//!
//! assert_eq!(cpu.name(), "cpu");
//! assert_eq!(cpu.slots(), ["cpu".to_string()]);
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::error::SourceError;
use crate::sources::source::{Source, UpdateStream};
use crate::state::Update;

/// Function-backed source implementation.
pub struct SourceFn<F> {
    name: Cow<'static, str>,
    slots: Vec<String>,
    f: F,
}

impl<F> SourceFn<F> {
    /// Creates a new closure-backed source owning `slots`.
    ///
    /// Prefer [`SourceFn::arc`] when you immediately need a [`SourceRef`](crate::SourceRef).
    pub fn new<I, S>(name: impl Into<Cow<'static, str>>, slots: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            slots: slots.into_iter().map(Into::into).collect(),
            f,
        }
    }

    /// Creates the source and returns it as a shared handle.
    pub fn arc<I, S>(name: impl Into<Cow<'static, str>>, slots: I, f: F) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self::new(name, slots, f))
    }
}

impl<F, S> Source for SourceFn<F>
where
    F: Fn() -> S + Send + Sync + 'static,
    S: Stream<Item = Result<Update, SourceError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn slots(&self) -> &[String] {
        &self.slots
    }

    fn updates(&self) -> UpdateStream {
        (self.f)().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn every_call_builds_a_fresh_sequence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let src = SourceFn::new("n", ["n"], move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            stream::iter([Ok::<_, SourceError>(Update::new().set("n", n.to_string()))])
        });

        let first: Vec<_> = src.updates().collect().await;
        let second: Vec<_> = src.updates().collect().await;
        assert_eq!(first[0].as_ref().unwrap().get("n"), Some(Some("0")));
        assert_eq!(second[0].as_ref().unwrap().get("n"), Some(Some("1")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
