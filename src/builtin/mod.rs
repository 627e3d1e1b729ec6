//! # Built-in sources (feature `builtin`).
//!
//! Ready-made [`Source`](crate::Source)s for a typical desktop bar:
//! - [`clock`] local time via `chrono`, polled
//! - [`load`] CPU and memory percentages via `sysinfo`, polled
//! - [`CommandSource`] process-backed source driven by a [`Trigger`]
//! - [`presets`] example wiring for `playerctl` and `pactl`

mod clock;
mod command;
mod load;
pub mod presets;

use std::time::Duration;

use futures::stream::{self, Stream};

pub use clock::clock;
pub use command::{CommandSource, LineParser, Trigger};
pub use load::load;

/// Yields immediately, then once per `period`.
pub(crate) fn ticks(period: Duration) -> impl Stream<Item = ()> + Send + 'static {
    stream::unfold(false, move |started| async move {
        if started {
            tokio::time::sleep(period).await;
        }
        Some(((), true))
    })
}
