//! Runtime core: orchestration and lifecycle.
//!
//! The public entry point is [`Aggregator`], which validates sources, runs one
//! [`Supervisor`] per source, feeds the [`Merger`] and handles graceful shutdown.
//!
//! Internal modules:
//! - [`runner`]: executes one attempt of a source sequence (priming, slot ownership, cancellation);
//! - [`supervisor`]: restart loop with cooldown around one source;
//! - [`merger`]: folds updates into the snapshot and renders on change;
//! - [`aggregator`]: wires everything and drives shutdown;
//! - [`shutdown`]: cross-platform termination signal handling.

mod aggregator;
mod builder;
mod config;
mod merger;
mod runner;
mod shutdown;
mod supervisor;

pub use aggregator::Aggregator;
pub use builder::AggregatorBuilder;
pub use config::Config;
pub use merger::Merger;
pub use supervisor::Supervisor;
