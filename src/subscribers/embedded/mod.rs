//! # Built-in subscribers
//!
//! - [`LogWriter`]: forwards events to `tracing` with a level per event kind.

mod log;

pub use log::LogWriter;
