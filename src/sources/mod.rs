//! # Source abstractions and specifications.
//!
//! This module provides the source-related types:
//! - [`Source`] - trait for observers producing a lazy sequence of [`Update`](crate::Update)s
//! - [`SourceFn`] - closure-backed source implementation
//! - [`SourceRef`] - shared reference to a source (`Arc<dyn Source>`)
//! - [`SourceSpec`] - specification bundling a source with its restart policy

mod source;
mod source_fn;
mod spec;

pub use source::{Source, SourceRef, UpdateStream};
pub use source_fn::SourceFn;
pub use spec::SourceSpec;
