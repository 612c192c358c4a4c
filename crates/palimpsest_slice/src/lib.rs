//! PALIMPSEST Slicer
//!
//! Answers "which edits produced this text" (backward slice) and "which
//! later edits were built on it" (forward slice) over a project graph.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod criterion;
pub mod error;
pub mod slice;
pub mod slicer;

pub use criterion::{Criterion, Snippet};
pub use error::SliceError;
pub use slice::{Direction, Slice, SliceEntry, SliceReport};
pub use slicer::Slicer;
