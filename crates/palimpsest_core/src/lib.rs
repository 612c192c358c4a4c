//! PALIMPSEST Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! Everything above it (log, replay, graph, slicer) shares these ids,
//! timestamps, digests and the progress/cancellation surface.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod id;
pub mod progress;
pub mod time;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use hash::{ContentHash, HashError};
pub use id::{Gid, OperationId};
pub use progress::{CancelFlag, NullProgress, ProgressMonitor};
pub use time::{Duration, Timestamp};
