//! PALIMPSEST Operation Log
//!
//! Recorded edit events, the normalization passes that clean them up, and
//! the per-file log with its time index and restoration points.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod log;
pub mod normalize;
pub mod project;
pub mod record;

pub use encoding::{RecordReader, read_records, write_records};
pub use log::{LogError, OperationLog, RestorationPoint};
pub use normalize::{
    DropReopenNoise, MergeCompositionArtifacts, NormalizeConfig, NormalizePass, Normalizer,
};
pub use project::{Project, ProjectFile};
pub use record::{EditAction, EditPayload, FileAction, OperationKind, OperationRecord};
