//! Slicing errors.

use palimpsest_core::{CoreError, Timestamp};
use palimpsest_replay::ReplayError;

/// Slicing failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SliceError {
    /// A snippet names a file the graph does not have
    #[error("unknown file: {file}")]
    UnknownFile {
        /// Path named by the snippet
        file: String,
    },

    /// A snippet time falls outside its file's history
    #[error("no record of {file} visible at {time}")]
    NotInSpan {
        /// Path named by the snippet
        file: String,
        /// Requested time
        time: Timestamp,
    },

    /// The snippet's text could not be read
    #[error("could not read snippet: {0}")]
    Replay(#[from] ReplayError),
}

impl From<SliceError> for CoreError {
    fn from(err: SliceError) -> Self {
        match err {
            SliceError::UnknownFile { file } => CoreError::NotFound {
                kind: "file".to_string(),
                id: file,
            },
            SliceError::Replay(err) => err.into(),
            other => CoreError::Validation {
                field: "snippet".to_string(),
                reason: other.to_string(),
            },
        }
    }
}
