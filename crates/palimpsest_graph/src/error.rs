//! Graph construction errors.

use palimpsest_core::CoreError;

/// Graph construction failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The host canceled the build
    #[error("graph build aborted")]
    Aborted,

    /// Records are not in `(time, sequence)` order
    #[error("record {position} is out of order")]
    Unordered {
        /// Position of the first offending record
        position: usize,
    },

    /// A file's subgraph could not be built
    #[error("failed to build graph for {file}: {source}")]
    BuildFailure {
        /// File whose subgraph failed
        file: String,
        /// Underlying failure
        #[source]
        source: Box<GraphError>,
    },
}

impl From<GraphError> for CoreError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Aborted => CoreError::Cancelled,
            other => CoreError::Graph {
                reason: other.to_string(),
            },
        }
    }
}
