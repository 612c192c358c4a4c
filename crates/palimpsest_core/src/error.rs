//! Core error types for PALIMPSEST.
//!
//! Every component crate has its own error enum; they all fold into
//! [`CoreError`] for hosts that want to handle a single type.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid encoding
    InvalidEncoding {
        /// Decoder message
        reason: String,
    },

    /// Digest mismatch
    HashMismatch {
        /// Expected digest
        expected: String,
        /// Actual digest
        actual: String,
    },

    /// Invalid digest format
    InvalidHash {
        /// Reason
        reason: String,
    },

    /// Records out of `(time, sequence)` order
    Unordered {
        /// Position of the first offending record
        position: usize,
    },

    /// Replay could not reconstruct content
    Replay {
        /// Description of the failure
        reason: String,
    },

    /// Graph construction failed
    Graph {
        /// Description of the failure
        reason: String,
    },

    /// Validation error
    Validation {
        /// Field or component
        field: String,
        /// Reason
        reason: String,
    },

    /// Not found
    NotFound {
        /// Kind of thing looked up
        kind: String,
        /// Identifier used
        id: String,
    },

    /// Cancelled
    Cancelled,

    /// Internal error (for unexpected errors)
    Internal {
        /// Error message
        message: String,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEncoding { reason } => write!(f, "Invalid encoding: {}", reason),
            Self::HashMismatch { expected, actual } => {
                write!(f, "Hash mismatch: expected {}, got {}", expected, actual)
            }
            Self::InvalidHash { reason } => write!(f, "Invalid hash: {}", reason),
            Self::Unordered { position } => {
                write!(f, "Records out of order at position {}", position)
            }
            Self::Replay { reason } => write!(f, "Replay failed: {}", reason),
            Self::Graph { reason } => write!(f, "Graph build failed: {}", reason),
            Self::Validation { field, reason } => {
                write!(f, "Validation failed for {}: {}", field, reason)
            }
            Self::NotFound { kind, id } => write!(f, "{} not found: {}", kind, id),
            Self::Cancelled => write!(f, "Operation cancelled"),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::Cancelled;
        assert_eq!(format!("{}", err), "Operation cancelled");

        let err = CoreError::NotFound {
            kind: "File".to_string(),
            id: "src/main.rs".to_string(),
        };
        assert_eq!(format!("{}", err), "File not found: src/main.rs");
    }

    #[test]
    fn test_hash_mismatch_error() {
        let err = CoreError::HashMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        let s = format!("{}", err);
        assert!(s.contains("abc123"));
        assert!(s.contains("def456"));
    }

    #[test]
    fn test_unordered_error() {
        let err = CoreError::Unordered { position: 42 };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::InvalidEncoding { .. }));
    }
}
