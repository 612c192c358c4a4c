//! Identifiers for records and graph nodes.
//!
//! Record ids come from the recorder and are stable across reloads.
//! Graph ids are local to one file graph and follow emission order.

use serde::{Deserialize, Serialize};

/// Operation identifier - identifies a single recorded edit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(u64);

impl OperationId {
    /// Create from raw value
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get raw value
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id directly after this one
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op_{}", self.0)
    }
}

impl From<u64> for OperationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Graph-local node identifier, strictly increasing in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gid(usize);

impl Gid {
    /// The first gid of every file graph
    pub const ZERO: Gid = Gid(0);

    /// Create from a position in the node list
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Position in the node list
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Gid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_display() {
        assert_eq!(OperationId::from_raw(7).to_string(), "op_7");
        assert_eq!(OperationId::from(7).next().as_u64(), 8);
    }

    #[test]
    fn test_operation_id_serde_transparent() {
        let json = serde_json::to_string(&OperationId::from_raw(12)).unwrap();
        assert_eq!(json, "12");
        let back: OperationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_u64(), 12);
    }

    #[test]
    fn test_gid_ordering() {
        let a = Gid::from_index(1);
        let b = Gid::from_index(2);
        assert!(a < b);
        assert_eq!(Gid::ZERO.index(), 0);
        assert_eq!(b.to_string(), "g2");
    }
}
