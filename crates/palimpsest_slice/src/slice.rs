//! Slice results.

use crate::criterion::Criterion;
use indexmap::IndexSet;
use palimpsest_core::{Gid, OperationId, Timestamp};
use palimpsest_graph::{Node, NodeKey, NodeKind, ProjectGraph};
use serde::{Deserialize, Serialize};

/// Which way a slice follows edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards the edits the criterion depends on
    Backward,
    /// Towards the edits that depend on the criterion
    Forward,
}

/// One node of a slice, flattened for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceEntry {
    /// File path
    pub file: String,
    /// Node within the file
    pub gid: Gid,
    /// Node kind
    pub kind: NodeKind,
    /// Record the node came from
    pub operation: OperationId,
    /// Index of that record in its log
    pub record_index: usize,
    /// Record time
    pub time: Timestamp,
    /// Char offset
    pub offset: usize,
    /// Span text
    pub text: String,
}

/// A slice flattened for display, with what it was computed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceReport {
    /// Edge direction
    pub direction: Direction,
    /// Snippets the slice started from
    pub criterion: Criterion,
    /// Selected nodes, earliest first
    pub entries: Vec<SliceEntry>,
}

/// Nodes selected by a slice, ordered by time
#[derive(Debug, Clone)]
pub struct Slice<'g> {
    graph: &'g ProjectGraph,
    direction: Direction,
    criterion: Criterion,
    keys: Vec<NodeKey>,
    operations: IndexSet<OperationId>,
}

impl<'g> Slice<'g> {
    pub(crate) fn new(
        graph: &'g ProjectGraph,
        direction: Direction,
        criterion: Criterion,
        keys: impl IntoIterator<Item = NodeKey>,
    ) -> Self {
        let mut keyed: Vec<(Timestamp, NodeKey)> = keys
            .into_iter()
            .filter_map(|key| graph.node(key).map(|n| (n.time, key)))
            .collect();
        keyed.sort_unstable();
        keyed.dedup();

        let keys: Vec<NodeKey> = keyed.into_iter().map(|(_, key)| key).collect();
        let operations = keys
            .iter()
            .filter_map(|&key| graph.node(key).map(|n| n.record_id))
            .collect();
        Self {
            graph,
            direction,
            criterion,
            keys,
            operations,
        }
    }

    /// Edge direction the slice followed
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Snippets the slice started from
    #[must_use]
    pub const fn criterion(&self) -> &Criterion {
        &self.criterion
    }

    /// Node keys, earliest first
    #[must_use]
    pub fn keys(&self) -> &[NodeKey] {
        &self.keys
    }

    /// Nodes, earliest first
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &'g Node)> + '_ {
        let graph = self.graph;
        self.keys
            .iter()
            .filter_map(move |&key| graph.node(key).map(|n| (key, n)))
    }

    /// Ids of the records the nodes came from
    #[must_use]
    pub fn operations(&self) -> &IndexSet<OperationId> {
        &self.operations
    }

    /// Whether a record contributed a node
    #[must_use]
    pub fn contains_operation(&self, id: OperationId) -> bool {
        self.operations.contains(&id)
    }

    /// Whether a node is in the slice
    #[must_use]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.keys.contains(&key)
    }

    /// Earliest node
    #[must_use]
    pub fn first(&self) -> Option<(NodeKey, &'g Node)> {
        let key = *self.keys.first()?;
        self.graph.node(key).map(|n| (key, n))
    }

    /// Latest node
    #[must_use]
    pub fn last(&self) -> Option<(NodeKey, &'g Node)> {
        let key = *self.keys.last()?;
        self.graph.node(key).map(|n| (key, n))
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the slice selected nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Flattened entries for display
    #[must_use]
    pub fn entries(&self) -> Vec<SliceEntry> {
        self.nodes()
            .map(|(key, node)| SliceEntry {
                file: self.graph.file_path(key.file).unwrap_or_default().to_string(),
                gid: node.gid,
                kind: node.kind,
                operation: node.record_id,
                record_index: node.record_index,
                time: node.time,
                offset: node.offset,
                text: node.text.clone(),
            })
            .collect()
    }

    /// Entries together with direction and criterion
    #[must_use]
    pub fn report(&self) -> SliceReport {
        SliceReport {
            direction: self.direction,
            criterion: self.criterion.clone(),
            entries: self.entries(),
        }
    }
}
