//! Per-file dependency graph.
//!
//! Nodes come from the file's records in order. An edge `M -> N` says that
//! text `N` touches was put there (or taken away) by `M`.

use crate::adjust::WorkingSet;
use crate::error::GraphError;
use crate::node::{Node, NodeKind, nodes_for_record};
use palimpsest_core::{Gid, ProgressMonitor};
use palimpsest_log::{OperationLog, OperationRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A causal edge inside one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Earlier node
    pub from: Gid,
    /// Later node
    pub to: Gid,
}

impl Edge {
    /// Create a new edge
    #[must_use]
    pub const fn new(from: Gid, to: Gid) -> Self {
        Self { from, to }
    }
}

/// Dependency graph of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGraph {
    path: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    predecessors: Vec<Vec<Gid>>,
    successors: Vec<Vec<Gid>>,
}

impl FileGraph {
    /// Build the graph of a log
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Aborted`] if the host cancels
    pub fn build<P>(log: &OperationLog, progress: &mut P) -> Result<Self, GraphError>
    where
        P: ProgressMonitor + ?Sized,
    {
        Self::from_records(log.file_path(), log.records(), progress)
    }

    /// Build the graph of a file from raw records
    ///
    /// Cancellation is polled once per record and once per node.
    ///
    /// # Errors
    ///
    /// Returns error if records are out of order or the host cancels
    #[tracing::instrument(skip_all, fields(file = path, records = records.len()))]
    pub fn from_records<P>(
        path: &str,
        records: &[OperationRecord],
        progress: &mut P,
    ) -> Result<Self, GraphError>
    where
        P: ProgressMonitor + ?Sized,
    {
        if let Some(position) = records
            .windows(2)
            .position(|w| w[1].order_key() < w[0].order_key())
        {
            return Err(GraphError::Unordered {
                position: position + 1,
            });
        }

        let mut nodes: Vec<Node> = Vec::new();
        for (index, rec) in records.iter().enumerate() {
            if progress.is_canceled() {
                return Err(GraphError::Aborted);
            }
            let emitted = nodes_for_record(rec, index, Gid::from_index(nodes.len()));
            nodes.extend(emitted);
            progress.worked(1);
        }

        let mut edges = Vec::new();
        for later in &nodes {
            if progress.is_canceled() {
                return Err(GraphError::Aborted);
            }
            let mut set = WorkingSet::for_node(later);
            for earlier in nodes[..later.gid.index()].iter().rev() {
                if set.is_empty() {
                    break;
                }
                if set.depends_on(earlier) {
                    edges.push(Edge::new(earlier.gid, later.gid));
                }
                set.fold(earlier);
            }
        }

        let mut predecessors = vec![Vec::new(); nodes.len()];
        let mut successors = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            predecessors[edge.to.index()].push(edge.from);
            successors[edge.from.index()].push(edge.to);
        }

        debug!(nodes = nodes.len(), edges = edges.len(), "built file graph");
        Ok(Self {
            path: path.to_string(),
            nodes,
            edges,
            predecessors,
            successors,
        })
    }

    /// Path of the file
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All nodes in gid order
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All causal edges
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get node by gid
    #[must_use]
    pub fn node(&self, gid: Gid) -> Option<&Node> {
        self.nodes.get(gid.index())
    }

    /// Nodes that `gid` depends on
    #[must_use]
    pub fn predecessors(&self, gid: Gid) -> &[Gid] {
        self.predecessors.get(gid.index()).map(Vec::as_slice).unwrap_or_default()
    }

    /// Nodes that depend on `gid`
    #[must_use]
    pub fn successors(&self, gid: Gid) -> &[Gid] {
        self.successors.get(gid.index()).map(Vec::as_slice).unwrap_or_default()
    }

    /// Nodes emitted by records `0..=record_index`
    #[must_use]
    pub fn nodes_through(&self, record_index: usize) -> &[Node] {
        let end = self.nodes.partition_point(|n| n.record_index <= record_index);
        &self.nodes[..end]
    }

    /// Nodes emitted by one record
    #[must_use]
    pub fn nodes_of_record(&self, record_index: usize) -> &[Node] {
        let start = self.nodes.partition_point(|n| n.record_index < record_index);
        let end = self.nodes.partition_point(|n| n.record_index <= record_index);
        &self.nodes[start..end]
    }

    /// The node of `kind` emitted by a record, if any
    #[must_use]
    pub fn node_of_record(&self, record_index: usize, kind: NodeKind) -> Option<&Node> {
        self.nodes_of_record(record_index)
            .iter()
            .find(|n| n.kind == kind)
    }

    /// Get total node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get total edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palimpsest_core::{CancelFlag, NullProgress};
    use palimpsest_log::{FileAction, OperationRecord as R};
    use proptest::prelude::*;

    fn example_log() -> OperationLog {
        OperationLog::new(
            "f.rs",
            vec![
                R::file(0, 0, "f.rs", FileAction::Open, "ab"),
                R::edit(1, 1, "f.rs", 1, "X", ""),
                R::edit(2, 2, "f.rs", 0, "", "a"),
            ],
        )
        .unwrap()
    }

    fn has_edge(graph: &FileGraph, from: usize, to: usize) -> bool {
        graph
            .edges()
            .contains(&Edge::new(Gid::from_index(from), Gid::from_index(to)))
    }

    #[test]
    fn test_worked_example_edges() {
        let graph = FileGraph::build(&example_log(), &mut NullProgress).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.node(Gid::from_index(0)).unwrap().kind, NodeKind::Open);
        assert_eq!(graph.node(Gid::from_index(1)).unwrap().kind, NodeKind::Add);
        assert_eq!(graph.node(Gid::from_index(2)).unwrap().kind, NodeKind::Remove);

        // Insert lands inside the opened text; delete removes opened text
        assert!(has_edge(&graph, 0, 1));
        assert!(has_edge(&graph, 0, 2));
        assert!(!has_edge(&graph, 1, 2));
        assert_eq!(graph.edge_count(), 2);

        assert_eq!(graph.predecessors(Gid::from_index(2)), &[Gid::from_index(0)]);
        assert_eq!(
            graph.successors(Gid::from_index(0)),
            &[Gid::from_index(1), Gid::from_index(2)]
        );
    }

    #[test]
    fn test_delete_of_typed_text_depends_on_insert() {
        let log = OperationLog::new(
            "f.rs",
            vec![
                R::file(0, 0, "f.rs", FileAction::Open, "ab"),
                R::edit(1, 1, "f.rs", 1, "XYZ", ""),
                R::edit(2, 2, "f.rs", 0, "!", ""),
                R::edit(3, 3, "f.rs", 3, "", "YZ"),
            ],
        )
        .unwrap();
        let graph = FileGraph::build(&log, &mut NullProgress).unwrap();
        // gids: 0 open, 1 add XYZ, 2 add "!", 3 remove YZ
        assert!(has_edge(&graph, 1, 3));
        assert!(!has_edge(&graph, 0, 3));
        assert!(!has_edge(&graph, 2, 3));
        // "!" at the very start is not inside the opened text
        assert!(!has_edge(&graph, 0, 2));
    }

    #[test]
    fn test_typing_at_end_of_insert_is_independent() {
        let log = OperationLog::new(
            "f.rs",
            vec![
                R::edit(0, 0, "f.rs", 0, "ab", ""),
                R::edit(1, 1, "f.rs", 2, "c", ""),
                R::edit(2, 2, "f.rs", 1, "d", ""),
            ],
        )
        .unwrap();
        let graph = FileGraph::build(&log, &mut NullProgress).unwrap();
        assert!(!has_edge(&graph, 0, 1));
        assert!(has_edge(&graph, 0, 2));
    }

    #[test]
    fn test_record_lookups() {
        let log = OperationLog::new(
            "f.rs",
            vec![
                R::file(0, 0, "f.rs", FileAction::Open, "abc"),
                R::file(1, 1, "f.rs", FileAction::Close, "abc"),
                R::edit(2, 2, "f.rs", 0, "x", "a"),
            ],
        )
        .unwrap();
        let graph = FileGraph::build(&log, &mut NullProgress).unwrap();
        assert!(graph.nodes_of_record(1).is_empty());
        assert_eq!(graph.nodes_of_record(2).len(), 2);
        assert_eq!(graph.node_of_record(2, NodeKind::Add).unwrap().gid, Gid::from_index(2));
        assert!(graph.node_of_record(2, NodeKind::Copy).is_none());
        assert_eq!(graph.nodes_through(1).len(), 1);
        assert_eq!(graph.nodes_through(2).len(), 3);
    }

    #[test]
    fn test_unordered_records_fail() {
        let records = vec![
            R::edit(0, 5, "f.rs", 0, "a", ""),
            R::edit(1, 4, "f.rs", 0, "b", ""),
        ];
        let err = FileGraph::from_records("f.rs", &records, &mut NullProgress).unwrap_err();
        assert_eq!(err, GraphError::Unordered { position: 1 });
    }

    #[test]
    fn test_cancel_aborts() {
        let flag = CancelFlag::new();
        flag.cancel();
        let mut progress = flag.clone();
        let err = FileGraph::build(&example_log(), &mut progress).unwrap_err();
        assert_eq!(err, GraphError::Aborted);
    }

    #[test]
    fn test_progress_counts_records() {
        let mut flag = CancelFlag::new();
        FileGraph::build(&example_log(), &mut flag).unwrap();
        assert_eq!(flag.completed(), 3);
    }

    fn arb_records() -> impl Strategy<Value = Vec<OperationRecord>> {
        proptest::collection::vec((0usize..40, 0usize..4, "[a-d]{0,4}"), 1..30).prop_map(|steps| {
            let mut len = 8usize;
            let mut records = vec![R::file(0, 0, "f.rs", FileAction::Open, "abcdefgh")];
            for (i, (start_seed, del_seed, inserted)) in steps.into_iter().enumerate() {
                let start = start_seed % (len + 1);
                let del_len = del_seed.min(len - start);
                len = len - del_len + inserted.chars().count();
                let id = i as u64 + 1;
                records.push(R::edit(id, id, "f.rs", start, inserted, "?".repeat(del_len)));
            }
            records
        })
    }

    proptest! {
        #[test]
        fn prop_edges_point_forward(records in arb_records()) {
            let graph = FileGraph::from_records("f.rs", &records, &mut NullProgress).unwrap();
            for edge in graph.edges() {
                prop_assert!(edge.from < edge.to);
            }
            for (i, node) in graph.nodes().iter().enumerate() {
                prop_assert_eq!(node.gid.index(), i);
            }
        }
    }
}
