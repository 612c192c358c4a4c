//! Backward and forward slicing.
//!
//! A slice starts from the nodes that produced the criterion's text (the
//! seeds) and closes over graph edges: predecessors for a backward slice,
//! successors for a forward one.

use crate::criterion::{Criterion, Snippet};
use crate::error::SliceError;
use crate::slice::{Direction, Slice};
use indexmap::IndexSet;
use palimpsest_graph::{NodeKey, ProjectGraph, WorkingSet};
use tracing::debug;

/// Slicer over one project graph
#[derive(Debug, Clone, Copy)]
pub struct Slicer<'g> {
    graph: &'g ProjectGraph,
}

impl<'g> Slicer<'g> {
    /// Create a new slicer
    #[must_use]
    pub const fn new(graph: &'g ProjectGraph) -> Self {
        Self { graph }
    }

    /// Nodes that produced the criterion's text
    ///
    /// # Errors
    ///
    /// Returns error if a snippet names a file the graph does not have
    pub fn seeds(&self, criterion: &Criterion) -> Result<IndexSet<NodeKey>, SliceError> {
        let mut seeds = IndexSet::new();
        for snippet in &criterion.snippets {
            self.seed_snippet(snippet, &mut seeds)?;
        }
        Ok(seeds)
    }

    fn seed_snippet(&self, snippet: &Snippet, seeds: &mut IndexSet<NodeKey>) -> Result<(), SliceError> {
        let unknown = || SliceError::UnknownFile {
            file: snippet.file.clone(),
        };
        let file = self.graph.file_index(&snippet.file).ok_or_else(unknown)?;
        let graph = self.graph.file_graph(&snippet.file).ok_or_else(unknown)?;

        let mut set = WorkingSet::for_range(snippet.start, snippet.end);
        for node in graph.nodes_through(snippet.snapshot_index).iter().rev() {
            if set.is_empty() {
                break;
            }
            if set.depends_on(node) {
                seeds.insert(NodeKey::new(file, node.gid));
            }
            set.fold(node);
        }
        Ok(())
    }

    /// Every node the criterion's text depends on
    ///
    /// # Errors
    ///
    /// Returns error if a snippet names a file the graph does not have
    #[tracing::instrument(skip_all, fields(snippets = criterion.snippets.len()))]
    pub fn backward_slice(&self, criterion: &Criterion) -> Result<Slice<'g>, SliceError> {
        let seeds = self.seeds(criterion)?;
        let closure = self.close_over(seeds, |key| self.graph.predecessors(key).collect());
        debug!(nodes = closure.len(), "backward slice");
        Ok(Slice::new(self.graph, Direction::Backward, criterion.clone(), closure))
    }

    /// Every node that depends on the criterion's text
    ///
    /// # Errors
    ///
    /// Returns error if a snippet names a file the graph does not have
    #[tracing::instrument(skip_all, fields(snippets = criterion.snippets.len()))]
    pub fn forward_slice(&self, criterion: &Criterion) -> Result<Slice<'g>, SliceError> {
        let seeds = self.seeds(criterion)?;
        let closure = self.close_over(seeds, |key| self.graph.successors(key).collect());
        debug!(nodes = closure.len(), "forward slice");
        Ok(Slice::new(self.graph, Direction::Forward, criterion.clone(), closure))
    }

    fn close_over<F>(&self, seeds: IndexSet<NodeKey>, next: F) -> IndexSet<NodeKey>
    where
        F: Fn(NodeKey) -> Vec<NodeKey>,
    {
        let mut visited = IndexSet::with_capacity(seeds.len());
        let mut stack: Vec<NodeKey> = seeds.into_iter().collect();
        while let Some(key) = stack.pop() {
            if !visited.insert(key) {
                continue;
            }
            stack.extend(next(key).into_iter().filter(|k| !visited.contains(k)));
        }
        visited
    }
}
