//! Project-wide dependency graph.
//!
//! The union of every file's graph, plus edges from cuts and copies to the
//! pastes that reused their text, possibly in another file.

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::file_graph::FileGraph;
use crate::node::{Node, NodeKind};
use indexmap::IndexMap;
use palimpsest_core::{Gid, ProgressMonitor, Timestamp};
use palimpsest_log::{OperationRecord, Project};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A node anywhere in the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    /// Position of the file in the project
    pub file: usize,
    /// Node inside that file
    pub gid: Gid,
}

impl NodeKey {
    /// Create a new key
    #[must_use]
    pub const fn new(file: usize, gid: Gid) -> Self {
        Self { file, gid }
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{}:{}", self.file, self.gid)
    }
}

/// Why one node depends on another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Text-position dependency inside a file
    Causal,
    /// Pasted text came from a cut or copy
    CutPaste,
}

/// An edge between nodes of the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectEdge {
    /// Earlier node
    pub from: NodeKey,
    /// Later node
    pub to: NodeKey,
    /// Edge kind
    pub kind: EdgeKind,
}

/// Dependency graph of a whole project
#[derive(Debug, Clone, Default)]
pub struct ProjectGraph {
    name: String,
    files: IndexMap<String, Arc<FileGraph>>,
    cut_paste: Vec<ProjectEdge>,
    cut_paste_in: IndexMap<NodeKey, Vec<NodeKey>>,
    cut_paste_out: IndexMap<NodeKey, Vec<NodeKey>>,
}

impl ProjectGraph {
    /// Build every file graph of a project from scratch
    ///
    /// # Errors
    ///
    /// Returns error if any file fails or the host cancels
    pub fn build<P>(
        project: &Project,
        config: &GraphConfig,
        progress: &mut P,
    ) -> Result<Self, GraphError>
    where
        P: ProgressMonitor + ?Sized,
    {
        progress.begin(project.record_count() as u64);
        let mut files = IndexMap::with_capacity(project.len());
        for (path, file) in project.files() {
            let graph = FileGraph::build(&file.log, progress).map_err(|e| wrap(path, e))?;
            files.insert(path.to_string(), Arc::new(graph));
        }
        let graph = Self::assemble(project, files, config, progress)?;
        progress.done();
        Ok(graph)
    }

    /// Combine already built file graphs and compute cut/paste edges
    ///
    /// `files` must follow the project's file order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Aborted`] if the host cancels
    #[tracing::instrument(skip_all, fields(project = project.name(), files = files.len()))]
    pub(crate) fn assemble<P>(
        project: &Project,
        files: IndexMap<String, Arc<FileGraph>>,
        config: &GraphConfig,
        progress: &mut P,
    ) -> Result<Self, GraphError>
    where
        P: ProgressMonitor + ?Sized,
    {
        let mut graph = Self {
            name: project.name().to_string(),
            files,
            ..Self::default()
        };
        if config.cut_paste_edges {
            graph.link_cut_paste(project, progress)?;
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            cut_paste = graph.cut_paste.len(),
            "assembled project graph"
        );
        Ok(graph)
    }

    fn link_cut_paste<P>(&mut self, project: &Project, progress: &mut P) -> Result<(), GraphError>
    where
        P: ProgressMonitor + ?Sized,
    {
        // Every record of the project in global (time, sequence) order
        let mut timeline: Vec<(Timestamp, u64, usize, usize, &OperationRecord)> = project
            .files()
            .enumerate()
            .flat_map(|(file, (_, pf))| {
                pf.log
                    .records()
                    .iter()
                    .enumerate()
                    .map(move |(index, rec)| (rec.time, rec.sequence, file, index, rec))
            })
            .collect();
        timeline.sort_by_key(|&(time, sequence, file, index, _)| (time, sequence, file, index));

        for (i, &(_, _, file, index, rec)) in timeline.iter().enumerate() {
            if progress.is_canceled() {
                return Err(GraphError::Aborted);
            }
            let Some(text) = rec.clipboard_text().filter(|t| !t.is_empty()) else {
                continue;
            };
            let source_kind = if rec.as_edit().is_some() {
                NodeKind::Remove
            } else {
                NodeKind::Copy
            };
            let Some(source) = self.record_node(file, index, source_kind) else {
                continue;
            };

            for &(_, _, paste_file, paste_index, paste) in &timeline[i + 1..] {
                if paste.clipboard_text().is_some() {
                    break;
                }
                let pasted = paste
                    .as_edit()
                    .is_some_and(|edit| paste.is_paste() && edit.inserted.ends_with(text));
                if !pasted {
                    continue;
                }
                if let Some(target) = self.record_node(paste_file, paste_index, NodeKind::Add) {
                    self.cut_paste.push(ProjectEdge {
                        from: source,
                        to: target,
                        kind: EdgeKind::CutPaste,
                    });
                }
            }
        }

        for edge in &self.cut_paste {
            self.cut_paste_out.entry(edge.from).or_default().push(edge.to);
            self.cut_paste_in.entry(edge.to).or_default().push(edge.from);
        }
        debug!(edges = self.cut_paste.len(), "linked cut/paste");
        Ok(())
    }

    fn record_node(&self, file: usize, record_index: usize, kind: NodeKind) -> Option<NodeKey> {
        let (_, graph) = self.files.get_index(file)?;
        graph
            .node_of_record(record_index, kind)
            .map(|n| NodeKey::new(file, n.gid))
    }

    /// Project name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Graph of one file
    #[must_use]
    pub fn file_graph(&self, path: &str) -> Option<&FileGraph> {
        self.files.get(path).map(Arc::as_ref)
    }

    /// Shared handle to a file's graph
    #[must_use]
    pub fn file_graph_arc(&self, path: &str) -> Option<Arc<FileGraph>> {
        self.files.get(path).cloned()
    }

    /// Position of a file in the project
    #[must_use]
    pub fn file_index(&self, path: &str) -> Option<usize> {
        self.files.get_index_of(path)
    }

    /// Path of the file at `index`
    #[must_use]
    pub fn file_path(&self, index: usize) -> Option<&str> {
        self.files.get_index(index).map(|(path, _)| path.as_str())
    }

    /// File graphs in project order
    pub fn files(&self) -> impl Iterator<Item = &FileGraph> {
        self.files.values().map(Arc::as_ref)
    }

    /// Get node by key
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.files.get_index(key.file)?.1.node(key.gid)
    }

    /// Every node with its key
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.files.values().enumerate().flat_map(|(file, graph)| {
            graph
                .nodes()
                .iter()
                .map(move |n| (NodeKey::new(file, n.gid), n))
        })
    }

    /// Every edge, causal first
    pub fn edges(&self) -> impl Iterator<Item = ProjectEdge> + '_ {
        self.files
            .values()
            .enumerate()
            .flat_map(|(file, graph)| {
                graph.edges().iter().map(move |e| ProjectEdge {
                    from: NodeKey::new(file, e.from),
                    to: NodeKey::new(file, e.to),
                    kind: EdgeKind::Causal,
                })
            })
            .chain(self.cut_paste.iter().copied())
    }

    /// Cut/paste edges only
    #[must_use]
    pub fn cut_paste_edges(&self) -> &[ProjectEdge] {
        &self.cut_paste
    }

    /// Nodes that `key` depends on, over both edge kinds
    pub fn predecessors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        let causal = self
            .files
            .get_index(key.file)
            .map(|(_, g)| g.predecessors(key.gid))
            .unwrap_or_default();
        let cut_paste = self
            .cut_paste_in
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default();
        causal
            .iter()
            .map(move |&gid| NodeKey::new(key.file, gid))
            .chain(cut_paste.iter().copied())
    }

    /// Nodes that depend on `key`, over both edge kinds
    pub fn successors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        let causal = self
            .files
            .get_index(key.file)
            .map(|(_, g)| g.successors(key.gid))
            .unwrap_or_default();
        let cut_paste = self
            .cut_paste_out
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default();
        causal
            .iter()
            .map(move |&gid| NodeKey::new(key.file, gid))
            .chain(cut_paste.iter().copied())
    }

    /// Number of files
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Get total node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.files.values().map(|g| g.node_count()).sum()
    }

    /// Get total edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.files.values().map(|g| g.edge_count()).sum::<usize>() + self.cut_paste.len()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }
}

pub(crate) fn wrap(path: &str, err: GraphError) -> GraphError {
    match err {
        GraphError::Aborted => GraphError::Aborted,
        other => GraphError::BuildFailure {
            file: path.to_string(),
            source: Box::new(other),
        },
    }
}
