//! PALIMPSEST Dependency Graph
//!
//! Splits recorded edits into text-effect nodes and links each node to the
//! earlier nodes that produced the text it touches. Project graphs add
//! links from cuts and copies to the pastes that reused their text.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adjust;
pub mod config;
pub mod error;
pub mod file_graph;
pub mod node;
pub mod project;
pub mod repository;

pub use adjust::{Probe, WorkingSet};
pub use config::GraphConfig;
pub use error::GraphError;
pub use file_graph::{Edge, FileGraph};
pub use node::{Node, NodeKind, nodes_for_record};
pub use project::{EdgeKind, NodeKey, ProjectEdge, ProjectGraph};
pub use repository::GraphRepository;
