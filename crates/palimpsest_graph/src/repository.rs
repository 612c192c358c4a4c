//! Cache of project graphs.
//!
//! The repository is an ordinary value owned by the host. Each project
//! keeps the file graphs it was built from, tagged with the modification
//! time they were built at; a rebuild only redoes stale files.

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::file_graph::FileGraph;
use crate::project::{ProjectGraph, wrap};
use indexmap::IndexMap;
use palimpsest_core::{ProgressMonitor, Timestamp};
use palimpsest_log::Project;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct CachedFile {
    last_modified: Timestamp,
    graph: Arc<FileGraph>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    files: IndexMap<String, CachedFile>,
    graph: Arc<ProjectGraph>,
}

/// Builds project graphs and keeps them until their files change
#[derive(Debug, Clone, Default)]
pub struct GraphRepository {
    config: GraphConfig,
    entries: IndexMap<String, CacheEntry>,
}

impl GraphRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            entries: IndexMap::new(),
        }
    }

    /// Builder configuration
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Graph of a project, rebuilding the files that changed
    ///
    /// Files whose modification time differs from the cached one, and files
    /// not seen before, are rebuilt; files gone from the project are dropped.
    /// Cut/paste edges are recomputed whenever anything changed. On failure
    /// or cancellation the project's entry is cleared and nothing is
    /// published.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Aborted`] if the host cancels, or
    /// [`GraphError::BuildFailure`] naming the first file that failed
    #[tracing::instrument(skip_all, fields(project = project.name(), files = project.len()))]
    pub fn build_project_graph<P>(
        &mut self,
        project: &Project,
        progress: &mut P,
    ) -> Result<Arc<ProjectGraph>, GraphError>
    where
        P: ProgressMonitor + ?Sized,
    {
        let previous = self.entries.shift_remove(project.name());

        if let Some(entry) = &previous
            && Self::is_current(entry, project)
        {
            debug!("project graph is current");
            let graph = Arc::clone(&entry.graph);
            self.entries.insert(project.name().to_string(), entry.clone());
            return Ok(graph);
        }

        let cached = previous.map(|e| e.files).unwrap_or_default();
        match self.rebuild(project, cached, progress) {
            Ok(entry) => {
                let graph = Arc::clone(&entry.graph);
                self.entries.insert(project.name().to_string(), entry);
                Ok(graph)
            }
            Err(err) => {
                warn!(error = %err, "project graph build failed, cache entry cleared");
                Err(err)
            }
        }
    }

    fn is_current(entry: &CacheEntry, project: &Project) -> bool {
        entry.files.len() == project.len()
            && project.files().zip(entry.files.iter()).all(|((path, file), (cached_path, cached))| {
                path == cached_path && file.last_modified == cached.last_modified
            })
    }

    fn rebuild<P>(
        &self,
        project: &Project,
        mut cached: IndexMap<String, CachedFile>,
        progress: &mut P,
    ) -> Result<CacheEntry, GraphError>
    where
        P: ProgressMonitor + ?Sized,
    {
        let stale_records: usize = project
            .files()
            .filter(|(path, file)| {
                cached
                    .get(*path)
                    .is_none_or(|c| c.last_modified != file.last_modified)
            })
            .map(|(_, file)| file.log.len())
            .sum();
        progress.begin(stale_records as u64);

        let mut files = IndexMap::with_capacity(project.len());
        let mut rebuilt = 0usize;
        for (path, file) in project.files() {
            let reusable = cached
                .swap_remove(path)
                .filter(|c| c.last_modified == file.last_modified);
            let entry = match reusable {
                Some(c) => c,
                None => {
                    let graph = FileGraph::build(&file.log, progress).map_err(|e| wrap(path, e))?;
                    rebuilt += 1;
                    CachedFile {
                        last_modified: file.last_modified,
                        graph: Arc::new(graph),
                    }
                }
            };
            files.insert(path.to_string(), entry);
        }
        let dropped = cached.len();

        let graphs = files
            .iter()
            .map(|(path, c)| (path.clone(), Arc::clone(&c.graph)))
            .collect();
        let graph = ProjectGraph::assemble(project, graphs, &self.config, progress)?;
        progress.done();

        info!(rebuilt, dropped, records = stale_records, "rebuilt project graph");
        Ok(CacheEntry {
            files,
            graph: Arc::new(graph),
        })
    }

    /// Cached graph of a project, if any
    #[must_use]
    pub fn cached(&self, name: &str) -> Option<Arc<ProjectGraph>> {
        self.entries.get(name).map(|e| Arc::clone(&e.graph))
    }

    /// Drop a project's entry
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.entries.shift_remove(name).is_some()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached projects
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
