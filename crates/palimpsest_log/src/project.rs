//! The set of file logs that make up a project.

use crate::log::OperationLog;
use indexmap::IndexMap;
use palimpsest_core::Timestamp;
use std::sync::Arc;

/// One file of a project
#[derive(Debug, Clone)]
pub struct ProjectFile {
    /// The file's log
    pub log: Arc<OperationLog>,
    /// When the log was last modified
    pub last_modified: Timestamp,
}

/// Named collection of file logs, in insertion order
#[derive(Debug, Clone, Default)]
pub struct Project {
    name: String,
    files: IndexMap<String, ProjectFile>,
}

impl Project {
    /// Create an empty project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: IndexMap::new(),
        }
    }

    /// Project name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace a file's log
    pub fn insert(&mut self, log: OperationLog, last_modified: Timestamp) {
        let path = log.file_path().to_string();
        self.files.insert(
            path,
            ProjectFile {
                log: Arc::new(log),
                last_modified,
            },
        );
    }

    /// Builder form of [`Project::insert`]
    #[must_use]
    pub fn with_file(mut self, log: OperationLog, last_modified: Timestamp) -> Self {
        self.insert(log, last_modified);
        self
    }

    /// Remove a file
    pub fn remove(&mut self, path: &str) -> Option<ProjectFile> {
        self.files.shift_remove(path)
    }

    /// Look up a file
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&ProjectFile> {
        self.files.get(path)
    }

    /// Iterate over files in insertion order
    pub fn files(&self) -> impl Iterator<Item = (&str, &ProjectFile)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the project has no files
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total records across all files
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.files.values().map(|f| f.log.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FileAction, OperationRecord};

    fn log_for(path: &str, n: usize) -> OperationLog {
        let records = (0..n)
            .map(|i| OperationRecord::file(i as u64, i as u64, path, FileAction::Open, ""))
            .collect();
        OperationLog::new(path, records).unwrap()
    }

    #[test]
    fn test_project_insert_and_replace() {
        let mut project = Project::new("demo")
            .with_file(log_for("a.rs", 2), Timestamp::from_millis(1))
            .with_file(log_for("b.rs", 1), Timestamp::from_millis(1));
        assert_eq!(project.len(), 2);
        assert_eq!(project.record_count(), 3);

        project.insert(log_for("a.rs", 5), Timestamp::from_millis(2));
        assert_eq!(project.len(), 2);
        assert_eq!(project.file("a.rs").unwrap().log.len(), 5);
        assert_eq!(project.file("a.rs").unwrap().last_modified, Timestamp::from_millis(2));

        let order: Vec<&str> = project.files().map(|(p, _)| p).collect();
        assert_eq!(order, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn test_project_remove() {
        let mut project = Project::new("demo").with_file(log_for("a.rs", 1), Timestamp::zero());
        assert!(project.remove("a.rs").is_some());
        assert!(project.is_empty());
        assert!(project.remove("a.rs").is_none());
    }
}
