//! Normalization passes applied to raw records before indexing.
//!
//! Each pass is a [`NormalizePass`] so hosts can enable, disable or replace
//! them independently. [`Normalizer`] runs the configured passes in order
//! and builds the [`OperationLog`].

use crate::log::{LogError, OperationLog};
use crate::record::{EditPayload, FileAction, OperationKind, OperationRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A rewrite over a raw record sequence
pub trait NormalizePass: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Rewrite the records
    fn apply(&self, records: Vec<OperationRecord>) -> Vec<OperationRecord>;
}

/// Normalization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Drop Close/Open pairs with no edit in between
    pub drop_reopen_noise: bool,
    /// Merge insert-then-delete composition artifacts
    pub merge_composition: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            drop_reopen_noise: true,
            merge_composition: true,
        }
    }
}

/// Drops a Close immediately followed by an Open of the same file.
///
/// Only pairs whose snapshots are identical are dropped; a pair whose texts
/// disagree is kept so that healing can bridge it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropReopenNoise;

impl NormalizePass for DropReopenNoise {
    fn name(&self) -> &'static str {
        "drop_reopen_noise"
    }

    fn apply(&self, records: Vec<OperationRecord>) -> Vec<OperationRecord> {
        let mut out = Vec::with_capacity(records.len());
        let mut iter = records.into_iter().peekable();

        while let Some(rec) = iter.next() {
            let is_noise = match (&rec.kind, iter.peek()) {
                (
                    OperationKind::File {
                        action: FileAction::Close,
                        code: closed,
                    },
                    Some(next),
                ) => {
                    next.file_path == rec.file_path
                        && matches!(
                            &next.kind,
                            OperationKind::File { action: FileAction::Open, code: opened }
                                if opened == closed
                        )
                }
                _ => false,
            };

            if is_noise {
                let reopened = iter.next();
                debug!(
                    close = %rec.id,
                    open = ?reopened.map(|r| r.id),
                    file = %rec.file_path,
                    "dropped close/open pair"
                );
                continue;
            }
            out.push(rec);
        }

        out
    }
}

/// Merges an insert of `T` immediately followed by a delete of exactly `T`
/// at the same offset, when `T` contains multi-byte characters.
///
/// Input methods record the composing text before committing the final one;
/// the pair carries no information of its own. The merged record keeps the
/// first record's identity and deletion and the second record's insertion,
/// and disappears when nothing is left.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeCompositionArtifacts;

impl MergeCompositionArtifacts {
    fn contains_multibyte(text: &str) -> bool {
        text.chars().any(|c| c.len_utf8() > 1)
    }

    fn merge(first: &OperationRecord, second: &OperationRecord) -> Option<EditPayload> {
        if first.file_path != second.file_path {
            return None;
        }
        let (a, b) = (first.as_edit()?, second.as_edit()?);
        let composing = a.start == b.start
            && !a.inserted.is_empty()
            && a.inserted == b.deleted
            && Self::contains_multibyte(&a.inserted);
        composing.then(|| EditPayload {
            action: a.action,
            start: a.start,
            inserted: b.inserted.clone(),
            deleted: a.deleted.clone(),
        })
    }
}

impl NormalizePass for MergeCompositionArtifacts {
    fn name(&self) -> &'static str {
        "merge_composition"
    }

    fn apply(&self, records: Vec<OperationRecord>) -> Vec<OperationRecord> {
        let mut out: Vec<OperationRecord> = Vec::with_capacity(records.len());

        for rec in records {
            let merged = out.last().and_then(|prev| Self::merge(prev, &rec));
            match merged {
                Some(payload) => {
                    debug!(first = ?out.last().map(|r| r.id), second = %rec.id, "merged composition pair");
                    let noop = payload.is_noop();
                    if let Some(prev) = out.last_mut() {
                        prev.kind = OperationKind::Edit(payload);
                    }
                    if noop {
                        out.pop();
                    }
                }
                None => out.push(rec),
            }
        }

        out
    }
}

/// Runs normalization passes and builds logs
pub struct Normalizer {
    passes: Vec<Box<dyn NormalizePass>>,
}

impl Normalizer {
    /// Normalizer with no passes
    #[must_use]
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    /// Normalizer with the passes enabled in `config`
    #[must_use]
    pub fn from_config(config: &NormalizeConfig) -> Self {
        let mut normalizer = Self::empty();
        if config.drop_reopen_noise {
            normalizer = normalizer.with_pass(DropReopenNoise);
        }
        if config.merge_composition {
            normalizer = normalizer.with_pass(MergeCompositionArtifacts);
        }
        normalizer
    }

    /// Append a pass
    #[must_use]
    pub fn with_pass(mut self, pass: impl NormalizePass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Names of the configured passes, in order
    #[must_use]
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass over the records
    #[must_use]
    pub fn apply(&self, mut records: Vec<OperationRecord>) -> Vec<OperationRecord> {
        for pass in &self.passes {
            let before = records.len();
            records = pass.apply(records);
            debug!(pass = pass.name(), before, after = records.len(), "normalization pass");
        }
        records
    }

    /// Normalize the records of one file into a log
    ///
    /// # Errors
    ///
    /// Returns error if the records span several files or are out of order
    pub fn normalize(&self, records: Vec<OperationRecord>) -> Result<OperationLog, LogError> {
        let file_path = records
            .first()
            .map(|r| r.file_path.clone())
            .unwrap_or_default();
        OperationLog::new(file_path, self.apply(records))
    }

    /// Split a mixed stream by file and normalize each part
    ///
    /// Files keep the order of their first appearance.
    ///
    /// # Errors
    ///
    /// Returns error if any file's records are out of order
    pub fn normalize_by_file(
        &self,
        records: Vec<OperationRecord>,
    ) -> Result<IndexMap<String, OperationLog>, LogError> {
        let mut grouped: IndexMap<String, Vec<OperationRecord>> = IndexMap::new();
        for rec in records {
            grouped.entry(rec.file_path.clone()).or_default().push(rec);
        }

        grouped
            .into_iter()
            .map(|(path, recs)| {
                let log = OperationLog::new(path.clone(), self.apply(recs))?;
                Ok((path, log))
            })
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&NormalizeConfig::default())
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("passes", &self.pass_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::OperationRecord as R;

    #[test]
    fn test_drop_reopen_noise() {
        let records = vec![
            R::file(1, 1, "a.rs", FileAction::Open, "ab"),
            R::file(2, 2, "a.rs", FileAction::Close, "ab"),
            R::file(3, 3, "a.rs", FileAction::Open, "ab"),
            R::edit(4, 4, "a.rs", 2, "c", ""),
        ];
        let out = DropReopenNoise.apply(records);
        let ids: Vec<u64> = out.iter().map(|r| r.id.as_u64()).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_drop_reopen_keeps_pair_with_edit_between() {
        let records = vec![
            R::file(1, 1, "a.rs", FileAction::Close, "ab"),
            R::edit(2, 2, "a.rs", 0, "x", ""),
            R::file(3, 3, "a.rs", FileAction::Open, "ab"),
        ];
        assert_eq!(DropReopenNoise.apply(records).len(), 3);
    }

    #[test]
    fn test_drop_reopen_keeps_disagreeing_pair() {
        let records = vec![
            R::file(1, 1, "a.rs", FileAction::Close, "ab"),
            R::file(2, 2, "a.rs", FileAction::Open, "abc"),
        ];
        assert_eq!(DropReopenNoise.apply(records).len(), 2);
    }

    #[test]
    fn test_drop_reopen_other_file() {
        let records = vec![
            R::file(1, 1, "a.rs", FileAction::Close, "ab"),
            R::file(2, 2, "b.rs", FileAction::Open, "ab"),
        ];
        assert_eq!(DropReopenNoise.apply(records).len(), 2);
    }

    #[test]
    fn test_merge_composition_cancels() {
        let records = vec![
            R::edit(1, 1, "a.rs", 0, "にほ", ""),
            R::edit(2, 2, "a.rs", 0, "", "にほ"),
            R::edit(3, 3, "a.rs", 0, "x", ""),
        ];
        let out = MergeCompositionArtifacts.apply(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id.as_u64(), 3);
    }

    #[test]
    fn test_merge_composition_keeps_final_text() {
        let records = vec![
            R::edit(1, 1, "a.rs", 4, "にほ", ""),
            R::edit(2, 2, "a.rs", 4, "日本", "にほ"),
        ];
        let out = MergeCompositionArtifacts.apply(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id.as_u64(), 1);
        let edit = out[0].as_edit().unwrap();
        assert_eq!(edit.inserted, "日本");
        assert!(edit.deleted.is_empty());
        assert_eq!(edit.start, 4);
    }

    #[test]
    fn test_merge_composition_chains() {
        let records = vec![
            R::edit(1, 1, "a.rs", 0, "に", ""),
            R::edit(2, 2, "a.rs", 0, "にほ", "に"),
            R::edit(3, 3, "a.rs", 0, "日本", "にほ"),
        ];
        let out = MergeCompositionArtifacts.apply(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_edit().unwrap().inserted, "日本");
    }

    #[test]
    fn test_merge_composition_ascii_untouched() {
        let records = vec![
            R::edit(1, 1, "a.rs", 0, "ab", ""),
            R::edit(2, 2, "a.rs", 0, "", "ab"),
        ];
        assert_eq!(MergeCompositionArtifacts.apply(records).len(), 2);
    }

    #[test]
    fn test_merge_composition_different_offset() {
        let records = vec![
            R::edit(1, 1, "a.rs", 0, "é", ""),
            R::edit(2, 2, "a.rs", 1, "", "é"),
        ];
        assert_eq!(MergeCompositionArtifacts.apply(records).len(), 2);
    }

    #[test]
    fn test_normalizer_from_config() {
        let all = Normalizer::default();
        assert_eq!(all.pass_names(), vec!["drop_reopen_noise", "merge_composition"]);

        let none = Normalizer::from_config(&NormalizeConfig {
            drop_reopen_noise: false,
            merge_composition: false,
        });
        assert!(none.pass_names().is_empty());
    }

    #[test]
    fn test_normalize_builds_log() {
        let records = vec![
            R::file(1, 1, "a.rs", FileAction::Open, "ab"),
            R::file(2, 2, "a.rs", FileAction::Close, "ab"),
            R::file(3, 3, "a.rs", FileAction::Open, "ab"),
            R::edit(4, 4, "a.rs", 1, "X", ""),
        ];
        let log = Normalizer::default().normalize(records).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.restoration_point_count(), 1);
        assert_eq!(log.file_path(), "a.rs");
    }

    #[test]
    fn test_normalize_by_file() {
        let records = vec![
            R::file(1, 1, "b.rs", FileAction::Open, ""),
            R::file(2, 2, "a.rs", FileAction::Open, ""),
            R::edit(3, 3, "b.rs", 0, "x", ""),
        ];
        let logs = Normalizer::empty().normalize_by_file(records).unwrap();
        let files: Vec<&String> = logs.keys().collect();
        assert_eq!(files, vec!["b.rs", "a.rs"]);
        assert_eq!(logs["b.rs"].len(), 2);
    }
}
