//! Slicing criteria.

use crate::error::SliceError;
use palimpsest_core::Timestamp;
use palimpsest_log::OperationLog;
use palimpsest_replay::ReplayEngine;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A char range of one file, as it stood after a given record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snippet {
    /// File path
    pub file: String,
    /// First char of the range
    pub start: usize,
    /// End of the range, exclusive
    pub end: usize,
    /// Index of the record after which the range is read
    pub snapshot_index: usize,
    /// Time the range is read at
    pub time: Timestamp,
    /// Text of the range at that point
    pub text: String,
}

impl Snippet {
    /// Range read after record `index` of `log`
    ///
    /// The time is the record's. A range running past the end of the file
    /// keeps only the text that exists.
    ///
    /// # Errors
    ///
    /// Returns error if `index` is outside the log or the file cannot be
    /// replayed up to it
    pub fn at_index(log: &OperationLog, range: Range<usize>, index: usize) -> Result<Self, SliceError> {
        let content = ReplayEngine::new(log).restore(index)?;
        let time = log.get(index).map(|rec| rec.time).unwrap_or_default();
        let end = range.end.max(range.start);
        Ok(Self {
            file: log.file_path().to_string(),
            start: range.start,
            end,
            snapshot_index: index,
            time,
            text: content.chars().skip(range.start).take(end - range.start).collect(),
        })
    }

    /// Range read at `time` in `log`
    ///
    /// # Errors
    ///
    /// Returns error if `time` is outside the log's span or the file cannot
    /// be replayed up to it
    pub fn at_time(log: &OperationLog, range: Range<usize>, time: Timestamp) -> Result<Self, SliceError> {
        let index = log.find_by_time(time).ok_or_else(|| SliceError::NotInSpan {
            file: log.file_path().to_string(),
            time,
        })?;
        let mut snippet = Self::at_index(log, range, index)?;
        snippet.time = time;
        Ok(snippet)
    }

    /// Char range
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether the range covers no text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Set of snippets a slice starts from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Criterion {
    /// Snippets, in any order
    pub snippets: Vec<Snippet>,
}

impl Criterion {
    /// Create an empty criterion
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snippet
    #[must_use]
    pub fn with_snippet(mut self, snippet: Snippet) -> Self {
        self.snippets.push(snippet);
        self
    }

    /// Whether there is nothing to slice from
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snippets.iter().all(Snippet::is_empty)
    }
}

impl From<Snippet> for Criterion {
    fn from(snippet: Snippet) -> Self {
        Self::new().with_snippet(snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palimpsest_log::{FileAction, OperationRecord as R};
    use palimpsest_replay::ReplayError;

    fn log() -> OperationLog {
        OperationLog::new(
            "f.rs",
            vec![
                R::file(0, 10, "f.rs", FileAction::Open, "ab"),
                R::edit(1, 20, "f.rs", 1, "X", ""),
                R::edit(2, 20, "f.rs", 0, "", "a"),
                R::edit(3, 40, "f.rs", 0, "!", ""),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_at_index_reads_text_and_time() {
        let log = log();
        let snippet = Snippet::at_index(&log, 0..2, 1).unwrap();
        assert_eq!(snippet.file, "f.rs");
        assert_eq!(snippet.text, "aX");
        assert_eq!(snippet.time, Timestamp::from_millis(20));

        let snippet = Snippet::at_index(&log, 1..10, 3).unwrap();
        assert_eq!(snippet.text, "Xb");
        assert_eq!(snippet.range(), 1..10);

        let err = Snippet::at_index(&log, 0..1, 9).unwrap_err();
        assert!(matches!(
            err,
            SliceError::Replay(ReplayError::IndexOutOfBounds { index: 9, .. })
        ));
    }

    #[test]
    fn test_at_time_keeps_requested_time() {
        let log = log();

        let snippet = Snippet::at_time(&log, 0..1, Timestamp::from_millis(20)).unwrap();
        assert_eq!(snippet.snapshot_index, 1);
        assert_eq!(snippet.time, Timestamp::from_millis(20));
        assert_eq!(snippet.text, "a");

        let snippet = Snippet::at_time(&log, 0..1, Timestamp::from_millis(39)).unwrap();
        assert_eq!(snippet.snapshot_index, 2);
        assert_eq!(snippet.time, Timestamp::from_millis(39));
        assert_eq!(snippet.text, "X");

        let err = Snippet::at_time(&log, 0..1, Timestamp::from_millis(5)).unwrap_err();
        assert!(matches!(err, SliceError::NotInSpan { .. }));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        #[allow(clippy::reversed_empty_ranges)]
        let snippet = Snippet::at_index(&log(), 5..2, 0).unwrap();
        assert!(snippet.is_empty());
        assert_eq!(snippet.range(), 5..5);
        assert_eq!(snippet.text, "");
        assert!(Criterion::from(snippet).is_empty());
        assert!(Criterion::new().is_empty());
    }
}
