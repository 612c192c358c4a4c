//! The per-file operation log and its restoration points.
//!
//! A log is built once per file load and never mutated afterwards; reloads
//! and healing produce a new log. Queries are pure and can run from several
//! threads at once.

use crate::record::OperationRecord;
use palimpsest_core::{ContentHash, CoreError, OperationId, Timestamp};
use serde::{Deserialize, Serialize};

/// Log construction and decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// Record order violates `(time, sequence)`
    #[error("record {position} is out of (time, sequence) order")]
    Unordered {
        /// Index of the first offending record
        position: usize,
    },

    /// A record belongs to another file
    #[error("record {position} belongs to {found}, log is for {expected}")]
    MixedFiles {
        /// Path of the log
        expected: String,
        /// Path on the record
        found: String,
        /// Index of the record
        position: usize,
    },

    /// A JSON Lines record could not be decoded
    #[error("line {line}: {reason}")]
    Decode {
        /// 1-based line number
        line: usize,
        /// Decoder message
        reason: String,
    },

    /// Underlying reader or writer failed
    #[error("io error: {0}")]
    Io(String),
}

impl From<LogError> for CoreError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Unordered { position } => CoreError::Unordered { position },
            LogError::Decode { .. } | LogError::Io(_) => CoreError::InvalidEncoding {
                reason: err.to_string(),
            },
            LogError::MixedFiles { .. } => CoreError::Validation {
                field: "file_path".to_string(),
                reason: err.to_string(),
            },
        }
    }
}

/// A log index with an authoritative full-text snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationPoint {
    /// Index of the record in the log
    pub index: usize,
    /// Time of the record
    pub time: Timestamp,
    /// Digest of the snapshot
    pub digest: ContentHash,
}

/// Ordered records of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLog {
    file_path: String,
    records: Vec<OperationRecord>,
    points: Vec<RestorationPoint>,
}

impl OperationLog {
    /// Build a log, validating order and computing restoration points
    ///
    /// # Errors
    ///
    /// Returns error if records are out of order or span several files
    pub fn new(
        file_path: impl Into<String>,
        records: Vec<OperationRecord>,
    ) -> Result<Self, LogError> {
        let file_path = file_path.into();

        for (position, rec) in records.iter().enumerate() {
            if rec.file_path != file_path {
                return Err(LogError::MixedFiles {
                    expected: file_path,
                    found: rec.file_path.clone(),
                    position,
                });
            }
        }

        if let Some(position) = records
            .windows(2)
            .position(|w| w[1].order_key() < w[0].order_key())
        {
            return Err(LogError::Unordered {
                position: position + 1,
            });
        }

        let points = records
            .iter()
            .enumerate()
            .filter_map(|(index, rec)| {
                rec.snapshot().map(|code| RestorationPoint {
                    index,
                    time: rec.time,
                    digest: ContentHash::of_text(code),
                })
            })
            .collect();

        Ok(Self {
            file_path,
            records,
            points,
        })
    }

    /// Path of the file this log describes
    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// All records in order
    #[must_use]
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Record at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&OperationRecord> {
        self.records.get(index)
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log has no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the log, returning its records
    #[must_use]
    pub fn into_records(self) -> Vec<OperationRecord> {
        self.records
    }

    /// All restoration points, in index order
    #[must_use]
    pub fn restoration_points(&self) -> &[RestorationPoint] {
        &self.points
    }

    /// Number of restoration points
    #[must_use]
    pub fn restoration_point_count(&self) -> usize {
        self.points.len()
    }

    /// Nearest restoration point at or before `index`
    #[must_use]
    pub fn nearest_restoration_point(&self, index: usize) -> Option<&RestorationPoint> {
        let after = self.points.partition_point(|p| p.index <= index);
        after.checked_sub(1).map(|i| &self.points[i])
    }

    /// Restoration points with `from < index <= to`
    #[must_use]
    pub fn restoration_points_between(&self, from: usize, to: usize) -> &[RestorationPoint] {
        let lo = self.points.partition_point(|p| p.index <= from);
        let hi = self.points.partition_point(|p| p.index <= to);
        &self.points[lo..hi.max(lo)]
    }

    /// Snapshot text of a restoration point
    #[must_use]
    pub fn snapshot_of(&self, point: &RestorationPoint) -> Option<&str> {
        self.records.get(point.index).and_then(OperationRecord::snapshot)
    }

    /// Index of the record visible at `time`
    ///
    /// Returns the first record stamped exactly `time` when there is one
    /// (records sharing a timestamp are ordered by sequence), otherwise the
    /// last record before `time`. Returns `None` outside the log's span.
    #[must_use]
    pub fn find_by_time(&self, time: Timestamp) -> Option<usize> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        if time < first.time || time > last.time {
            return None;
        }

        let at_or_after = self.records.partition_point(|r| r.time < time);
        match self.records.get(at_or_after) {
            Some(rec) if rec.time == time => Some(at_or_after),
            _ => at_or_after.checked_sub(1),
        }
    }

    /// Index of the record with the given id
    #[must_use]
    pub fn find_by_id(&self, id: OperationId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// First and last timestamps
    #[must_use]
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.records.first()?.time, self.records.last()?.time))
    }

    /// Largest record id, if any
    #[must_use]
    pub fn max_id(&self) -> Option<OperationId> {
        self.records.iter().map(|r| r.id).max()
    }

    /// Distinct authors in order of first appearance
    #[must_use]
    pub fn authors(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for author in self.records.iter().filter_map(|r| r.author.as_deref()) {
            if !seen.contains(&author) {
                seen.push(author);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FileAction, OperationRecord as R};
    use proptest::prelude::*;

    fn sample_log() -> OperationLog {
        OperationLog::new(
            "a.rs",
            vec![
                R::file(1, 10, "a.rs", FileAction::Open, "ab"),
                R::edit(2, 20, "a.rs", 1, "X", ""),
                R::edit(3, 20, "a.rs", 0, "", "a").with_author("kim"),
                R::file(4, 30, "a.rs", FileAction::Close, "Xb"),
                R::edit(5, 40, "a.rs", 2, "!", "").with_author("lee"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_restoration_points() {
        let log = sample_log();
        assert_eq!(log.restoration_point_count(), 2);
        let indices: Vec<usize> = log.restoration_points().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 3]);
        assert_eq!(log.snapshot_of(&log.restoration_points()[1]), Some("Xb"));
        assert!(log.restoration_points()[0].digest.verify("ab"));
    }

    #[test]
    fn test_nearest_restoration_point() {
        let log = sample_log();
        assert_eq!(log.nearest_restoration_point(0).map(|p| p.index), Some(0));
        assert_eq!(log.nearest_restoration_point(2).map(|p| p.index), Some(0));
        assert_eq!(log.nearest_restoration_point(3).map(|p| p.index), Some(3));
        assert_eq!(log.nearest_restoration_point(4).map(|p| p.index), Some(3));
    }

    #[test]
    fn test_no_restoration_point_before_first_checkpoint() {
        let log = OperationLog::new(
            "a.rs",
            vec![
                R::edit(1, 1, "a.rs", 0, "x", ""),
                R::file(2, 2, "a.rs", FileAction::Close, "x"),
            ],
        )
        .unwrap();
        assert!(log.nearest_restoration_point(0).is_none());
        assert_eq!(log.nearest_restoration_point(1).map(|p| p.index), Some(1));
    }

    #[test]
    fn test_restoration_points_between() {
        let log = sample_log();
        assert_eq!(log.restoration_points_between(0, 4).len(), 1);
        assert_eq!(log.restoration_points_between(0, 2).len(), 0);
        assert_eq!(log.restoration_points_between(4, 1).len(), 0);
    }

    #[test]
    fn test_find_by_time() {
        let log = sample_log();
        assert_eq!(log.find_by_time(Timestamp::from_millis(5)), None);
        assert_eq!(log.find_by_time(Timestamp::from_millis(10)), Some(0));
        assert_eq!(log.find_by_time(Timestamp::from_millis(15)), Some(0));
        // first of the two records at t=20
        assert_eq!(log.find_by_time(Timestamp::from_millis(20)), Some(1));
        assert_eq!(log.find_by_time(Timestamp::from_millis(35)), Some(3));
        assert_eq!(log.find_by_time(Timestamp::from_millis(40)), Some(4));
        assert_eq!(log.find_by_time(Timestamp::from_millis(41)), None);
    }

    #[test]
    fn test_find_by_time_empty() {
        let log = OperationLog::new("a.rs", Vec::new()).unwrap();
        assert_eq!(log.find_by_time(Timestamp::zero()), None);
        assert!(log.time_span().is_none());
    }

    #[test]
    fn test_unordered_rejected() {
        let err = OperationLog::new(
            "a.rs",
            vec![
                R::edit(1, 20, "a.rs", 0, "x", ""),
                R::edit(2, 10, "a.rs", 0, "y", ""),
            ],
        )
        .unwrap_err();
        assert_eq!(err, LogError::Unordered { position: 1 });
    }

    #[test]
    fn test_same_time_lower_sequence_rejected() {
        let err = OperationLog::new(
            "a.rs",
            vec![
                R::edit(1, 20, "a.rs", 0, "x", "").with_sequence(5),
                R::edit(2, 20, "a.rs", 0, "y", "").with_sequence(4),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, LogError::Unordered { position: 1 }));
    }

    #[test]
    fn test_mixed_files_rejected() {
        let err = OperationLog::new("a.rs", vec![R::edit(1, 1, "b.rs", 0, "x", "")]).unwrap_err();
        assert!(matches!(err, LogError::MixedFiles { position: 0, .. }));
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Validation { .. }));
    }

    #[test]
    fn test_lookup_helpers() {
        let log = sample_log();
        assert_eq!(log.find_by_id(OperationId::from_raw(4)), Some(3));
        assert_eq!(log.find_by_id(OperationId::from_raw(99)), None);
        assert_eq!(log.max_id(), Some(OperationId::from_raw(5)));
        assert_eq!(log.authors(), vec!["kim", "lee"]);
        assert_eq!(
            log.time_span(),
            Some((Timestamp::from_millis(10), Timestamp::from_millis(40)))
        );
    }

    fn find_linear(log: &OperationLog, time: Timestamp) -> Option<usize> {
        let records = log.records();
        if records.is_empty() || time < records[0].time || time > records[records.len() - 1].time {
            return None;
        }
        if let Some(i) = records.iter().position(|r| r.time == time) {
            return Some(i);
        }
        records.iter().rposition(|r| r.time < time)
    }

    proptest! {
        #[test]
        fn prop_find_by_time_matches_linear_scan(
            gaps in proptest::collection::vec(0u64..4, 0..40),
            probe in 0u64..200,
        ) {
            let mut time = 50;
            let records: Vec<R> = gaps
                .iter()
                .enumerate()
                .map(|(i, gap)| {
                    time += gap;
                    R::edit(i as u64, time, "a.rs", 0, "x", "")
                })
                .collect();
            let log = OperationLog::new("a.rs", records).unwrap();
            let t = Timestamp::from_millis(probe);
            prop_assert_eq!(log.find_by_time(t), find_linear(&log, t));
        }
    }
}
