//! Replay engine for reconstructing historical file content.
//!
//! Content "at index `i`" is the file text right after record `i` executed.
//! Full restores start at the nearest restoration point; incremental
//! restores walk from a content the caller already has.

use crate::patch::{self, Direction, PatchError};
use palimpsest_core::{ContentHash, CoreError, OperationId, Timestamp};
use palimpsest_log::OperationLog;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Replay engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Heal Close/Open disagreements when a log is loaded
    pub heal_on_load: bool,
    /// Let incremental restores start from a checkpoint when it is closer
    pub prefer_nearest_checkpoint: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            heal_on_load: true,
            prefer_nearest_checkpoint: true,
        }
    }
}

/// Replay failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// A record did not match the reconstructed buffer
    #[error("record {index} ({id}) failed to {direction:?}-apply: {source}")]
    Patch {
        /// Index of the offending record
        index: usize,
        /// Id of the offending record
        id: OperationId,
        /// Direction of the failed patch
        direction: Direction,
        /// Patch failure
        #[source]
        source: PatchError,
    },

    /// No restoration point at or before the index
    #[error("no restoration point at or before index {index}")]
    NoRestorationPoint {
        /// Requested index
        index: usize,
    },

    /// Index beyond the end of the log
    #[error("index {index} is outside a log of {len} records")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Log length
        len: usize,
    },

    /// Timestamp outside the log's span
    #[error("no record visible at {time}")]
    NotInSpan {
        /// Requested time
        time: Timestamp,
    },
}

impl From<ReplayError> for CoreError {
    fn from(err: ReplayError) -> Self {
        CoreError::Replay {
            reason: err.to_string(),
        }
    }
}

/// A restoration point whose snapshot disagrees with replayed content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    /// Index of the restoration point
    pub index: usize,
    /// Digest of the stored snapshot
    pub expected: ContentHash,
    /// Digest of the replayed content
    pub actual: ContentHash,
}

/// Outcome of replaying a whole log
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyReport {
    /// Records replayed
    pub replayed: usize,
    /// Snapshots that disagree with replayed content
    pub divergences: Vec<Divergence>,
    /// Patch failures; replay resynchronizes at the next checkpoint
    pub failures: Vec<ReplayError>,
}

impl VerifyReport {
    /// Whether the log replayed cleanly
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.divergences.is_empty() && self.failures.is_empty()
    }
}

/// Replay engine over one log
#[derive(Debug, Clone)]
pub struct ReplayEngine<'a> {
    log: &'a OperationLog,
    config: ReplayConfig,
}

impl<'a> ReplayEngine<'a> {
    /// Create a new replay engine
    #[must_use]
    pub fn new(log: &'a OperationLog) -> Self {
        Self {
            log,
            config: ReplayConfig::default(),
        }
    }

    /// Create with custom config
    #[must_use]
    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// The log being replayed
    #[must_use]
    pub fn log(&self) -> &'a OperationLog {
        self.log
    }

    /// Number of restoration points in the log
    #[must_use]
    pub fn restoration_point_count(&self) -> usize {
        self.log.restoration_point_count()
    }

    fn check_index(&self, index: usize) -> Result<(), ReplayError> {
        if index >= self.log.len() {
            return Err(ReplayError::IndexOutOfBounds {
                index,
                len: self.log.len(),
            });
        }
        Ok(())
    }

    /// Content right after record `index`
    ///
    /// # Errors
    ///
    /// Returns error if there is no earlier checkpoint or a patch fails
    pub fn restore(&self, index: usize) -> Result<String, ReplayError> {
        self.check_index(index)?;

        let point = self
            .log
            .nearest_restoration_point(index)
            .ok_or(ReplayError::NoRestorationPoint { index })?;
        let snapshot = self
            .log
            .snapshot_of(point)
            .ok_or(ReplayError::NoRestorationPoint { index })?;

        let mut content = snapshot.to_string();
        if point.index == index {
            return Ok(content);
        }

        debug!(
            file = self.log.file_path(),
            from = point.index,
            to = index,
            "replaying from restoration point"
        );
        self.replay_forward(&mut content, point.index, index)?;
        Ok(content)
    }

    /// Content visible at `time`
    ///
    /// # Errors
    ///
    /// Returns error if `time` is outside the log or replay fails
    pub fn restore_at(&self, time: Timestamp) -> Result<String, ReplayError> {
        let index = self
            .log
            .find_by_time(time)
            .ok_or(ReplayError::NotInSpan { time })?;
        self.restore(index)
    }

    /// Content after record `index`, starting from content known to be the
    /// state after `known_index`
    ///
    /// # Errors
    ///
    /// Returns error if a patch fails on the way
    pub fn restore_from(
        &self,
        known: &str,
        known_index: usize,
        index: usize,
    ) -> Result<String, ReplayError> {
        self.check_index(index)?;
        self.check_index(known_index)?;

        if index == known_index {
            return Ok(known.to_string());
        }

        if self.config.prefer_nearest_checkpoint
            && let Some(point) = self.log.nearest_restoration_point(index)
            && index.abs_diff(point.index) < index.abs_diff(known_index)
        {
            debug!(checkpoint = point.index, index, "checkpoint closer than known content");
            return self.restore(index);
        }

        let mut content = known.to_string();
        if index > known_index {
            self.replay_forward(&mut content, known_index, index)?;
            return Ok(content);
        }

        // Reverting across a snapshot cannot recover the text before it
        if !self.log.restoration_points_between(index, known_index).is_empty() {
            debug!(index, known_index, "backward range crosses a checkpoint");
            return self.restore(index);
        }

        self.replay_backward(&mut content, index, known_index)?;
        Ok(content)
    }

    /// Apply records `(from, to]` to `content`
    fn replay_forward(&self, content: &mut String, from: usize, to: usize) -> Result<(), ReplayError> {
        for index in from + 1..=to {
            let rec = &self.log.records()[index];
            if let Some(code) = rec.snapshot() {
                content.clear();
                content.push_str(code);
                continue;
            }
            patch::apply_forward(content, rec)
                .map_err(|source| self.patch_failed(index, Direction::Forward, source))?;
        }
        Ok(())
    }

    /// Revert records `(from, to]` from `content`, newest first
    fn replay_backward(&self, content: &mut String, from: usize, to: usize) -> Result<(), ReplayError> {
        for index in (from + 1..=to).rev() {
            let rec = &self.log.records()[index];
            patch::apply_backward(content, rec)
                .map_err(|source| self.patch_failed(index, Direction::Backward, source))?;
        }
        Ok(())
    }

    fn patch_failed(&self, index: usize, direction: Direction, source: PatchError) -> ReplayError {
        let id = self.log.records()[index].id;
        match &source {
            PatchError::Mismatch {
                position,
                expected,
                actual,
            } => warn!(
                file = self.log.file_path(),
                index,
                %id,
                position,
                expected = expected.as_str(),
                actual = actual.as_str(),
                "patch mismatch"
            ),
            PatchError::OutOfRange { .. } => warn!(
                file = self.log.file_path(),
                index,
                %id,
                error = %source,
                "patch out of range"
            ),
        }
        ReplayError::Patch {
            index,
            id,
            direction,
            source,
        }
    }

    /// Replay the whole log, checking every snapshot against the replayed
    /// content
    #[tracing::instrument(skip(self), fields(file = self.log.file_path()))]
    pub fn verify(&self) -> VerifyReport {
        let mut report = VerifyReport::default();
        let mut content: Option<String> = None;

        for (index, rec) in self.log.records().iter().enumerate() {
            if let Some(code) = rec.snapshot() {
                if let Some(current) = &content
                    && current != code
                {
                    report.divergences.push(Divergence {
                        index,
                        expected: ContentHash::of_text(code),
                        actual: ContentHash::of_text(current),
                    });
                }
                content = Some(code.to_string());
                report.replayed += 1;
                continue;
            }

            let Some(current) = content.as_mut() else {
                continue;
            };
            match patch::apply_forward(current, rec) {
                Ok(()) => report.replayed += 1,
                Err(source) => {
                    report
                        .failures
                        .push(self.patch_failed(index, Direction::Forward, source));
                    content = None;
                }
            }
        }

        debug!(
            replayed = report.replayed,
            divergences = report.divergences.len(),
            failures = report.failures.len(),
            "verified log"
        );
        report
    }
}
