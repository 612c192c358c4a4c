//! Log healing.
//!
//! When a file is closed and reopened with different text, the change
//! happened outside the recorder. Healing inserts synthetic edits between
//! the two records that turn the closed text into the reopened text, so
//! that replay through the gap agrees with both snapshots.

use palimpsest_core::{OperationId, Timestamp};
use palimpsest_log::{
    EditAction, EditPayload, FileAction, LogError, OperationKind, OperationLog, OperationRecord,
};
use similar::{Algorithm, DiffTag};
use tracing::{debug, info};

/// One bridged Close/Open gap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealedGap {
    /// Index of the Close in the input log
    pub close_index: usize,
    /// Index of the Open in the input log
    pub open_index: usize,
    /// Synthetic edits inserted before the Open
    pub inserted: usize,
}

/// What healing changed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealReport {
    /// Gaps that received synthetic edits
    pub gaps: Vec<HealedGap>,
}

impl HealReport {
    /// Total synthetic edits inserted
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.gaps.iter().map(|g| g.inserted).sum()
    }

    /// Whether the log was left unchanged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Char-level edits that turn `old` into `new`, in application order
fn diff_edits(old: &str, new: &str) -> Vec<EditPayload> {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    let collect = |chars: &[char], range: std::ops::Range<usize>| -> String {
        chars[range].iter().collect()
    };

    let mut edits = Vec::new();
    let mut pos = 0;
    for op in similar::capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (old_range, new_range) = (op.old_range(), op.new_range());
        let (inserted, deleted) = match op.tag() {
            DiffTag::Equal => {
                pos += old_range.len();
                continue;
            }
            DiffTag::Delete => (String::new(), collect(&old, old_range)),
            DiffTag::Insert => (collect(&new, new_range.clone()), String::new()),
            DiffTag::Replace => (collect(&new, new_range.clone()), collect(&old, old_range)),
        };
        edits.push(EditPayload {
            action: EditAction::Heal,
            start: pos,
            inserted,
            deleted,
        });
        pos += new_range.len();
    }
    edits
}

/// Index of the Open that follows the Close at `close`, skipping records
/// that carry no text
fn reopened_after(records: &[OperationRecord], close: usize) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .skip(close + 1)
        .find(|(_, rec)| !matches!(rec.kind, OperationKind::Other { .. }))
        .filter(|(_, rec)| rec.file_action() == Some(FileAction::Open))
        .map(|(index, _)| index)
}

/// Bridge every Close/Open pair whose texts disagree
///
/// Synthetic records get fresh ids above the log's largest id and share the
/// time and sequence of the record right before them, so the log stays
/// ordered.
///
/// # Errors
///
/// Returns error if the healed records cannot form a log
#[tracing::instrument(skip(log), fields(file = log.file_path()))]
pub fn heal(log: &OperationLog) -> Result<(OperationLog, HealReport), LogError> {
    let records = log.records();
    let mut next_id = log.max_id().map_or(OperationId::from_raw(0), |id| id.next());
    let mut report = HealReport::default();
    let mut healed = Vec::with_capacity(records.len());
    let mut pending: Option<(usize, Vec<EditPayload>)> = None;

    for (index, rec) in records.iter().enumerate() {
        if let Some((open_index, edits)) = pending.take_if(|(open, _)| *open == index) {
            let (time, sequence): (Timestamp, u64) = healed
                .last()
                .map_or((rec.time, rec.sequence), |prev: &OperationRecord| prev.order_key());
            for edit in edits {
                let mut synthetic = OperationRecord::new(
                    next_id,
                    sequence,
                    time,
                    log.file_path(),
                    OperationKind::Edit(edit),
                );
                synthetic.author.clone_from(&rec.author);
                healed.push(synthetic);
                next_id = next_id.next();
            }
            debug!(open_index, "bridged reopen gap");
        }

        healed.push(rec.clone());

        if rec.file_action() != Some(FileAction::Close) {
            continue;
        }
        let Some(open_index) = reopened_after(records, index) else {
            continue;
        };
        let (Some(closed), Some(opened)) = (rec.snapshot(), records[open_index].snapshot()) else {
            continue;
        };
        if closed == opened {
            continue;
        }

        let edits = diff_edits(closed, opened);
        report.gaps.push(HealedGap {
            close_index: index,
            open_index,
            inserted: edits.len(),
        });
        pending = Some((open_index, edits));
    }

    if !report.is_empty() {
        info!(
            gaps = report.gaps.len(),
            inserted = report.inserted(),
            "healed log"
        );
    }

    Ok((OperationLog::new(log.file_path(), healed)?, report))
}
