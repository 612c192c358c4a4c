//! Text patch engine - applies or reverts one record against a buffer.
//!
//! Offsets are char offsets. Before splicing, the text the record claims to
//! remove is checked against the buffer; a disagreement is reported and the
//! buffer is left untouched.

use palimpsest_log::OperationRecord;

/// Patch direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Apply the record
    Forward,
    /// Revert the record
    Backward,
}

/// Patch failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Buffer text at the offset differs from the record
    #[error("mismatch at {position}: expected {expected:?}, found {actual:?}")]
    Mismatch {
        /// Char offset of the check
        position: usize,
        /// Text the record expects
        expected: String,
        /// Text in the buffer
        actual: String,
    },

    /// Offsets run past the end of the buffer
    #[error("span {start}..{end} is outside a buffer of {buffer_len} chars")]
    OutOfRange {
        /// Start of the span
        start: usize,
        /// End of the span
        end: usize,
        /// Buffer length in chars
        buffer_len: usize,
    },
}

/// Byte index of the char at `char_index`, or the buffer end when
/// `char_index` equals the char count
fn byte_index(text: &str, char_index: usize) -> Option<usize> {
    text.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .nth(char_index)
}

/// Replace `expected` at char offset `start` with `replacement`
fn splice(
    content: &mut String,
    start: usize,
    expected: &str,
    replacement: &str,
) -> Result<(), PatchError> {
    let expected_len = expected.chars().count();
    let out_of_range = || PatchError::OutOfRange {
        start,
        end: start + expected_len,
        buffer_len: content.chars().count(),
    };

    let begin = byte_index(content, start).ok_or_else(out_of_range)?;
    let end = byte_index(&content[begin..], expected_len)
        .map(|b| begin + b)
        .ok_or_else(out_of_range)?;

    let actual = &content[begin..end];
    if actual != expected {
        return Err(PatchError::Mismatch {
            position: start,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }

    content.replace_range(begin..end, replacement);
    Ok(())
}

/// Apply a record to the buffer
///
/// Records without an edit payload leave the buffer unchanged.
///
/// # Errors
///
/// Returns error if the deleted text is not found at the record's offset
pub fn apply_forward(content: &mut String, rec: &OperationRecord) -> Result<(), PatchError> {
    match rec.as_edit() {
        Some(edit) => splice(content, edit.start, &edit.deleted, &edit.inserted),
        None => Ok(()),
    }
}

/// Revert a record from the buffer
///
/// Records without an edit payload leave the buffer unchanged.
///
/// # Errors
///
/// Returns error if the inserted text is not found at the record's offset
pub fn apply_backward(content: &mut String, rec: &OperationRecord) -> Result<(), PatchError> {
    match rec.as_edit() {
        Some(edit) => splice(content, edit.start, &edit.inserted, &edit.deleted),
        None => Ok(()),
    }
}

/// Apply or revert depending on `direction`
///
/// # Errors
///
/// Returns error if the buffer does not match the record
pub fn apply(
    content: &mut String,
    rec: &OperationRecord,
    direction: Direction,
) -> Result<(), PatchError> {
    match direction {
        Direction::Forward => apply_forward(content, rec),
        Direction::Backward => apply_backward(content, rec),
    }
}
