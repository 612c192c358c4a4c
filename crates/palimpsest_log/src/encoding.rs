//! JSON Lines encoding for operation records.
//!
//! One serde-encoded [`OperationRecord`] per line. Blank lines are skipped.

use crate::log::LogError;
use crate::record::OperationRecord;
use std::io::{BufRead, Write};

/// Decode every record from a reader
///
/// # Errors
///
/// Returns error on the first undecodable line or read failure
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<OperationRecord>, LogError> {
    RecordReader::new(reader).collect()
}

/// Encode records, one per line
///
/// # Errors
///
/// Returns error if encoding or writing fails
pub fn write_records<'a, W, I>(mut writer: W, records: I) -> Result<(), LogError>
where
    W: Write,
    I: IntoIterator<Item = &'a OperationRecord>,
{
    for rec in records {
        serde_json::to_writer(&mut writer, rec).map_err(|e| LogError::Io(e.to_string()))?;
        writer
            .write_all(b"\n")
            .map_err(|e| LogError::Io(e.to_string()))?;
    }
    writer.flush().map_err(|e| LogError::Io(e.to_string()))
}

/// Streaming record decoder
pub struct RecordReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> RecordReader<R> {
    /// Create a new reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Lines consumed so far
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<OperationRecord, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(LogError::Io(e.to_string()))),
            }

            let trimmed = self.buf.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Some(serde_json::from_str(trimmed).map_err(|e| LogError::Decode {
                line: self.line,
                reason: e.to_string(),
            }));
        }
    }
}
