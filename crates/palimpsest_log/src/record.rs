//! Operation records - one normalized edit event each.
//!
//! Offsets and lengths are counted in chars (Unicode scalar values), and
//! every offset is relative to the file content at the moment the record
//! was taken.

use palimpsest_core::{OperationId, Timestamp};
use serde::{Deserialize, Serialize};

/// Why an edit happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    /// Typed by the author
    #[default]
    Typing,
    /// Cut to the clipboard
    Cut,
    /// Pasted from the clipboard
    Paste,
    /// Undo
    Undo,
    /// Redo
    Redo,
    /// Formatter output
    Format,
    /// Refactoring tool output
    Refactor,
    /// Synthesized by log healing
    Heal,
    /// Anything else the recorder knew about
    Other,
}

/// File lifecycle action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    /// File created
    New,
    /// File opened in an editor
    Open,
    /// File closed
    Close,
    /// File deleted
    Delete,
}

/// Combined insert/delete payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPayload {
    /// Why the edit happened
    #[serde(default)]
    pub action: EditAction,
    /// Char offset of the edit
    pub start: usize,
    /// Text inserted at `start`
    #[serde(default)]
    pub inserted: String,
    /// Text removed at `start`
    #[serde(default)]
    pub deleted: String,
}

impl EditPayload {
    /// Inserted length in chars
    #[must_use]
    pub fn inserted_len(&self) -> usize {
        self.inserted.chars().count()
    }

    /// Deleted length in chars
    #[must_use]
    pub fn deleted_len(&self) -> usize {
        self.deleted.chars().count()
    }

    /// Edit with nothing inserted and nothing deleted
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty()
    }
}

/// Record kind with its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    /// Insert and/or delete
    Edit(EditPayload),
    /// Copy to the clipboard
    Copy {
        /// Char offset of the copied span
        start: usize,
        /// Copied text
        copied: String,
    },
    /// File lifecycle event with the full file text at that moment
    File {
        /// Lifecycle action
        action: FileAction,
        /// Full text snapshot
        code: String,
    },
    /// Version control commit with the full file text
    Commit {
        /// Commit message
        #[serde(default)]
        message: Option<String>,
        /// Full text snapshot
        code: String,
    },
    /// Recorded but ignored by replay and graph construction
    Other {
        /// Recorder label
        #[serde(default)]
        label: String,
    },
}

/// A single recorded operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Recorder-assigned id
    pub id: OperationId,
    /// Tie breaker for records sharing a timestamp
    pub sequence: u64,
    /// When the operation happened
    pub time: Timestamp,
    /// File the operation applies to
    pub file_path: String,
    /// Who performed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// What happened
    #[serde(flatten)]
    pub kind: OperationKind,
}

impl OperationRecord {
    /// Create a record with the given kind
    pub fn new(
        id: OperationId,
        sequence: u64,
        time: Timestamp,
        file_path: impl Into<String>,
        kind: OperationKind,
    ) -> Self {
        Self {
            id,
            sequence,
            time,
            file_path: file_path.into(),
            author: None,
            kind,
        }
    }

    /// Shorthand for an edit record
    pub fn edit(
        id: u64,
        time: u64,
        file_path: impl Into<String>,
        start: usize,
        inserted: impl Into<String>,
        deleted: impl Into<String>,
    ) -> Self {
        Self::new(
            OperationId::from_raw(id),
            id,
            Timestamp::from_millis(time),
            file_path,
            OperationKind::Edit(EditPayload {
                action: EditAction::Typing,
                start,
                inserted: inserted.into(),
                deleted: deleted.into(),
            }),
        )
    }

    /// Shorthand for a file lifecycle record
    pub fn file(
        id: u64,
        time: u64,
        file_path: impl Into<String>,
        action: FileAction,
        code: impl Into<String>,
    ) -> Self {
        Self::new(
            OperationId::from_raw(id),
            id,
            Timestamp::from_millis(time),
            file_path,
            OperationKind::File {
                action,
                code: code.into(),
            },
        )
    }

    /// Shorthand for a copy record
    pub fn copy(
        id: u64,
        time: u64,
        file_path: impl Into<String>,
        start: usize,
        copied: impl Into<String>,
    ) -> Self {
        Self::new(
            OperationId::from_raw(id),
            id,
            Timestamp::from_millis(time),
            file_path,
            OperationKind::Copy {
                start,
                copied: copied.into(),
            },
        )
    }

    /// Set the author
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the edit action, if this is an edit
    #[must_use]
    pub fn with_action(mut self, action: EditAction) -> Self {
        if let OperationKind::Edit(edit) = &mut self.kind {
            edit.action = action;
        }
        self
    }

    /// Set the sequence number
    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Ordering key inside a log
    #[must_use]
    pub fn order_key(&self) -> (Timestamp, u64) {
        (self.time, self.sequence)
    }

    /// Edit payload, if any
    #[must_use]
    pub fn as_edit(&self) -> Option<&EditPayload> {
        match &self.kind {
            OperationKind::Edit(edit) => Some(edit),
            _ => None,
        }
    }

    /// Full text snapshot carried by lifecycle and commit records
    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::File { code, .. } | OperationKind::Commit { code, .. } => Some(code),
            _ => None,
        }
    }

    /// File lifecycle action, if any
    #[must_use]
    pub fn file_action(&self) -> Option<FileAction> {
        match &self.kind {
            OperationKind::File { action, .. } => Some(*action),
            _ => None,
        }
    }

    /// Whether the record carries an authoritative snapshot
    #[must_use]
    pub fn is_restoration_point(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Text put on the clipboard by a cut or copy
    #[must_use]
    pub fn clipboard_text(&self) -> Option<&str> {
        match &self.kind {
            OperationKind::Edit(edit) if edit.action == EditAction::Cut => Some(&edit.deleted),
            OperationKind::Copy { copied, .. } => Some(copied),
            _ => None,
        }
    }

    /// Whether this is a paste
    #[must_use]
    pub fn is_paste(&self) -> bool {
        matches!(&self.kind, OperationKind::Edit(edit) if edit.action == EditAction::Paste)
    }

    /// Short kind label for display
    #[must_use]
    pub fn label(&self) -> &'static str {
        match &self.kind {
            OperationKind::Edit(edit) => match (edit.inserted.is_empty(), edit.deleted.is_empty()) {
                (false, true) => "insert",
                (true, false) => "delete",
                _ => "replace",
            },
            OperationKind::Copy { .. } => "copy",
            OperationKind::File { action, .. } => match action {
                FileAction::New => "new",
                FileAction::Open => "open",
                FileAction::Close => "close",
                FileAction::Delete => "file-delete",
            },
            OperationKind::Commit { .. } => "commit",
            OperationKind::Other { .. } => "other",
        }
    }
}
