//! Graph nodes.
//!
//! Every record is split into the text effects it had on its file: a span
//! removed, a span added, a span copied, or a whole snapshot opened.

use palimpsest_core::{Gid, OperationId, Timestamp};
use palimpsest_log::{FileAction, OperationKind, OperationRecord};
use serde::{Deserialize, Serialize};

/// Node kind - the text effect a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Text inserted by an edit
    Add,
    /// Text deleted by an edit
    Remove,
    /// Text copied to the clipboard
    Copy,
    /// Whole snapshot loaded by a file being created or opened
    Open,
}

impl NodeKind {
    /// Whether the node puts text into the file
    #[must_use]
    pub const fn produces(self) -> bool {
        matches!(self, Self::Add | Self::Open)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Copy => "copy",
            Self::Open => "open",
        };
        f.write_str(name)
    }
}

/// A node in a file graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Position in the file graph
    pub gid: Gid,
    /// Node kind
    pub kind: NodeKind,
    /// Id of the record the node came from
    pub record_id: OperationId,
    /// Index of that record in its log
    pub record_index: usize,
    /// Time of that record
    pub time: Timestamp,
    /// Char offset of the span
    pub offset: usize,
    /// Span length in chars
    pub length: usize,
    /// Span text
    pub text: String,
}

impl Node {
    /// End of the span, exclusive
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Shift that undoes this node's effect on later positions
    #[must_use]
    pub fn adjusted_length(&self) -> isize {
        let length = isize::try_from(self.length).unwrap_or(isize::MAX);
        match self.kind {
            NodeKind::Remove => length,
            NodeKind::Add | NodeKind::Open => -length,
            NodeKind::Copy => 0,
        }
    }
}

/// Split a record into nodes, numbering them from `next_gid`
///
/// Order is Remove, Add, Copy; a created or opened file gives one Open.
/// Empty spans give no node.
#[must_use]
pub fn nodes_for_record(rec: &OperationRecord, record_index: usize, next_gid: Gid) -> Vec<Node> {
    let mut spans: Vec<(NodeKind, usize, &str)> = Vec::with_capacity(2);
    match &rec.kind {
        OperationKind::Edit(edit) => {
            spans.push((NodeKind::Remove, edit.start, edit.deleted.as_str()));
            spans.push((NodeKind::Add, edit.start, edit.inserted.as_str()));
        }
        OperationKind::Copy { start, copied } => spans.push((NodeKind::Copy, *start, copied.as_str())),
        OperationKind::File {
            action: FileAction::New | FileAction::Open,
            code,
        } => spans.push((NodeKind::Open, 0, code.as_str())),
        OperationKind::File { .. } | OperationKind::Commit { .. } | OperationKind::Other { .. } => {}
    }

    spans
        .into_iter()
        .filter(|(_, _, text)| !text.is_empty())
        .enumerate()
        .map(|(i, (kind, offset, text))| Node {
            gid: Gid::from_index(next_gid.index() + i),
            kind,
            record_id: rec.id,
            record_index,
            time: rec.time,
            offset,
            length: text.chars().count(),
            text: text.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use palimpsest_log::OperationRecord as R;

    #[test]
    fn test_replace_gives_remove_then_add() {
        let nodes = nodes_for_record(&R::edit(7, 1, "f", 2, "日本", "abc"), 3, Gid::from_index(5));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind, NodeKind::Remove);
        assert_eq!(nodes[0].gid, Gid::from_index(5));
        assert_eq!(nodes[0].length, 3);
        assert_eq!(nodes[1].kind, NodeKind::Add);
        assert_eq!(nodes[1].gid, Gid::from_index(6));
        assert_eq!(nodes[1].length, 2);
        assert_eq!(nodes[1].end(), 4);
        assert!(nodes.iter().all(|n| n.record_index == 3));
        assert!(nodes.iter().all(|n| n.record_id == OperationId::from_raw(7)));
    }

    #[test]
    fn test_empty_spans_give_no_node() {
        let insert = nodes_for_record(&R::edit(1, 1, "f", 0, "x", ""), 0, Gid::ZERO);
        assert_eq!(insert.len(), 1);
        assert_eq!(insert[0].kind, NodeKind::Add);
        assert_eq!(insert[0].gid, Gid::ZERO);

        assert!(nodes_for_record(&R::edit(1, 1, "f", 0, "", ""), 0, Gid::ZERO).is_empty());
        assert!(nodes_for_record(&R::file(1, 1, "f", FileAction::Open, ""), 0, Gid::ZERO).is_empty());
    }

    #[test]
    fn test_lifecycle_nodes() {
        let open = nodes_for_record(&R::file(1, 1, "f", FileAction::New, "abc"), 0, Gid::ZERO);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].kind, NodeKind::Open);
        assert_eq!((open[0].offset, open[0].length), (0, 3));

        assert!(nodes_for_record(&R::file(1, 1, "f", FileAction::Close, "abc"), 0, Gid::ZERO).is_empty());

        let copy = nodes_for_record(&R::copy(1, 1, "f", 4, "xy"), 0, Gid::ZERO);
        assert_eq!(copy[0].kind, NodeKind::Copy);
        assert_eq!(copy[0].offset, 4);
    }

    #[test]
    fn test_adjusted_length() {
        let mk = |kind| Node {
            gid: Gid::ZERO,
            kind,
            record_id: OperationId::from_raw(0),
            record_index: 0,
            time: Timestamp::zero(),
            offset: 0,
            length: 4,
            text: "abcd".to_string(),
        };
        assert_eq!(mk(NodeKind::Remove).adjusted_length(), 4);
        assert_eq!(mk(NodeKind::Add).adjusted_length(), -4);
        assert_eq!(mk(NodeKind::Open).adjusted_length(), -4);
        assert_eq!(mk(NodeKind::Copy).adjusted_length(), 0);
        assert!(NodeKind::Open.produces());
        assert!(!NodeKind::Remove.produces());
    }
}
