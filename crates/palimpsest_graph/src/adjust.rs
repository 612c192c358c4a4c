//! Offset adjustment.
//!
//! A working set holds positions recorded at some point of a file's history.
//! Walking back through earlier nodes, each node is first tested against
//! the set, then its effect is folded out of the remaining positions so the
//! set is expressed in the frame that existed before it.
//!
//! Nodes are never mutated; adjusted positions live only in the set.

use crate::node::{Node, NodeKind};

/// How positions are compared, set by the node being tested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// A single insertion point (Add/Open)
    Point,
    /// A span of existing text (Remove/Copy, slicing criteria)
    Span,
}

impl From<NodeKind> for Probe {
    fn from(kind: NodeKind) -> Self {
        if kind.produces() { Probe::Point } else { Probe::Span }
    }
}

/// Positions still looking for the node that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingSet {
    probe: Probe,
    positions: Vec<usize>,
}

impl WorkingSet {
    /// Starting set of a node: its offset for Add/Open, its span otherwise
    #[must_use]
    pub fn for_node(node: &Node) -> Self {
        let probe = Probe::from(node.kind);
        let positions = match probe {
            Probe::Point => vec![node.offset],
            Probe::Span => (node.offset..node.end()).collect(),
        };
        Self { probe, positions }
    }

    /// Span set covering `[start, end)`
    #[must_use]
    pub fn for_range(start: usize, end: usize) -> Self {
        Self {
            probe: Probe::Span,
            positions: (start..end).collect(),
        }
    }

    /// Comparison mode
    #[must_use]
    pub const fn probe(&self) -> Probe {
        self.probe
    }

    /// Remaining positions
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Whether every position has been accounted for
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Test whether the set depends on `earlier`, consuming the positions
    /// that `earlier` accounts for
    ///
    /// The set must be in the frame right after `earlier` executed.
    pub fn depends_on(&mut self, earlier: &Node) -> bool {
        let (lo, hi) = (earlier.offset, earlier.end());
        match (self.probe, earlier.kind) {
            (Probe::Point, NodeKind::Add | NodeKind::Open) => {
                let before = self.positions.len();
                self.positions.retain(|&x| !(lo < x && x < hi));
                self.positions.len() != before
            }
            (Probe::Point, NodeKind::Remove) => self.positions.iter().any(|&x| lo < x && x < hi),
            (Probe::Span, NodeKind::Add | NodeKind::Open) => {
                let before = self.positions.len();
                self.positions.retain(|&x| !(lo <= x && x < hi));
                self.positions.len() != before
            }
            (Probe::Point, NodeKind::Copy) | (Probe::Span, NodeKind::Remove | NodeKind::Copy) => {
                false
            }
        }
    }

    /// Re-express the set in the frame before `earlier` executed
    pub fn fold(&mut self, earlier: &Node) {
        let shift = earlier.adjusted_length();
        if shift == 0 {
            return;
        }
        let offset = earlier.offset;
        let strict = self.probe == Probe::Point;
        for x in &mut self.positions {
            let after = if strict { *x > offset } else { *x >= offset };
            if after {
                *x = x.saturating_add_signed(shift);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palimpsest_core::{Gid, OperationId, Timestamp};

    fn node(kind: NodeKind, offset: usize, length: usize) -> Node {
        Node {
            gid: Gid::ZERO,
            kind,
            record_id: OperationId::from_raw(0),
            record_index: 0,
            time: Timestamp::zero(),
            offset,
            length,
            text: "x".repeat(length),
        }
    }

    fn point(x: usize) -> WorkingSet {
        WorkingSet::for_node(&node(NodeKind::Add, x, 1))
    }

    #[test]
    fn test_initial_sets() {
        let add = WorkingSet::for_node(&node(NodeKind::Add, 3, 4));
        assert_eq!(add.positions(), &[3]);
        assert_eq!(add.probe(), Probe::Point);

        let remove = WorkingSet::for_node(&node(NodeKind::Remove, 3, 2));
        assert_eq!(remove.positions(), &[3, 4]);
        assert_eq!(remove.probe(), Probe::Span);

        assert_eq!(WorkingSet::for_range(2, 2).positions(), &[] as &[usize]);
    }

    #[test]
    fn test_point_on_add_is_strict_both_ends() {
        let earlier = node(NodeKind::Add, 2, 3);
        assert!(!point(2).depends_on(&earlier));
        assert!(point(3).depends_on(&earlier));
        assert!(point(4).depends_on(&earlier));
        assert!(!point(5).depends_on(&earlier));
    }

    #[test]
    fn test_point_on_add_consumes() {
        let mut set = point(3);
        assert!(set.depends_on(&node(NodeKind::Open, 0, 10)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_point_on_remove_does_not_consume() {
        let earlier = node(NodeKind::Remove, 2, 3);
        assert!(!point(2).depends_on(&earlier));
        assert!(!point(5).depends_on(&earlier));

        let mut set = point(3);
        assert!(set.depends_on(&earlier));
        assert_eq!(set.positions(), &[3]);
    }

    #[test]
    fn test_span_on_add_is_half_open() {
        let earlier = node(NodeKind::Add, 2, 3);
        let mut set = WorkingSet::for_range(1, 7);
        assert!(set.depends_on(&earlier));
        assert_eq!(set.positions(), &[1, 5, 6]);

        assert!(!WorkingSet::for_range(5, 6).depends_on(&earlier));
        assert!(WorkingSet::for_range(4, 5).depends_on(&earlier));
        assert!(!WorkingSet::for_range(0, 2).depends_on(&earlier));
    }

    #[test]
    fn test_nothing_depends_on_copy() {
        let earlier = node(NodeKind::Copy, 0, 10);
        assert!(!point(5).depends_on(&earlier));
        assert!(!WorkingSet::for_range(0, 10).depends_on(&earlier));
    }

    #[test]
    fn test_span_never_depends_on_remove() {
        assert!(!WorkingSet::for_range(0, 10).depends_on(&node(NodeKind::Remove, 2, 3)));
    }

    #[test]
    fn test_fold_point_is_strict() {
        let earlier = node(NodeKind::Add, 4, 2);
        let mut at = point(4);
        at.fold(&earlier);
        assert_eq!(at.positions(), &[4]);

        let mut after = point(7);
        after.fold(&earlier);
        assert_eq!(after.positions(), &[5]);
    }

    #[test]
    fn test_fold_span_is_non_strict() {
        let mut set = WorkingSet::for_range(3, 6);
        set.fold(&node(NodeKind::Remove, 4, 2));
        assert_eq!(set.positions(), &[3, 6, 7]);

        let mut set = WorkingSet::for_range(4, 5);
        set.fold(&node(NodeKind::Add, 4, 0));
        assert_eq!(set.positions(), &[4]);

        let mut set = WorkingSet::for_range(8, 9);
        set.fold(&node(NodeKind::Open, 0, 3));
        assert_eq!(set.positions(), &[5]);
    }

    #[test]
    fn test_fold_through_copy_is_identity() {
        let mut set = WorkingSet::for_range(0, 4);
        set.fold(&node(NodeKind::Copy, 0, 4));
        assert_eq!(set.positions(), &[0, 1, 2, 3]);
    }
}
