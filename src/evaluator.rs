//! Evaluators decide, from the winding numbers at some point, whether that point
//! belongs to the result.
//!
//! The edge processor walks every slab of the sweep from bottom to top, keeping
//! track of the winding number of every input tag in a [`Windings`]. Between
//! any two edges it asks the evaluator whether the region there is inside, and
//! turns every change of that answer into a result edge.

use std::collections::{BTreeMap, BTreeSet};

/// A fill rule tells us how to decide whether a point is "inside", given its winding number.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
    /// The point is "inside" if its winding number is positive.
    Positive,
    /// The point is "inside" if its winding number is negative.
    Negative,
}

impl FillRule {
    /// Is a point with this winding number inside?
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::EvenOdd => winding % 2 != 0,
            FillRule::NonZero => winding != 0,
            FillRule::Positive => winding > 0,
            FillRule::Negative => winding < 0,
        }
    }
}

/// Binary operations between two operands.
///
/// Edges with even tags belong to the first operand (`A`) and edges with odd tags
/// to the second one (`B`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    /// A point is in the intersection of two sets if it is in both.
    And,
    /// A point is in the union of two sets if it is in either one.
    Or,
    /// A point is in the exclusive-or of two sets if it is in one or the other, but not both.
    Xor,
    /// Points of `A` that are not in `B`.
    ANotB,
    /// Points of `B` that are not in `A`.
    BNotA,
}

impl BinaryOp {
    /// Combines the membership of a point in both operands.
    pub fn apply(self, a: bool, b: bool) -> bool {
        match self {
            BinaryOp::And => a && b,
            BinaryOp::Or => a || b,
            BinaryOp::Xor => a != b,
            BinaryOp::ANotB => a && !b,
            BinaryOp::BNotA => b && !a,
        }
    }
}

// Tags below this get a slot each; larger ones are kept in a map.
const DENSE_TAGS: u32 = 1 << 16;

/// The winding numbers of all tags at some point of the sweep.
///
/// Small tags are the fast path. Large tags work too, but each one costs a map
/// lookup.
#[derive(Clone, Debug, Default)]
pub struct Windings {
    counts: Vec<i32>,
    sparse: BTreeMap<u32, i32>,
    covered: BTreeSet<u32>,
    total: i32,
    even: i32,
    odd: i32,
}

impl Windings {
    /// Creates an all-zero state for tags up to `max_tag`.
    pub fn new(max_tag: u32) -> Self {
        Windings {
            counts: vec![0; max_tag.min(DENSE_TAGS - 1) as usize + 1],
            ..Default::default()
        }
    }

    /// The winding number of one tag.
    pub fn get(&self, tag: u32) -> i32 {
        match self.counts.get(tag as usize) {
            Some(&count) => count,
            None => self.sparse.get(&tag).copied().unwrap_or(0),
        }
    }

    /// The sum of the winding numbers of all tags.
    pub fn total(&self) -> i32 {
        self.total
    }

    /// The sum of the winding numbers of all even tags (the `A` operand).
    pub fn even(&self) -> i32 {
        self.even
    }

    /// The sum of the winding numbers of all odd tags (the `B` operand).
    pub fn odd(&self) -> i32 {
        self.odd
    }

    /// The number of tags with a non-zero winding number.
    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }

    /// Does `tag` have a non-zero winding number?
    pub fn is_covered(&self, tag: u32) -> bool {
        self.covered.contains(&tag)
    }

    /// All tags with a non-zero winding number, in increasing order.
    pub fn covered(&self) -> impl Iterator<Item = u32> + '_ {
        self.covered.iter().copied()
    }

    /// Are all winding numbers zero?
    pub fn is_zero(&self) -> bool {
        self.covered.is_empty()
    }

    pub(crate) fn apply(&mut self, tag: u32, delta: i32) {
        let (was, now) = match self.counts.get_mut(tag as usize) {
            Some(count) => {
                let was = *count;
                *count += delta;
                (was, *count)
            }
            None => {
                let count = self.sparse.entry(tag).or_insert(0);
                let was = *count;
                *count += delta;
                let now = *count;
                if now == 0 {
                    self.sparse.remove(&tag);
                }
                (was, now)
            }
        };
        if was == 0 && now != 0 {
            self.covered.insert(tag);
        } else if was != 0 && now == 0 {
            self.covered.remove(&tag);
        }
        self.total += delta;
        if tag % 2 == 0 {
            self.even += delta;
        } else {
            self.odd += delta;
        }
    }

    pub(crate) fn clear(&mut self) {
        for tag in std::mem::take(&mut self.covered) {
            if let Some(count) = self.counts.get_mut(tag as usize) {
                *count = 0;
            }
        }
        self.sparse.clear();
        self.total = 0;
        self.even = 0;
        self.odd = 0;
    }
}

/// How a probe edge (or a piece of it) relates to the evaluator's region.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProbeClass {
    /// The region is on both sides.
    Inside,
    /// The region is on neither side.
    Outside,
    /// The region is on exactly one side: the edge lies on its boundary.
    Boundary,
}

impl ProbeClass {
    /// Classifies from the membership on both sides.
    pub fn from_sides(one: bool, other: bool) -> Self {
        match (one, other) {
            (true, true) => ProbeClass::Inside,
            (false, false) => ProbeClass::Outside,
            _ => ProbeClass::Boundary,
        }
    }
}

/// Decides what the edge processor produces.
///
/// Only [`is_inside`](Self::is_inside) is required. By default, the boundary
/// of the region where it returns true goes to the sink. The other methods
/// let an evaluator classify "probe" edges instead of (or in addition to)
/// producing a region, or observe which tags touch or overlap.
pub trait Evaluator {
    /// Called before each pass.
    fn reset(&mut self) {}

    /// Is the region with these winding numbers part of the result?
    fn is_inside(&self, windings: &Windings) -> bool;

    /// Should the boundary of the region be sent to the sink?
    fn emits_region(&self) -> bool {
        true
    }

    /// Edges with this tag are probes: they are classified instead of contributing to the region.
    fn probe_tag(&self) -> Option<u32> {
        None
    }

    /// The output tag for a probe edge piece of the given class, or `None` to drop it.
    fn probe_output(&self, _class: ProbeClass) -> Option<u32> {
        None
    }

    /// Should [`contact`](Self::contact) and [`area`](Self::area) be called?
    fn wants_contacts(&self) -> bool {
        false
    }

    /// Called with a set of tags whose closed areas share at least a point.
    ///
    /// The same set may be reported several times.
    fn contact(&mut self, _tags: &[u32]) {}

    /// Called for regions of positive area, with their winding numbers.
    fn area(&mut self, _windings: &Windings) {}

    /// Called after each pass.
    fn finish(&mut self) {}
}

/// A boolean operation between the even-tagged and odd-tagged edges, using the non-zero rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BooleanOp {
    /// The operation.
    pub op: BinaryOp,
}

impl BooleanOp {
    /// Creates a boolean evaluator.
    pub fn new(op: BinaryOp) -> Self {
        BooleanOp { op }
    }
}

impl Evaluator for BooleanOp {
    fn is_inside(&self, windings: &Windings) -> bool {
        self.op.apply(windings.even() != 0, windings.odd() != 0)
    }
}

/// A boolean operation with an individual fill rule for each operand.
///
/// Useful for operands that overlap themselves, like the raw offset contours of
/// a sizing operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BooleanOp2 {
    /// The operation.
    pub op: BinaryOp,
    /// The fill rule for the even tags.
    pub rule_a: FillRule,
    /// The fill rule for the odd tags.
    pub rule_b: FillRule,
}

impl BooleanOp2 {
    /// Creates a boolean evaluator with individual fill rules.
    pub fn new(op: BinaryOp, rule_a: FillRule, rule_b: FillRule) -> Self {
        BooleanOp2 { op, rule_a, rule_b }
    }
}

impl Evaluator for BooleanOp2 {
    fn is_inside(&self, windings: &Windings) -> bool {
        self.op.apply(
            self.rule_a.is_inside(windings.even()),
            self.rule_b.is_inside(windings.odd()),
        )
    }
}

/// Merges shapes that each carry their own tag.
///
/// A point is inside if more than `min_coverage` tags cover it: 0 gives the union,
/// 1 gives only the regions where shapes overlap, and so on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOp {
    /// The number of tags that must cover a point, minus one.
    pub min_coverage: u32,
}

impl MergeOp {
    /// Creates a merge evaluator.
    pub fn new(min_coverage: u32) -> Self {
        MergeOp { min_coverage }
    }
}

impl Evaluator for MergeOp {
    fn is_inside(&self, windings: &Windings) -> bool {
        windings.covered_count() > self.min_coverage as usize
    }
}

/// Merges by applying a fill rule to the sum of all winding numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimpleMerge {
    /// The fill rule.
    pub rule: FillRule,
}

impl SimpleMerge {
    /// Creates a merge evaluator.
    pub fn new(rule: FillRule) -> Self {
        SimpleMerge { rule }
    }
}

impl Default for SimpleMerge {
    fn default() -> Self {
        SimpleMerge::new(FillRule::NonZero)
    }
}

impl Evaluator for SimpleMerge {
    fn is_inside(&self, windings: &Windings) -> bool {
        self.rule.is_inside(windings.total())
    }
}

/// Which edge pieces an [`EdgePolygonClassifier`] keeps.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ClassifyMode {
    /// Pieces inside the polygons.
    Inside,
    /// Pieces outside the polygons.
    Outside,
    /// Both: inside pieces get output tag 0 and outside pieces output tag 1.
    Both,
}

/// Cuts edges into pieces inside and outside of polygons.
///
/// Edges with tag `edge_tag` are the ones being classified; everything else
/// makes up the polygons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgePolygonClassifier {
    /// Which pieces to keep.
    pub mode: ClassifyMode,
    /// Do pieces on the polygon boundary count as inside?
    pub include_touching: bool,
    /// The tag of the edges being classified.
    pub edge_tag: u32,
}

impl EdgePolygonClassifier {
    /// Creates a classifier for edges tagged 0 against polygons with other tags.
    pub fn new(mode: ClassifyMode, include_touching: bool) -> Self {
        EdgePolygonClassifier {
            mode,
            include_touching,
            edge_tag: 0,
        }
    }
}

impl Evaluator for EdgePolygonClassifier {
    fn is_inside(&self, windings: &Windings) -> bool {
        let own = windings.is_covered(self.edge_tag) as usize;
        windings.covered_count() > own
    }

    fn emits_region(&self) -> bool {
        false
    }

    fn probe_tag(&self) -> Option<u32> {
        Some(self.edge_tag)
    }

    fn probe_output(&self, class: ProbeClass) -> Option<u32> {
        let inside = match class {
            ProbeClass::Inside => true,
            ProbeClass::Outside => false,
            ProbeClass::Boundary => self.include_touching,
        };
        match (self.mode, inside) {
            (ClassifyMode::Inside, true) | (ClassifyMode::Outside, false) => Some(0),
            (ClassifyMode::Both, true) => Some(0),
            (ClassifyMode::Both, false) => Some(1),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windings_bookkeeping() {
        let mut w = Windings::new(4);
        w.apply(0, 1);
        w.apply(3, 1);
        w.apply(4, 2);
        assert_eq!(w.total(), 4);
        assert_eq!(w.even(), 3);
        assert_eq!(w.odd(), 1);
        assert_eq!(w.covered().collect::<Vec<_>>(), vec![0, 3, 4]);
        w.apply(4, -2);
        assert!(!w.is_covered(4));
        assert_eq!(w.covered_count(), 2);
        w.clear();
        assert!(w.is_zero());
        assert_eq!(w.get(0), 0);
        assert_eq!(w.total(), 0);
    }

    #[test]
    fn huge_tags() {
        let mut w = Windings::new(u32::MAX);
        w.apply(u32::MAX, 1);
        w.apply(7, 1);
        w.apply(u32::MAX - 1, -1);
        assert_eq!(w.get(u32::MAX), 1);
        assert_eq!(w.get(u32::MAX - 1), -1);
        assert_eq!(w.even(), -1);
        assert_eq!(w.odd(), 2);
        assert_eq!(w.covered().collect::<Vec<_>>(), vec![7, u32::MAX - 1, u32::MAX]);
        w.apply(u32::MAX, -1);
        assert!(!w.is_covered(u32::MAX));
        assert_eq!(w.get(u32::MAX), 0);
        w.clear();
        assert!(w.is_zero());
        assert_eq!(w.get(u32::MAX - 1), 0);
    }

    #[test]
    fn boolean_ops() {
        let mut w = Windings::new(1);
        w.apply(0, 1);
        assert!(!BooleanOp::new(BinaryOp::And).is_inside(&w));
        assert!(BooleanOp::new(BinaryOp::Or).is_inside(&w));
        assert!(BooleanOp::new(BinaryOp::ANotB).is_inside(&w));
        assert!(!BooleanOp::new(BinaryOp::BNotA).is_inside(&w));
        w.apply(1, -1);
        assert!(BooleanOp::new(BinaryOp::And).is_inside(&w));
        assert!(!BooleanOp::new(BinaryOp::Xor).is_inside(&w));
        assert!(!BooleanOp2::new(BinaryOp::And, FillRule::Positive, FillRule::Positive).is_inside(&w));
        assert!(BooleanOp2::new(BinaryOp::And, FillRule::Positive, FillRule::Negative).is_inside(&w));
    }

    #[test]
    fn merge_coverage() {
        let mut w = Windings::new(2);
        w.apply(0, 1);
        w.apply(2, 1);
        assert!(MergeOp::new(0).is_inside(&w));
        assert!(MergeOp::new(1).is_inside(&w));
        assert!(!MergeOp::new(2).is_inside(&w));
        assert!(!SimpleMerge::new(FillRule::EvenOdd).is_inside(&w));
        assert!(SimpleMerge::default().is_inside(&w));
    }

    #[test]
    fn classifier_outputs() {
        let c = EdgePolygonClassifier::new(ClassifyMode::Both, false);
        assert_eq!(c.probe_output(ProbeClass::Inside), Some(0));
        assert_eq!(c.probe_output(ProbeClass::Boundary), Some(1));
        let c = EdgePolygonClassifier::new(ClassifyMode::Inside, true);
        assert_eq!(c.probe_output(ProbeClass::Boundary), Some(0));
        assert_eq!(c.probe_output(ProbeClass::Outside), None);

        let mut w = Windings::new(1);
        w.apply(0, 1);
        assert!(!c.is_inside(&w));
        w.apply(1, 1);
        assert!(c.is_inside(&w));
    }
}
