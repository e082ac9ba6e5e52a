//! Input normalization: snap rounding.
//!
//! Two input edges can cross anywhere, not only on the grid. Instead of
//! carrying rational crossing points through the sweep, every crossing point is
//! rounded to the grid and declared "hot", along with every edge endpoint. Each
//! edge is then rerouted through the centres of all hot pixels (half-open unit
//! squares around hot points) it passes. The resulting fragments only meet at
//! their endpoints (or lie on top of each other), so the sweep never has to find
//! an intersection, and every result vertex is a grid point.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::trace;

use crate::box_scanner::YIndex;
use crate::geom::{Coord, Edge, Point};
use crate::num::{cross_dirs, round_div, Rational};

/// An edge as inserted, with its tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InputEdge {
    pub edge: Edge,
    pub tag: u32,
}

/// A normalized fragment.
///
/// `left` is the smaller endpoint (for vertical fragments, the lower one).
/// `delta` is the change of the tag's winding number when crossing the
/// fragment upwards. `forward` and `backward` count the input edges that ran
/// over this fragment from `left` to `right` and back; `delta` is
/// `backward - forward`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SweepEdge {
    pub left: Point,
    pub right: Point,
    pub tag: u32,
    pub delta: i32,
    pub forward: u32,
    pub backward: u32,
}

impl SweepEdge {
    pub fn is_vertical(&self) -> bool {
        self.left.x == self.right.x
    }

    /// The fragment as an edge running left to right.
    pub fn as_edge(&self) -> Edge {
        Edge {
            p1: self.left,
            p2: self.right,
        }
    }

    /// The part of this fragment between `a` and `b` (`a` being closer to
    /// `left`), once for every input edge that covered it and in that edge's
    /// direction.
    pub fn pieces(&self, a: Point, b: Point) -> impl Iterator<Item = Edge> {
        let forward = std::iter::repeat(Edge { p1: a, p2: b }).take(self.forward as usize);
        let backward = std::iter::repeat(Edge { p1: b, p2: a }).take(self.backward as usize);
        forward.chain(backward)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct EdgeIdx(pub usize);

#[derive(Clone)]
pub(crate) struct EdgeVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(EdgeVec, EdgeIdx, "e");

/// The normalized input, ready for any number of sweeps.
#[derive(Clone, Debug, Default)]
pub(crate) struct Prepared {
    /// Non-vertical fragments, sorted by their left endpoint.
    pub edges: EdgeVec<SweepEdge>,
    /// Vertical fragments, sorted by position.
    pub verticals: Vec<SweepEdge>,
    /// Every x coordinate where something happens, sorted and without duplicates.
    pub xs: Vec<Coord>,
    pub max_tag: u32,
}

/// Snap rounds the input and sorts the fragments for the sweep.
///
/// If `merge_duplicates` is set, identical fragments with the same tag are
/// combined into one that remembers how many input edges it stands for.
pub(crate) fn prepare(input: &[InputEdge], merge_duplicates: bool) -> Prepared {
    let hot = HotPixels::new(input);
    trace!(hot_pixels = hot.by_x.len(), "snap rounding");

    let mut fragments = Vec::with_capacity(input.len());
    for e in input {
        snap_edge(e, &hot, &mut fragments);
    }
    fragments.sort_by_key(|f: &SweepEdge| (f.left, f.right, f.tag));
    if merge_duplicates {
        fragments = merge(fragments);
    }

    let max_tag = fragments.iter().map(|f| f.tag).max().unwrap_or(0);
    let mut xs: Vec<Coord> = fragments
        .iter()
        .flat_map(|f| [f.left.x, f.right.x])
        .collect();
    xs.sort_unstable();
    xs.dedup();

    let (verticals, edges): (Vec<_>, Vec<_>) =
        fragments.into_iter().partition(SweepEdge::is_vertical);
    Prepared {
        edges: EdgeVec::from_vec(edges),
        verticals,
        xs,
        max_tag,
    }
}

// Fragments are sorted, so duplicates are adjacent.
//
// Fragments whose contributions cancel are kept: they change no winding
// number, but a probe still needs to see every copy.
fn merge(fragments: Vec<SweepEdge>) -> Vec<SweepEdge> {
    let mut ret: Vec<SweepEdge> = Vec::with_capacity(fragments.len());
    for f in fragments {
        match ret.last_mut() {
            Some(last) if (last.left, last.right, last.tag) == (f.left, f.right, f.tag) => {
                last.delta += f.delta;
                last.forward += f.forward;
                last.backward += f.backward;
            }
            _ => ret.push(f),
        }
    }
    ret
}

/// All hot points, sorted two ways for fast lookup by axis-parallel edges.
struct HotPixels {
    by_x: Vec<Point>,
    // (y, x) pairs.
    by_y: Vec<(Coord, Coord)>,
}

impl HotPixels {
    fn new(input: &[InputEdge]) -> Self {
        let mut by_x: Vec<Point> = input
            .iter()
            .filter(|e| !e.edge.is_degenerate())
            .flat_map(|e| [e.edge.p1, e.edge.p2])
            .collect();
        crossings(input, &mut by_x);
        by_x.sort_unstable();
        by_x.dedup();
        let mut by_y: Vec<_> = by_x.iter().map(|p| (p.y, p.x)).collect();
        by_y.sort_unstable();
        HotPixels { by_x, by_y }
    }

    /// The hot pixels that `e` passes through.
    fn hits(&self, e: &Edge) -> Vec<Point> {
        let (x0, x1) = (e.p1.x.min(e.p2.x), e.p1.x.max(e.p2.x));
        let (y0, y1) = (e.p1.y.min(e.p2.y), e.p1.y.max(e.p2.y));
        if e.is_horizontal() {
            // Only pixels centred on the edge's own row can contain it.
            let lo = self.by_y.partition_point(|&q| q < (y0, x0));
            let hi = self.by_y.partition_point(|&q| q <= (y0, x1));
            return self.by_y[lo..hi]
                .iter()
                .map(|&(y, x)| Point::new(x, y))
                .collect();
        }
        let lo = self.by_x.partition_point(|&q| q < Point::new(x0, Coord::MIN));
        let hi = self.by_x.partition_point(|&q| q <= Point::new(x1, Coord::MAX));
        if e.is_vertical() {
            let lo = lo + self.by_x[lo..hi].partition_point(|q| q.y < y0);
            let hi = lo + self.by_x[lo..hi].partition_point(|q| q.y <= y1);
            return self.by_x[lo..hi].to_vec();
        }
        // Walk the columns that have hot points, looking only at the rows
        // close to the edge in each of them.
        let mut ret = Vec::new();
        let mut i = lo;
        while i < hi {
            let c = self.by_x[i].x;
            let end = i + self.by_x[i..hi].partition_point(|q| q.x == c);
            let (ya, yb) = rows_near(e, c);
            let (ya, yb) = (ya.max(y0), yb.min(y1));
            let first = i + self.by_x[i..end].partition_point(|q| q.y < ya);
            let last = i + self.by_x[i..end].partition_point(|q| q.y <= yb);
            ret.extend(
                self.by_x[first..last.max(first)]
                    .iter()
                    .filter(|q| pixel_hit(e, **q))
                    .copied(),
            );
            i = end;
        }
        ret
    }
}

// The rows whose pixels a non-vertical edge might meet in column `c`: the
// edge's y range over `c - 1/2 ..= c + 1/2`, with a row of slack on each side.
fn rows_near(e: &Edge, c: Coord) -> (Coord, Coord) {
    let (dx, dy) = (e.dx() as i128, e.dy() as i128);
    // y at x = x2 / 2.
    let y = |x2: i128| {
        Rational::new(
            2 * e.p1.y as i128 * dx + dy * (x2 - 2 * e.p1.x as i128),
            2 * dx,
        )
    };
    let a = y(2 * c as i128 - 1).floor();
    let b = y(2 * c as i128 + 1).floor();
    let clamp = |y: i128| y.clamp(Coord::MIN as i128, Coord::MAX as i128) as Coord;
    (clamp(a.min(b) - 1), clamp(a.max(b) + 2))
}

// Adds the rounded crossing points of all pairs of input edges.
//
// Edges are swept by their left end; the ones still open are kept in a
// `YIndex`, so only edges whose boxes share some y range are compared.
fn crossings(input: &[InputEdge], out: &mut Vec<Point>) {
    let mut order: Vec<usize> = (0..input.len())
        .filter(|&i| !input[i].edge.is_degenerate())
        .collect();
    order.sort_by_key(|&i| input[i].edge.bbox().left);

    let mut active = YIndex::new();
    let mut closing: BinaryHeap<Reverse<(Coord, usize)>> = BinaryHeap::new();
    for i in order {
        let e = input[i].edge;
        let bbox = e.bbox();
        while let Some(&Reverse((right, j))) = closing.peek() {
            if right >= bbox.left {
                break;
            }
            closing.pop();
            active.remove(&input[j].edge.bbox(), j);
        }
        for j in active.candidates(&bbox, 0) {
            let f = input[j].edge;
            if f.bbox().touches(&bbox) {
                if let Some(p) = crossing(&e, &f) {
                    out.push(p);
                }
            }
        }
        active.insert(&bbox, i);
        closing.push(Reverse((bbox.right, i)));
    }
}

/// The rounded intersection point of two non-parallel segments, if they meet.
fn crossing(a: &Edge, b: &Edge) -> Option<Point> {
    let d = cross_dirs(a.p1, a.p2, b.p1, b.p2);
    if d == 0 {
        // Parallel: overlaps start and end at endpoints, which are hot anyway.
        return None;
    }
    let t = cross_dirs(a.p1, b.p1, b.p1, b.p2);
    let u = cross_dirs(a.p1, b.p1, a.p1, a.p2);
    let within = |n: i128| {
        if d > 0 {
            0 <= n && n <= d
        } else {
            d <= n && n <= 0
        }
    };
    if !within(t) || !within(u) {
        return None;
    }
    let x = a.p1.x as i128 + round_div(t * a.dx() as i128, d);
    let y = a.p1.y as i128 + round_div(t * a.dy() as i128, d);
    Some(Point::new(x as Coord, y as Coord))
}

// A bound on the segment parameter: `num / den`, `strict` for an open bound.
#[derive(Clone, Copy)]
struct Bound {
    num: i128,
    den: i128,
    strict: bool,
}

impl Bound {
    fn cmp_value(&self, other: &Bound) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

/// Does the segment `e` meet the half-open pixel `[c - 1/2, c + 1/2)^2`?
///
/// Works in doubled coordinates, clipping the segment's parameter range
/// `[0, 1]` against the four sides of the pixel.
pub(crate) fn pixel_hit(e: &Edge, c: Point) -> bool {
    let mut lo = Bound {
        num: 0,
        den: 1,
        strict: false,
    };
    let mut hi = Bound {
        num: 1,
        den: 1,
        strict: false,
    };
    let raise = |lo: &mut Bound, b: Bound| match b.cmp_value(lo) {
        Ordering::Greater => *lo = b,
        Ordering::Equal => lo.strict |= b.strict,
        Ordering::Less => {}
    };
    let lower = |hi: &mut Bound, b: Bound| match b.cmp_value(hi) {
        Ordering::Less => *hi = b,
        Ordering::Equal => hi.strict |= b.strict,
        Ordering::Greater => {}
    };

    let axes = [
        (2 * e.p1.x as i128, 2 * e.dx() as i128, c.x),
        (2 * e.p1.y as i128, 2 * e.dy() as i128, c.y),
    ];
    for (p, d, cc) in axes {
        let l = 2 * cc as i128 - 1;
        let h = 2 * cc as i128 + 1;
        if d == 0 {
            if !(l <= p && p < h) {
                return false;
            }
        } else if d > 0 {
            raise(&mut lo, Bound { num: l - p, den: d, strict: false });
            lower(&mut hi, Bound { num: h - p, den: d, strict: true });
        } else {
            lower(&mut hi, Bound { num: p - l, den: -d, strict: false });
            raise(&mut lo, Bound { num: p - h, den: -d, strict: true });
        }
    }
    match lo.cmp_value(&hi) {
        Ordering::Less => true,
        Ordering::Equal => !lo.strict && !hi.strict,
        Ordering::Greater => false,
    }
}

impl HotPixels {
    /// The hot pixels that `e` passes through, in order along `e`.
    fn hits_along(&self, e: &Edge) -> Vec<Point> {
        let mut hits = self.hits(e);
        let sx = if e.dx() < 0 { -1i64 } else { 1 };
        let sy = if e.dy() < 0 { -1i64 } else { 1 };
        hits.sort_by_key(|p| (p.x as i64 * sx, p.y as i64 * sy));
        hits
    }
}

// Splits one input edge at the hot pixels it passes.
//
// Rerouting a piece through the centres of its hot pixels can move it into
// a hot pixel that the original edge missed, so every piece is checked again
// (and split again) until it meets no hot pixel other than its own two ends.
// Otherwise a second pass over the output could snap differently.
fn snap_edge(input: &InputEdge, hot: &HotPixels, out: &mut Vec<SweepEdge>) {
    let e = input.edge;
    if e.is_degenerate() {
        return;
    }
    let hits = hot.hits_along(&e);
    debug_assert_eq!(hits.first(), Some(&e.p1));
    debug_assert_eq!(hits.last(), Some(&e.p2));

    // Pieces still to check, the next one on top.
    let mut todo: Vec<(Point, Point)> = hits.windows(2).rev().map(|w| (w[0], w[1])).collect();
    while let Some((a, b)) = todo.pop() {
        if a == b {
            continue;
        }
        let piece = Edge { p1: a, p2: b };
        let inner = hot.hits_along(&piece);
        if inner.len() > 2 {
            trace!(?piece, hits = inner.len(), "rerouting snapped piece");
            todo.extend(inner.windows(2).rev().map(|w| (w[0], w[1])));
            continue;
        }

        // Going towards smaller x (or, for vertical fragments, smaller y) is +1.
        let reversed = b < a;
        let (left, right) = if reversed { (b, a) } else { (a, b) };
        out.push(SweepEdge {
            left,
            right,
            tag: input.tag,
            delta: if reversed { 1 } else { -1 },
            forward: u32::from(!reversed),
            backward: u32::from(reversed),
        });
    }
}
