//! Geometric primitives: points, edges, boxes and polygons on the integer grid.

use std::cmp::Ordering;

/// The coordinate type. All geometry lives on the integer grid.
pub type Coord = i32;

/// The type used for areas, which can exceed the coordinate range.
pub type Area = i64;

/// A two-dimensional point.
///
/// Points are sorted by `x` and then by `y`, for the convenience of the sweep-line
/// algorithms (which move in increasing `x`).
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: Coord,
    /// Vertical coordinate. Larger values are up.
    pub y: Coord,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl Point {
    /// Create a new point.
    pub const fn new(x: Coord, y: Coord) -> Self {
        Point { x, y }
    }

    /// Converts to a floating point `kurbo` point, for rendering.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x as f64, self.y as f64)
    }

    /// Translates this point by `(dx, dy)`.
    pub fn moved(self, dx: Coord, dy: Coord) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl From<(Coord, Coord)> for Point {
    fn from((x, y): (Coord, Coord)) -> Self {
        Self { x, y }
    }
}

/// Twice the signed area of the triangle `a`, `b`, `c`: positive if the
/// triangle runs counter-clockwise.
pub(crate) fn cross(a: Point, b: Point, c: Point) -> i128 {
    let (bx, by) = (b.x as i128 - a.x as i128, b.y as i128 - a.y as i128);
    let (cx, cy) = (c.x as i128 - a.x as i128, c.y as i128 - a.y as i128);
    bx * cy - by * cx
}

/// A directed segment.
///
/// For edges coming from polygons, the direction encodes the inside: the
/// interior is always on the right-hand side of the edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    /// The start point.
    pub p1: Point,
    /// The end point.
    pub p2: Point,
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} -> {:?}", self.p1, self.p2)
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({};{})", self.p1, self.p2)
    }
}

impl Edge {
    /// Create a new edge from `p1` to `p2`.
    pub fn new(p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Edge {
            p1: p1.into(),
            p2: p2.into(),
        }
    }

    /// The horizontal extent, `p2.x - p1.x`.
    pub fn dx(&self) -> i64 {
        self.p2.x as i64 - self.p1.x as i64
    }

    /// The vertical extent, `p2.y - p1.y`.
    pub fn dy(&self) -> i64 {
        self.p2.y as i64 - self.p1.y as i64
    }

    /// Is this edge just a point?
    pub fn is_degenerate(&self) -> bool {
        self.p1 == self.p2
    }

    /// Is this edge vertical (and not degenerate)?
    pub fn is_vertical(&self) -> bool {
        self.p1.x == self.p2.x && self.p1.y != self.p2.y
    }

    /// Is this edge horizontal (and not degenerate)?
    pub fn is_horizontal(&self) -> bool {
        self.p1.y == self.p2.y && self.p1.x != self.p2.x
    }

    /// The same edge, running in the other direction.
    pub fn reversed(&self) -> Self {
        Edge {
            p1: self.p2,
            p2: self.p1,
        }
    }

    /// The smallest box containing this edge.
    pub fn bbox(&self) -> Rect {
        Rect::new(self.p1.x, self.p1.y, self.p2.x, self.p2.y)
    }

    /// Which side of this edge's line is `p` on?
    ///
    /// Returns `Greater` for the left side, `Less` for the right side and
    /// `Equal` if `p` is on the line.
    pub fn side_of(&self, p: Point) -> Ordering {
        cross(self.p1, self.p2, p).cmp(&0)
    }

    /// Does this edge (including its endpoints) contain `p`?
    pub fn contains(&self, p: Point) -> bool {
        self.side_of(p) == Ordering::Equal && self.bbox().contains(p)
    }

    /// Translates this edge by `(dx, dy)`.
    pub fn moved(&self, dx: Coord, dy: Coord) -> Self {
        Edge {
            p1: self.p1.moved(dx, dy),
            p2: self.p2.moved(dx, dy),
        }
    }
}

/// An axis-aligned box.
///
/// A box whose `left` exceeds its `right` (or whose `bottom` exceeds its `top`) is
/// empty: it contains no point and never interacts with anything. A box of zero
/// width or height is *not* empty; it still contains its boundary points.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// The smallest x coordinate.
    pub left: Coord,
    /// The smallest y coordinate.
    pub bottom: Coord,
    /// The largest x coordinate.
    pub right: Coord,
    /// The largest y coordinate.
    pub top: Coord,
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "()")
        } else {
            write!(
                f,
                "({},{};{},{})",
                self.left, self.bottom, self.right, self.top
            )
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::empty()
    }
}

impl Rect {
    /// Creates the box spanned by two corners, given in any order.
    pub fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Rect {
            left: x1.min(x2),
            bottom: y1.min(y2),
            right: x1.max(x2),
            top: y1.max(y2),
        }
    }

    /// The canonical empty box.
    pub const fn empty() -> Self {
        Rect {
            left: 1,
            bottom: 1,
            right: -1,
            top: -1,
        }
    }

    /// The smallest box containing all the points.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        points.into_iter().fold(Rect::empty(), |r, p| r.add_point(p))
    }

    /// Does this box contain no points at all?
    pub fn is_empty(&self) -> bool {
        self.left > self.right || self.bottom > self.top
    }

    /// The horizontal size.
    pub fn width(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.right as i64 - self.left as i64
        }
    }

    /// The vertical size.
    pub fn height(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.top as i64 - self.bottom as i64
        }
    }

    /// The area.
    pub fn area(&self) -> Area {
        self.width() * self.height()
    }

    /// The center, rounded towards negative infinity.
    pub fn center(&self) -> Point {
        Point::new(
            ((self.left as i64 + self.right as i64).div_euclid(2)) as Coord,
            ((self.bottom as i64 + self.top as i64).div_euclid(2)) as Coord,
        )
    }

    /// The bottom-left corner.
    pub fn p1(&self) -> Point {
        Point::new(self.left, self.bottom)
    }

    /// The top-right corner.
    pub fn p2(&self) -> Point {
        Point::new(self.right, self.top)
    }

    /// Extends this box to contain `p`.
    pub fn add_point(self, p: Point) -> Self {
        if self.is_empty() {
            Rect::new(p.x, p.y, p.x, p.y)
        } else {
            Rect {
                left: self.left.min(p.x),
                bottom: self.bottom.min(p.y),
                right: self.right.max(p.x),
                top: self.top.max(p.y),
            }
        }
    }

    /// The smallest box containing both boxes.
    pub fn union(&self, other: &Rect) -> Self {
        if self.is_empty() {
            *other
        } else if other.is_empty() {
            *self
        } else {
            Rect {
                left: self.left.min(other.left),
                bottom: self.bottom.min(other.bottom),
                right: self.right.max(other.right),
                top: self.top.max(other.top),
            }
        }
    }

    /// The common part of both boxes (possibly empty).
    pub fn intersection(&self, other: &Rect) -> Self {
        if self.is_empty() || other.is_empty() {
            return Rect::empty();
        }
        let r = Rect {
            left: self.left.max(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.min(other.right),
            top: self.top.min(other.top),
        };
        if r.is_empty() {
            Rect::empty()
        } else {
            r
        }
    }

    /// Grows the box by `dx` horizontally and `dy` vertically on each side.
    ///
    /// Negative values shrink it, possibly making it empty.
    pub fn enlarged(&self, dx: Coord, dy: Coord) -> Self {
        if self.is_empty() {
            return *self;
        }
        Rect {
            left: self.left - dx,
            bottom: self.bottom - dy,
            right: self.right + dx,
            top: self.top + dy,
        }
    }

    /// Does this (closed) box contain `p`?
    pub fn contains(&self, p: Point) -> bool {
        !self.is_empty()
            && self.left <= p.x
            && p.x <= self.right
            && self.bottom <= p.y
            && p.y <= self.top
    }

    /// Do the two boxes share at least one point?
    pub fn touches(&self, other: &Rect) -> bool {
        self.interacts(other, 1)
    }

    /// Do the two boxes share a region of positive area?
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.interacts(other, 0)
    }

    /// The interaction test used by the box scanner.
    ///
    /// `mode == 0` means overlapping, `mode == 1` touching and `mode > 1` means
    /// the boxes are at most `mode - 1` apart in both directions.
    pub fn interacts(&self, other: &Rect, mode: Coord) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let e = mode as i64 - 1;
        let (a, b) = (self, other);
        (a.left as i64) <= b.right as i64 + e
            && (b.left as i64) <= a.right as i64 + e
            && (a.bottom as i64) <= b.top as i64 + e
            && (b.bottom as i64) <= a.top as i64 + e
    }

    /// Translates this box by `(dx, dy)`.
    pub fn moved(&self, dx: Coord, dy: Coord) -> Self {
        if self.is_empty() {
            return *self;
        }
        Rect {
            left: self.left + dx,
            bottom: self.bottom + dy,
            right: self.right + dx,
            top: self.top + dy,
        }
    }

    /// Converts to a `kurbo` rectangle, for rendering.
    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::new(
            self.left as f64,
            self.bottom as f64,
            self.right as f64,
            self.top as f64,
        )
    }
}

/// Where a point lies relative to an area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Containment {
    /// Strictly inside.
    Inside,
    /// Exactly on the boundary.
    Boundary,
    /// Strictly outside.
    Outside,
}

/// A polygon with one hull and any number of holes.
///
/// Polygons are always normalized: the hull runs clockwise and holes run
/// counter-clockwise (so the interior is on the right of every edge), each
/// contour starts at its smallest point, and there are no duplicate or
/// collinear pass-through vertices. Spikes and vertices where a contour touches
/// itself are kept.
#[derive(Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Polygon {
    hull: Vec<Point>,
    holes: Vec<Vec<Point>>,
}

impl std::fmt::Debug for Polygon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for Polygon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn contour(f: &mut std::fmt::Formatter<'_>, pts: &[Point]) -> std::fmt::Result {
            write!(f, "(")?;
            for (i, p) in pts.iter().enumerate() {
                if i > 0 {
                    write!(f, ";")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, ")")
        }

        contour(f, &self.hull)?;
        for h in &self.holes {
            write!(f, "/")?;
            contour(f, h)?;
        }
        Ok(())
    }
}

impl From<Rect> for Polygon {
    fn from(r: Rect) -> Self {
        Polygon::from_rect(r)
    }
}

impl Polygon {
    /// Creates a polygon without holes from a sequence of vertices in either orientation.
    pub fn new(hull: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        let hull = normalize_contour(hull.into_iter().map(Into::into).collect(), true);
        Polygon {
            hull,
            holes: Vec::new(),
        }
    }

    /// Creates a polygon with holes. Contours may be given in either orientation.
    ///
    /// Holes are not checked for actually being inside the hull.
    pub fn with_holes(
        hull: impl IntoIterator<Item = impl Into<Point>>,
        holes: impl IntoIterator<Item = impl IntoIterator<Item = impl Into<Point>>>,
    ) -> Self {
        let mut ret = Polygon::new(hull);
        for h in holes {
            ret.insert_hole(h.into_iter().map(Into::into).collect());
        }
        ret
    }

    /// Creates a rectangular polygon. An empty box gives an empty polygon.
    pub fn from_rect(r: Rect) -> Self {
        if r.is_empty() {
            return Polygon::default();
        }
        Polygon::new([
            (r.left, r.bottom),
            (r.left, r.top),
            (r.right, r.top),
            (r.right, r.bottom),
        ])
    }

    /// Adds a hole. Degenerate contours are ignored.
    pub fn insert_hole(&mut self, hole: Vec<Point>) {
        let hole = normalize_contour(hole, false);
        if !hole.is_empty() {
            self.holes.push(hole);
            self.holes.sort();
        }
    }

    /// The hull, running clockwise.
    pub fn hull(&self) -> &[Point] {
        &self.hull
    }

    /// The holes, each running counter-clockwise.
    pub fn holes(&self) -> &[Vec<Point>] {
        &self.holes
    }

    /// Does this polygon have no area at all?
    pub fn is_empty(&self) -> bool {
        self.hull.is_empty()
    }

    /// The total number of vertices, including the ones of holes.
    pub fn vertex_count(&self) -> usize {
        self.hull.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    /// The bounding box of the hull.
    pub fn bbox(&self) -> Rect {
        Rect::from_points(self.hull.iter().copied())
    }

    /// The enclosed area, with holes subtracted.
    pub fn area(&self) -> Area {
        let twice: i128 =
            -area2(&self.hull) - self.holes.iter().map(|h| area2(h)).sum::<i128>();
        (twice / 2) as Area
    }

    /// Twice the enclosed area; exact even for odd areas.
    pub fn area2(&self) -> i128 {
        -area2(&self.hull) - self.holes.iter().map(|h| area2(h)).sum::<i128>()
    }

    /// Is this polygon an axis-aligned box?
    pub fn is_rect(&self) -> bool {
        self.holes.is_empty()
            && self.hull.len() == 4
            && (0..4).all(|i| {
                let a = self.hull[i];
                let b = self.hull[(i + 1) % 4];
                a.x == b.x || a.y == b.y
            })
    }

    /// All boundary edges of this polygon, with the interior on their right.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        std::iter::once(&self.hull)
            .chain(self.holes.iter())
            .flat_map(|c| contour_edges(c))
    }

    /// Translates this polygon by `(dx, dy)`.
    pub fn moved(&self, dx: Coord, dy: Coord) -> Self {
        Polygon {
            hull: self.hull.iter().map(|p| p.moved(dx, dy)).collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().map(|p| p.moved(dx, dy)).collect())
                .collect(),
        }
    }

    /// Is `p` inside, outside or on the boundary of this polygon?
    pub fn contains_point(&self, p: Point) -> Containment {
        let p2 = (2 * p.x as i64, 2 * p.y as i64);
        match contour_contains(&self.hull, p2) {
            Containment::Inside => {}
            other => return other,
        }
        for h in &self.holes {
            match contour_contains(h, p2) {
                Containment::Outside => {}
                Containment::Inside => return Containment::Outside,
                Containment::Boundary => return Containment::Boundary,
            }
        }
        Containment::Inside
    }

    /// Converts to a `kurbo` path, for rendering.
    pub fn to_bez_path(&self) -> kurbo::BezPath {
        let mut ret = kurbo::BezPath::new();
        for c in std::iter::once(&self.hull).chain(self.holes.iter()) {
            if let Some((first, rest)) = c.split_first() {
                ret.move_to(first.to_kurbo());
                for p in rest {
                    ret.line_to(p.to_kurbo());
                }
                ret.close_path();
            }
        }
        ret
    }

    /// Builds a polygon from a hull and holes that are already oriented
    /// and cleaned, skipping normalization except for start points.
    pub(crate) fn from_parts(hull: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        let mut holes: Vec<_> = holes.into_iter().filter(|h| !h.is_empty()).collect();
        holes.sort();
        Polygon { hull, holes }
    }
}

/// The edges of a closed contour, including the closing one.
pub(crate) fn contour_edges(c: &[Point]) -> impl Iterator<Item = Edge> + '_ {
    (0..c.len()).map(move |i| Edge {
        p1: c[i],
        p2: c[(i + 1) % c.len()],
    })
}

/// Twice the signed area of a closed contour: positive for counter-clockwise ones.
pub(crate) fn area2(c: &[Point]) -> i128 {
    contour_edges(c)
        .map(|e| e.p1.x as i128 * e.p2.y as i128 - e.p2.x as i128 * e.p1.y as i128)
        .sum()
}

/// Cleans up a closed contour and orients it.
///
/// Consecutive duplicates and collinear pass-through vertices are removed (but
/// spikes, where the contour doubles back, are kept). A hull gets oriented
/// clockwise and a hole counter-clockwise, and the result starts at its
/// smallest point. Contours enclosing no area come back empty.
pub(crate) fn normalize_contour(mut pts: Vec<Point>, hull: bool) -> Vec<Point> {
    loop {
        let n = pts.len();
        if n < 3 {
            return Vec::new();
        }
        let mut keep = Vec::with_capacity(n);
        for i in 0..n {
            let prev = pts[(i + n - 1) % n];
            let p = pts[i];
            let next = pts[(i + 1) % n];
            if p == next {
                continue;
            }
            if prev != p && cross(prev, p, next) == 0 && passes_through(prev, p, next) {
                continue;
            }
            keep.push(p);
        }
        if keep.len() == n {
            break;
        }
        pts = keep;
    }

    let a = area2(&pts);
    if a == 0 {
        return Vec::new();
    }
    if (a > 0) == hull {
        pts.reverse();
    }
    let start = pts
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| **p)
        .map(|(i, _)| i)
        .unwrap_or(0);
    pts.rotate_left(start);
    pts
}

// For collinear `a`, `b`, `c`, is `b` strictly between `a` and `c`?
fn passes_through(a: Point, b: Point, c: Point) -> bool {
    let d1 = (b.x as i64 - a.x as i64, b.y as i64 - a.y as i64);
    let d2 = (c.x as i64 - b.x as i64, c.y as i64 - b.y as i64);
    d1.0 * d2.0 + d1.1 * d2.1 > 0
}

/// Point containment for a closed contour, with the point given in doubled
/// coordinates (so that edge midpoints can be tested exactly).
pub(crate) fn contour_contains(c: &[Point], (px, py): (i64, i64)) -> Containment {
    let mut crossings = 0;
    for e in contour_edges(c) {
        let (ax, ay) = (2 * e.p1.x as i64, 2 * e.p1.y as i64);
        let (bx, by) = (2 * e.p2.x as i64, 2 * e.p2.y as i64);
        let s = (bx - ax) as i128 * (py - ay) as i128 - (px - ax) as i128 * (by - ay) as i128;
        if s == 0
            && ax.min(bx) <= px
            && px <= ax.max(bx)
            && ay.min(by) <= py
            && py <= ay.max(by)
        {
            return Containment::Boundary;
        }
        if (ay > py) != (by > py) {
            // The edge crosses the horizontal line through p; count it if the
            // crossing is to the right of p.
            if (by > ay) == (s > 0) {
                crossings += 1;
            }
        }
    }
    if crossings % 2 == 1 {
        Containment::Inside
    } else {
        Containment::Outside
    }
}
