//! Turning result edges back into polygons.

use std::cmp::Ordering;

use tracing::{trace, warn};

use crate::geom::{
    area2, contour_contains, contour_edges, normalize_contour, Containment, Coord, Edge, Point,
    Polygon, Rect,
};
use crate::num::Rational;
use crate::sink::{EdgeSink, PolygonSink};

/// Stitches result edges into polygons.
///
/// All edges of a pass are collected and stitched when the pass ends. At a
/// vertex with several outgoing edges, `min_coherence` picks the sharpest right
/// turn, so that areas touching at a corner become separate polygons. Without
/// it, the sharpest left turn is taken and such areas form one polygon that
/// touches itself; those are kept as they are.
///
/// With `resolve_holes`, every hole is connected to its hull by a horizontal
/// channel running left from the hole's smallest vertex, giving polygons
/// without holes. Where the channel meets a slanted hull edge off the grid, its
/// end is rounded towards the hole. The new vertex is then slightly inside the
/// hull, so the polygon loses a sliver of area next to the channel, and merging
/// it again may not give the same polygon back. Rectilinear hulls are exact.
#[derive(Debug)]
pub struct PolygonGenerator<S> {
    sink: S,
    resolve_holes: bool,
    min_coherence: bool,
    edges: Vec<Edge>,
}

impl<S: PolygonSink> PolygonGenerator<S> {
    /// Creates a generator feeding `sink`.
    pub fn new(sink: S, resolve_holes: bool, min_coherence: bool) -> Self {
        PolygonGenerator {
            sink,
            resolve_holes,
            min_coherence,
            edges: Vec::new(),
        }
    }

    /// The sink receiving our polygons.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The sink receiving our polygons.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Returns the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: PolygonSink> EdgeSink for PolygonGenerator<S> {
    fn start(&mut self) {
        self.edges.clear();
        self.sink.start();
    }

    fn put(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    fn flush(&mut self) {
        let contours = stitch(std::mem::take(&mut self.edges), self.min_coherence);
        for p in assemble(contours, self.resolve_holes) {
            self.sink.put(p);
        }
        self.sink.flush();
    }
}

type Dir = (i128, i128);

fn dir(e: &Edge) -> Dir {
    (e.dx() as i128, e.dy() as i128)
}

fn cross(a: Dir, b: Dir) -> i128 {
    a.0 * b.1 - a.1 * b.0
}

// Compares the counter-clockwise angles from `r` to `a` and to `b`, in [0, 360).
fn ccw_cmp(r: Dir, a: Dir, b: Dir) -> Ordering {
    let half = |v: Dir| {
        let c = cross(r, v);
        let same_way = c == 0 && r.0 * v.0 + r.1 * v.1 > 0;
        if c > 0 || same_way {
            0
        } else {
            1
        }
    };
    half(a)
        .cmp(&half(b))
        .then_with(|| 0.cmp(&cross(a, b)))
}

// Should the walk continue along `a` rather than `best`, having arrived along `d_in`?
fn prefer(d_in: Dir, a: Dir, best: Dir, min_coherence: bool) -> bool {
    // Angles are measured from the way back, so going back has angle zero.
    let back = (-d_in.0, -d_in.1);
    let is_back = |v: Dir| cross(back, v) == 0 && back.0 * v.0 + back.1 * v.1 > 0;
    if min_coherence {
        !is_back(a) && (is_back(best) || ccw_cmp(back, a, best) == Ordering::Less)
    } else {
        ccw_cmp(back, a, best) == Ordering::Greater
    }
}

/// Links edges into closed contours.
fn stitch(mut edges: Vec<Edge>, min_coherence: bool) -> Vec<Vec<Point>> {
    edges.sort_by_key(|e| (e.p1, e.p2));
    let mut used = vec![false; edges.len()];
    let mut contours = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let start = edges[first].p1;
        let mut pts = vec![start];
        let mut cur = first;
        let closed = loop {
            let v = edges[cur].p2;
            let d_in = dir(&edges[cur]);
            let lo = edges.partition_point(|e| e.p1 < v);
            let hi = edges.partition_point(|e| e.p1 <= v);
            let closing = (v == start).then_some(first);
            let mut best: Option<usize> = None;
            for i in (lo..hi).filter(|&i| !used[i]).chain(closing) {
                let better = match best {
                    None => true,
                    Some(b) => prefer(d_in, dir(&edges[i]), dir(&edges[b]), min_coherence),
                };
                if better {
                    best = Some(i);
                }
            }
            match best {
                None => break false,
                Some(i) if i == first => break true,
                Some(i) => {
                    used[i] = true;
                    pts.push(v);
                    cur = i;
                }
            }
        };
        if closed {
            contours.push(pts);
        } else {
            warn!(start = ?start, len = pts.len(), "dropping open contour");
        }
    }
    contours
}

struct Hull {
    points: Vec<Point>,
    area2: i128,
    bbox: Rect,
    holes: Vec<Vec<Point>>,
}

// Is `hole` inside `hull`? Holes may touch their hull, so points on the
// boundary don't decide.
fn encloses(hull: &[Point], hole: &[Point]) -> bool {
    let vertices = hole.iter().map(|p| (2 * p.x as i64, 2 * p.y as i64));
    let midpoints = contour_edges(hole).map(|e| {
        (
            e.p1.x as i64 + e.p2.x as i64,
            e.p1.y as i64 + e.p2.y as i64,
        )
    });
    for p in vertices.chain(midpoints) {
        match contour_contains(hull, p) {
            Containment::Inside => return true,
            Containment::Outside => return false,
            Containment::Boundary => {}
        }
    }
    false
}

/// Sorts contours into hulls and holes, and puts the holes into their hulls.
fn assemble(contours: Vec<Vec<Point>>, resolve_holes: bool) -> Vec<Polygon> {
    let mut hulls: Vec<Hull> = Vec::new();
    let mut holes: Vec<Vec<Point>> = Vec::new();
    for c in contours {
        let a = area2(&c);
        if a < 0 {
            let points = normalize_contour(c, true);
            if !points.is_empty() {
                hulls.push(Hull {
                    bbox: Rect::from_points(points.iter().copied()),
                    area2: -a,
                    points,
                    holes: Vec::new(),
                });
            }
        } else if a > 0 {
            let hole = normalize_contour(c, false);
            if !hole.is_empty() {
                holes.push(hole);
            }
        }
    }
    trace!(hulls = hulls.len(), holes = holes.len(), "stitched");

    let mut by_area: Vec<usize> = (0..hulls.len()).collect();
    by_area.sort_by_key(|&i| (hulls[i].area2, i));
    for hole in holes {
        let bbox = Rect::from_points(hole.iter().copied());
        let owner = by_area.iter().copied().find(|&i| {
            let h = &hulls[i];
            h.bbox.contains(bbox.p1()) && h.bbox.contains(bbox.p2()) && encloses(&h.points, &hole)
        });
        match owner {
            Some(i) => hulls[i].holes.push(hole),
            None => warn!(start = ?hole[0], "dropping hole without a hull"),
        }
    }

    hulls
        .into_iter()
        .map(|h| {
            if resolve_holes && !h.holes.is_empty() {
                let (points, rest) = cut_in(h.points, h.holes);
                Polygon::from_parts(points, rest)
            } else {
                Polygon::from_parts(h.points, h.holes)
            }
        })
        .collect()
}

// The closest hull edge crossed by a ray going left from `v`, and the
// x coordinate where the ray meets it, rounded towards `v`. Rounding moves the
// hull edge inwards when it is slanted.
fn hit_left(hull: &[Point], v: Point) -> Option<(usize, Coord)> {
    let mut best: Option<(usize, Rational)> = None;
    let vx = Rational::from_int(v.x as i128);
    for (j, e) in contour_edges(hull).enumerate() {
        if (e.p1.y <= v.y) == (e.p2.y <= v.y) {
            continue;
        }
        let (dx, dy) = (e.dx() as i128, e.dy() as i128);
        let x = Rational::new(
            e.p1.x as i128 * dy + (v.y as i128 - e.p1.y as i128) * dx,
            dy,
        );
        if x <= vx && best.map_or(true, |(_, bx)| x > bx) {
            best = Some((j, x));
        }
    }
    best.map(|(j, x)| (j, x.ceil() as Coord))
}

/// Connects holes to the hull. Returns the new hull and the holes that
/// couldn't be connected.
fn cut_in(mut hull: Vec<Point>, mut holes: Vec<Vec<Point>>) -> (Vec<Point>, Vec<Vec<Point>>) {
    // Contours start at their smallest point.
    holes.sort_by_key(|h| h[0]);
    let mut rest = Vec::new();
    for hole in holes {
        let v = hole[0];
        let Some((j, x)) = hit_left(&hull, v) else {
            warn!(start = ?v, "hole cannot be connected to its hull");
            rest.push(hole);
            continue;
        };
        let w = Point::new(x, v.y);
        let mut spliced = Vec::with_capacity(hull.len() + hole.len() + 3);
        spliced.extend_from_slice(&hull[..=j]);
        spliced.push(w);
        spliced.extend_from_slice(&hole);
        spliced.push(v);
        spliced.push(w);
        spliced.extend_from_slice(&hull[j + 1..]);
        spliced.dedup();
        while spliced.len() > 1 && spliced.first() == spliced.last() {
            spliced.pop();
        }
        hull = spliced;
    }
    (hull, rest)
}

/// Drops polygons narrower than some resolution in x or y.
#[derive(Debug)]
pub struct SliverFilter<S> {
    inner: S,
    resolution: Coord,
}

impl<S: PolygonSink> SliverFilter<S> {
    /// Wraps `inner`, dropping polygons whose bounding box is narrower than `resolution`.
    pub fn new(inner: S, resolution: Coord) -> Self {
        SliverFilter { inner, resolution }
    }

    /// Returns the wrapped sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: PolygonSink> PolygonSink for SliverFilter<S> {
    fn start(&mut self) {
        self.inner.start();
    }

    fn put(&mut self, polygon: Polygon) {
        let bbox = polygon.bbox();
        let r = self.resolution as i64;
        if bbox.width() >= r && bbox.height() >= r {
            self.inner.put(polygon);
        }
    }

    fn flush(&mut self) {
        self.inner.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::FillRule;
    use crate::EdgeProcessor;

    fn merged(polys: &[Polygon], resolve_holes: bool, min_coherence: bool) -> Vec<String> {
        EdgeProcessor::new()
            .simple_merge(polys, FillRule::NonZero, resolve_holes, min_coherence)
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    fn rect(l: Coord, b: Coord, r: Coord, t: Coord) -> Polygon {
        Polygon::from_rect(Rect::new(l, b, r, t))
    }

    #[test]
    fn corner_touching() {
        let polys = [rect(0, 0, 10, 10), rect(10, 10, 20, 20)];
        assert_eq!(
            merged(&polys, false, true),
            vec!["(0,0;0,10;10,10;10,0)", "(10,10;10,20;20,20;20,10)"]
        );
        // Without minimum coherence, one polygon touches itself.
        assert_eq!(
            merged(&polys, false, false),
            vec!["(0,0;0,10;10,10;10,20;20,20;20,10;10,10;10,0)"]
        );
    }

    #[test]
    fn holes() {
        let ring = Polygon::with_holes(
            [(0, 0), (0, 100), (100, 100), (100, 0)],
            [[(20, 20), (80, 20), (80, 80), (20, 80)]],
        );
        assert_eq!(
            merged(std::slice::from_ref(&ring), false, false),
            vec!["(0,0;0,100;100,100;100,0)/(20,20;80,20;80,80;20,80)"]
        );
        assert_eq!(
            merged(std::slice::from_ref(&ring), true, false),
            vec!["(0,0;0,20;20,20;80,20;80,80;20,80;20,20;0,20;0,100;100,100;100,0)"]
        );
    }

    #[test]
    fn islands() {
        let ring = Polygon::with_holes(
            [(0, 0), (0, 100), (100, 100), (100, 0)],
            [[(10, 10), (90, 10), (90, 90), (10, 90)]],
        );
        let island = rect(20, 20, 80, 80);
        assert_eq!(
            merged(&[ring, island], false, true),
            vec![
                "(0,0;0,100;100,100;100,0)/(10,10;90,10;90,90;10,90)",
                "(20,20;20,80;80,80;80,20)",
            ]
        );
    }

    #[test]
    fn slanted_channel() {
        // The channel from the hole meets the slanted left side at x = 3.75,
        // which is rounded towards the hole.
        let p = Polygon::with_holes(
            [(0, 0), (10, 40), (50, 40), (50, 0)],
            [[(20, 25), (30, 25), (30, 15), (20, 15)]],
        );
        let out =
            EdgeProcessor::new().simple_merge(std::slice::from_ref(&p), FillRule::NonZero, true, true);
        assert_eq!(out.len(), 1);
        assert!(out[0].holes().is_empty());
        // The sliver between x = 3.75 and x = 4 is lost.
        assert_eq!(p.area() - out[0].area(), 5);
        insta::assert_snapshot!(
            out[0],
            @"(0,0;4,15;20,15;30,15;30,25;20,25;20,15;4,15;10,40;50,40;50,0)"
        );
    }

    #[test]
    fn broken_input() {
        let mut gen = PolygonGenerator::new(Vec::new(), false, false);
        gen.start();
        // An open chain.
        gen.put(Edge::new((0, 0), (0, 10)));
        gen.put(Edge::new((0, 10), (10, 10)));
        // A hole without a hull.
        let hole = [(50, 50), (60, 50), (60, 60), (50, 60)];
        for i in 0..4 {
            gen.put(Edge::new(hole[i], hole[(i + 1) % 4]));
        }
        gen.flush();
        assert!(gen.sink().is_empty());
    }

    #[test]
    fn slivers() {
        let mut filter = SliverFilter::new(Vec::new(), 5);
        filter.put(rect(0, 0, 4, 100));
        filter.put(rect(0, 0, 5, 100));
        filter.put(rect(0, 0, 100, 3));
        assert_eq!(filter.into_inner(), vec![rect(0, 0, 5, 100)]);
    }
}
