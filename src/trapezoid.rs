//! Decomposing results into trapezoids with vertical sides.

use std::collections::BTreeMap;

use tracing::trace;

use crate::geom::{Coord, Edge, Polygon};
use crate::num::y_at;
use crate::sink::{EdgeSink, Span, SpanEdge};

#[derive(Clone, Copy, Debug)]
struct OpenTrap {
    x0: Coord,
    x1: Coord,
    lower: Edge,
    upper: Edge,
}

impl OpenTrap {
    fn to_polygon(self) -> Polygon {
        let at = |e: &Edge, x: Coord| y_at(e, x).round_coord();
        Polygon::new([
            (self.x0, at(&self.lower, self.x0)),
            (self.x0, at(&self.upper, self.x0)),
            (self.x1, at(&self.upper, self.x1)),
            (self.x1, at(&self.lower, self.x1)),
        ])
    }
}

/// Turns the strips of a result into trapezoids.
///
/// Strips of neighbouring slabs are joined as long as they are bounded by the
/// same two edges, so every trapezoid is as wide as its bounding edges allow.
/// Corners that don't fall onto the grid are rounded. Trapezoids degenerating
/// to triangles come out as triangles.
#[derive(Debug)]
pub struct TrapezoidGenerator<S> {
    sink: S,
    open: BTreeMap<(usize, usize), OpenTrap>,
}

impl<S: crate::PolygonSink> TrapezoidGenerator<S> {
    /// Creates a generator feeding `sink`.
    pub fn new(sink: S) -> Self {
        TrapezoidGenerator {
            sink,
            open: BTreeMap::new(),
        }
    }

    /// The sink receiving our trapezoids.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn close_before(&mut self, x: Option<Coord>) {
        let done: Vec<(usize, usize)> = self
            .open
            .iter()
            .filter(|(_, t)| x.map_or(true, |x| t.x1 < x))
            .map(|(k, _)| *k)
            .collect();
        for k in done {
            if let Some(t) = self.open.remove(&k) {
                let p = t.to_polygon();
                if !p.is_empty() {
                    self.sink.put(p);
                }
            }
        }
    }
}

impl<S: crate::PolygonSink> EdgeSink for TrapezoidGenerator<S> {
    fn start(&mut self) {
        self.open.clear();
        self.sink.start();
    }

    // Only the strips matter.
    fn put(&mut self, _edge: Edge) {}

    fn span(&mut self, span: &Span) {
        let Span {
            x0,
            x1,
            lower: SpanEdge { id: lo, edge: lower },
            upper: SpanEdge { id: up, edge: upper },
        } = *span;
        self.close_before(Some(x0));
        match self.open.get_mut(&(lo, up)) {
            Some(t) if t.x1 == x0 => t.x1 = x1,
            _ => {
                trace!(x0, lo, up, "new trapezoid");
                if let Some(old) = self.open.insert((lo, up), OpenTrap { x0, x1, lower, upper }) {
                    let p = old.to_polygon();
                    if !p.is_empty() {
                        self.sink.put(p);
                    }
                }
            }
        }
    }

    fn flush(&mut self) {
        self.close_before(None);
        self.sink.flush();
    }
}

#[cfg(test)]
mod tests {
    use crate::{BinaryOp, EdgeProcessor, Polygon, Rect};

    fn traps(a: &[Polygon], b: &[Polygon], op: BinaryOp) -> Vec<String> {
        let mut out: Vec<String> = EdgeProcessor::new()
            .boolean_to_trapezoids(a, b, op)
            .iter()
            .map(|p| p.to_string())
            .collect();
        out.sort();
        out
    }

    fn rect(l: i32, b: i32, r: i32, t: i32) -> Polygon {
        Polygon::from_rect(Rect::new(l, b, r, t))
    }

    #[test]
    fn ring() {
        let out = traps(&[rect(0, 0, 100, 100)], &[rect(20, 20, 80, 80)], BinaryOp::Xor);
        assert_eq!(
            out,
            vec![
                "(0,0;0,100;20,100;20,0)",
                "(20,0;20,20;80,20;80,0)",
                "(20,80;20,100;80,100;80,80)",
                "(80,0;80,100;100,100;100,0)",
            ]
        );
    }

    #[test]
    fn slanted() {
        // A diamond becomes two triangles.
        let diamond = Polygon::new([(0, 50), (50, 100), (100, 50), (50, 0)]);
        let out = traps(&[diamond], &[], BinaryOp::Or);
        assert_eq!(out, vec!["(0,50;50,100;50,0)", "(50,0;50,100;100,50)"]);
    }

    #[test]
    fn empty() {
        assert!(traps(&[rect(0, 0, 10, 10)], &[rect(20, 0, 30, 10)], BinaryOp::And).is_empty());
    }
}
