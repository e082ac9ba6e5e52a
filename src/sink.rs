//! Where the edge processor's results go.

use crate::geom::{Coord, Edge, Polygon};

/// One of the two edges bounding a [`Span`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanEdge {
    /// An id that stays the same for as long as this edge bounds spans.
    pub id: usize,
    /// The (normalized) edge. It runs from left to right.
    pub edge: Edge,
}

/// A vertical strip of the result between two consecutive sweep positions.
///
/// The strip covers `x0 <= x <= x1` between the lower and the upper edge; it is
/// a trapezoid with vertical sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    /// The left end of the strip.
    pub x0: Coord,
    /// The right end of the strip.
    pub x1: Coord,
    /// The edge bounding the strip from below.
    pub lower: SpanEdge,
    /// The edge bounding the strip from above.
    pub upper: SpanEdge,
}

/// Receives result edges from the edge processor.
pub trait EdgeSink {
    /// Called at the start of each pass.
    fn start(&mut self) {}

    /// Receives a boundary edge of the result region. The region is on its right.
    fn put(&mut self, edge: Edge);

    /// Receives a classified edge with an output tag (see
    /// [`Evaluator::probe_output`](crate::Evaluator::probe_output)).
    ///
    /// By default the tag is ignored.
    fn put_tagged(&mut self, edge: Edge, tag: u32) {
        let _ = tag;
        self.put(edge);
    }

    /// Receives one vertical strip of the result region.
    fn span(&mut self, _span: &Span) {}

    /// Called at the end of each pass.
    fn flush(&mut self) {}
}

impl<S: EdgeSink + ?Sized> EdgeSink for &mut S {
    fn start(&mut self) {
        (**self).start();
    }

    fn put(&mut self, edge: Edge) {
        (**self).put(edge);
    }

    fn put_tagged(&mut self, edge: Edge, tag: u32) {
        (**self).put_tagged(edge, tag);
    }

    fn span(&mut self, span: &Span) {
        (**self).span(span);
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}

/// Receives polygons, for example from a [`PolygonGenerator`](crate::PolygonGenerator).
pub trait PolygonSink {
    /// Called at the start of each pass.
    fn start(&mut self) {}

    /// Receives a polygon.
    fn put(&mut self, polygon: Polygon);

    /// Called at the end of each pass.
    fn flush(&mut self) {}
}

impl PolygonSink for Vec<Polygon> {
    fn put(&mut self, polygon: Polygon) {
        self.push(polygon);
    }
}

impl<S: PolygonSink + ?Sized> PolygonSink for &mut S {
    fn start(&mut self) {
        (**self).start();
    }

    fn put(&mut self, polygon: Polygon) {
        (**self).put(polygon);
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}

/// Collects edges.
///
/// Edges carrying this container's tag (0 unless configured otherwise) are
/// stored; with a secondary sink, all other tagged edges are forwarded there.
/// Untagged edges are always stored.
#[derive(Default)]
pub struct EdgeContainer<'s> {
    edges: Vec<Edge>,
    tag: u32,
    secondary: Option<&'s mut dyn EdgeSink>,
}

impl std::fmt::Debug for EdgeContainer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeContainer")
            .field("edges", &self.edges)
            .field("tag", &self.tag)
            .field("secondary", &self.secondary.is_some())
            .finish()
    }
}

impl<'s> EdgeContainer<'s> {
    /// Creates an empty container for tag 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty container for edges tagged `tag`.
    pub fn with_tag(tag: u32) -> Self {
        EdgeContainer {
            tag,
            ..Self::default()
        }
    }

    /// Creates a container that keeps edges tagged `tag` and forwards the others.
    pub fn with_secondary(tag: u32, secondary: &'s mut dyn EdgeSink) -> Self {
        EdgeContainer {
            edges: Vec::new(),
            tag,
            secondary: Some(secondary),
        }
    }

    /// The edges collected so far.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Takes the collected edges.
    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }
}

impl EdgeSink for EdgeContainer<'_> {
    fn start(&mut self) {
        if let Some(s) = self.secondary.as_mut() {
            s.start();
        }
    }

    fn put(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    fn put_tagged(&mut self, edge: Edge, tag: u32) {
        if tag == self.tag {
            self.edges.push(edge);
        } else if let Some(s) = self.secondary.as_mut() {
            s.put_tagged(edge, tag);
        }
    }

    fn flush(&mut self) {
        if let Some(s) = self.secondary.as_mut() {
            s.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out() {
        let e = Edge::new((0, 0), (1, 0));
        let f = Edge::new((0, 1), (1, 1));
        let mut secondary = EdgeContainer::with_tag(1);
        {
            let mut primary = EdgeContainer::with_secondary(0, &mut secondary);
            primary.start();
            primary.put_tagged(e, 0);
            primary.put_tagged(f, 1);
            primary.put_tagged(f, 7);
            primary.put(e);
            primary.flush();
            assert_eq!(primary.edges(), &[e, e]);
        }
        // Tag 7 matches neither container, so it is dropped.
        assert_eq!(secondary.into_edges(), vec![f]);
    }
}
