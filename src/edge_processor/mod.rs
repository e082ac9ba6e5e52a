//! The exact boolean / merge / sizing engine.
//!
//! Edges are inserted with a tag (an operand or member id), normalized once,
//! and then swept as often as needed: [`EdgeProcessor::process`] normalizes and
//! sweeps, [`EdgeProcessor::redo`] sweeps the previously normalized input
//! again with another evaluator. [`EdgeProcessor::process_many`] feeds several
//! evaluators from one sweep.

mod snap;
mod sweep;

use tracing::debug;

use crate::evaluator::{
    BinaryOp, BooleanOp, ClassifyMode, EdgePolygonClassifier, Evaluator, FillRule, MergeOp,
    SimpleMerge,
};
use crate::geom::{Coord, Edge, Polygon, Rect};
use crate::interaction::{InteractionDetector, InteractionMode};
use crate::polygon_gen::{PolygonGenerator, SliverFilter};
use crate::sink::{EdgeContainer, EdgeSink};
use crate::sizing::{offset_contour, SizingMode};
use crate::trapezoid::TrapezoidGenerator;
use crate::Error;

use snap::{InputEdge, Prepared};
use sweep::Channel;

/// Collects tagged edges and runs evaluators over them.
///
/// Polygons are inserted as their directed boundary edges; raw edges can be
/// mixed in freely. Inserting anything discards the cached normalization.
#[derive(Clone, Debug)]
pub struct EdgeProcessor {
    input: Vec<InputEdge>,
    merge_duplicates: bool,
    prepared: Option<Prepared>,
}

impl Default for EdgeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeProcessor {
    /// Creates an empty processor.
    pub fn new() -> Self {
        EdgeProcessor {
            input: Vec::new(),
            merge_duplicates: true,
            prepared: None,
        }
    }

    /// Whether identical normalized edges of the same tag get combined.
    ///
    /// This is on by default. It never changes the result, only the work done by
    /// the sweep: a merged fragment remembers how many copies went into it in
    /// each direction, so edge classification still reports every copy.
    pub fn set_merge_duplicates(&mut self, merge: bool) {
        if merge != self.merge_duplicates {
            self.prepared = None;
        }
        self.merge_duplicates = merge;
    }

    /// See [`EdgeProcessor::set_merge_duplicates`].
    pub fn merge_duplicates(&self) -> bool {
        self.merge_duplicates
    }

    /// Removes all edges.
    pub fn clear(&mut self) {
        self.input.clear();
        self.prepared = None;
    }

    /// Reserves space for `n` more edges.
    pub fn reserve(&mut self, n: usize) {
        self.input.reserve(n);
    }

    /// The number of edges inserted since the last [`clear`](Self::clear).
    pub fn edge_count(&self) -> usize {
        self.input.len()
    }

    /// Inserts a single edge. Degenerate edges are accepted and ignored.
    pub fn insert_edge(&mut self, edge: Edge, tag: u32) {
        self.prepared = None;
        self.input.push(InputEdge { edge, tag });
    }

    /// Inserts a sequence of edges.
    pub fn insert_edges(&mut self, edges: impl IntoIterator<Item = Edge>, tag: u32) {
        self.prepared = None;
        self.input
            .extend(edges.into_iter().map(|edge| InputEdge { edge, tag }));
    }

    /// Inserts the boundary of a polygon, holes included.
    pub fn insert_polygon(&mut self, polygon: &Polygon, tag: u32) {
        self.insert_edges(polygon.edges(), tag);
    }

    /// Inserts several polygons with the same tag.
    pub fn insert_polygons<'p>(&mut self, polygons: impl IntoIterator<Item = &'p Polygon>, tag: u32) {
        for p in polygons {
            self.insert_polygon(p, tag);
        }
    }

    /// Inserts the boundary of a rectangle.
    pub fn insert_rect(&mut self, rect: &Rect, tag: u32) {
        self.insert_polygon(&Polygon::from_rect(*rect), tag);
    }

    fn prepare(&mut self) -> &Prepared {
        let merge = self.merge_duplicates;
        let input = &self.input;
        self.prepared.get_or_insert_with(|| {
            let prep = snap::prepare(input, merge);
            debug!(
                input_edges = input.len(),
                edges = prep.edges.len(),
                verticals = prep.verticals.len(),
                slabs = prep.xs.len().saturating_sub(1),
                "normalized"
            );
            prep
        })
    }

    /// Normalizes the input and runs one evaluator over it.
    pub fn process<S: EdgeSink, E: Evaluator>(&mut self, sink: &mut S, eval: &mut E) {
        self.prepared = None;
        self.redo(sink, eval);
    }

    /// Runs another evaluator over the input, reusing the last normalization.
    pub fn redo<S: EdgeSink, E: Evaluator>(&mut self, sink: &mut S, eval: &mut E) {
        let prep = self.prepare();
        sweep::sweep(prep, &mut [Channel::new(sink, eval)]);
        debug!("pass done");
    }

    /// Normalizes the input and runs several evaluators in one sweep.
    pub fn process_many(&mut self, procs: &mut [(&mut dyn EdgeSink, &mut dyn Evaluator)]) {
        self.prepared = None;
        self.redo_many(procs);
    }

    /// Like [`process_many`](Self::process_many), reusing the last normalization.
    pub fn redo_many(&mut self, procs: &mut [(&mut dyn EdgeSink, &mut dyn Evaluator)]) {
        let prep = self.prepare();
        let mut channels: Vec<Channel<'_>> = procs
            .iter_mut()
            .map(|(sink, eval)| Channel::new(&mut **sink, &mut **eval))
            .collect();
        sweep::sweep(prep, &mut channels);
        debug!(evaluators = channels.len(), "pass done");
    }

    fn into_polygons<E: Evaluator>(
        &mut self,
        eval: &mut E,
        resolve_holes: bool,
        min_coherence: bool,
    ) -> Vec<Polygon> {
        let mut gen = PolygonGenerator::new(Vec::new(), resolve_holes, min_coherence);
        self.process(&mut gen, eval);
        let out = gen.into_sink();
        debug!(polygons = out.len(), "polygons generated");
        out
    }

    /// Computes a boolean operation between two sets of polygons.
    pub fn boolean(
        &mut self,
        a: &[Polygon],
        b: &[Polygon],
        op: BinaryOp,
        resolve_holes: bool,
        min_coherence: bool,
    ) -> Vec<Polygon> {
        self.clear();
        self.insert_polygons(a, 0);
        self.insert_polygons(b, 1);
        self.into_polygons(&mut BooleanOp::new(op), resolve_holes, min_coherence)
    }

    /// Computes a boolean operation between two sets of polygons as trapezoids.
    pub fn boolean_to_trapezoids(&mut self, a: &[Polygon], b: &[Polygon], op: BinaryOp) -> Vec<Polygon> {
        self.clear();
        self.insert_polygons(a, 0);
        self.insert_polygons(b, 1);
        let mut gen = TrapezoidGenerator::new(Vec::new());
        self.process(&mut gen, &mut BooleanOp::new(op));
        gen.into_sink()
    }

    /// Merges polygons, keeping the area covered by more than `min_coverage` of them.
    ///
    /// Result polygons narrower than `resolution` in x or y are dropped; use 0
    /// to keep everything.
    pub fn merge(
        &mut self,
        polygons: &[Polygon],
        min_coverage: u32,
        resolution: Coord,
        resolve_holes: bool,
        min_coherence: bool,
    ) -> Vec<Polygon> {
        self.clear();
        for (tag, p) in (0u32..).zip(polygons) {
            self.insert_polygon(p, tag);
        }
        let filter = SliverFilter::new(Vec::new(), resolution);
        let mut gen = PolygonGenerator::new(filter, resolve_holes, min_coherence);
        self.process(&mut gen, &mut MergeOp::new(min_coverage));
        gen.into_sink().into_inner()
    }

    /// Merges polygons by applying `rule` to the sum of their winding numbers.
    pub fn simple_merge(
        &mut self,
        polygons: &[Polygon],
        rule: FillRule,
        resolve_holes: bool,
        min_coherence: bool,
    ) -> Vec<Polygon> {
        self.clear();
        self.insert_polygons(polygons, 0);
        self.into_polygons(&mut SimpleMerge::new(rule), resolve_holes, min_coherence)
    }

    /// Grows (positive) or shrinks (negative) polygons by `dx` horizontally and `dy` vertically.
    ///
    /// `mode` (0 to 5) says how sharp a corner may be before it is cut off
    /// instead of extended; see [`SizingMode`].
    pub fn size(
        &mut self,
        polygons: &[Polygon],
        dx: Coord,
        dy: Coord,
        mode: u32,
        resolve_holes: bool,
        min_coherence: bool,
    ) -> Result<Vec<Polygon>, Error> {
        let mode = SizingMode::try_from(mode)?;
        self.size_with(polygons, dx, dy, mode, resolve_holes, min_coherence)
    }

    fn size_with(
        &mut self,
        polygons: &[Polygon],
        dx: Coord,
        dy: Coord,
        mode: SizingMode,
        resolve_holes: bool,
        min_coherence: bool,
    ) -> Result<Vec<Polygon>, Error> {
        // Growing in one direction while shrinking in the other is done in two steps.
        if (dx < 0 && dy > 0) || (dx > 0 && dy < 0) {
            let first = self.size_with(polygons, dx, 0, mode, false, min_coherence)?;
            return self.size_with(&first, 0, dy, mode, resolve_holes, min_coherence);
        }

        let merged = self.simple_merge(polygons, FillRule::NonZero, false, min_coherence);
        self.clear();
        for p in &merged {
            for contour in std::iter::once(p.hull()).chain(p.holes().iter().map(Vec::as_slice)) {
                let edges = offset_contour(contour, dx, dy, mode)?;
                self.insert_edges(edges, 0);
            }
        }
        debug!(dx, dy, ?mode, polygons = merged.len(), "sizing");
        Ok(self.into_polygons(
            &mut SimpleMerge::new(FillRule::Positive),
            resolve_holes,
            min_coherence,
        ))
    }

    /// Finds interacting polygons. Member ids are indices into `polygons`.
    pub fn interactions(&mut self, polygons: &[Polygon], mode: InteractionMode) -> Vec<(u32, u32)> {
        self.clear();
        for (tag, p) in (0u32..).zip(polygons) {
            self.insert_polygon(p, tag);
        }
        let mut detector = InteractionDetector::new(mode);
        self.process(&mut EdgeContainer::new(), &mut detector);
        detector.into_pairs()
    }

    /// Cuts edges at polygon boundaries and sorts the pieces into inside and outside.
    ///
    /// Returns `(inside, outside)`; depending on `mode` one of them is empty.
    pub fn classify_edges(
        &mut self,
        edges: &[Edge],
        polygons: &[Polygon],
        mode: ClassifyMode,
        include_touching: bool,
    ) -> (Vec<Edge>, Vec<Edge>) {
        self.clear();
        self.insert_edges(edges.iter().copied(), 0);
        self.insert_polygons(polygons, 1);
        let mut eval = EdgePolygonClassifier::new(mode, include_touching);

        let mut secondary = EdgeContainer::with_tag(1);
        let primary = {
            let mut primary = EdgeContainer::with_secondary(0, &mut secondary);
            self.process(&mut primary, &mut eval);
            primary.into_edges()
        };
        match mode {
            ClassifyMode::Inside => (primary, Vec::new()),
            ClassifyMode::Outside => (Vec::new(), primary),
            ClassifyMode::Both => (primary, secondary.into_edges()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn square(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> Polygon {
        Polygon::from_rect(Rect::new(x0, y0, x1, y1))
    }

    #[test]
    fn redo_reuses_the_input() {
        let mut ep = EdgeProcessor::new();
        ep.insert_rect(&Rect::new(0, 0, 10, 10), 0);
        ep.insert_rect(&Rect::new(5, 5, 15, 15), 1);
        assert_eq!(ep.edge_count(), 8);

        let mut and = PolygonGenerator::new(Vec::new(), true, false);
        ep.process(&mut and, &mut BooleanOp::new(BinaryOp::And));
        let mut or = PolygonGenerator::new(Vec::new(), true, false);
        ep.redo(&mut or, &mut BooleanOp::new(BinaryOp::Or));

        assert_eq!(and.into_sink(), vec![square(5, 5, 10, 10)]);
        let or = or.into_sink();
        assert_eq!(or.len(), 1);
        assert_eq!(or[0].area(), 175);
    }

    #[test]
    fn many_evaluators_one_pass() {
        let mut ep = EdgeProcessor::new();
        ep.insert_rect(&Rect::new(0, 0, 10, 10), 0);
        ep.insert_rect(&Rect::new(5, 5, 15, 15), 1);

        let mut and = PolygonGenerator::new(Vec::new(), true, false);
        let mut xor = PolygonGenerator::new(Vec::new(), true, true);
        let mut and_eval = BooleanOp::new(BinaryOp::And);
        let mut xor_eval = BooleanOp::new(BinaryOp::Xor);
        ep.process_many(&mut [(&mut and, &mut and_eval), (&mut xor, &mut xor_eval)]);

        assert_eq!(and.into_sink().len(), 1);
        let xor = xor.into_sink();
        assert_eq!(xor.len(), 2);
        assert_eq!(xor.iter().map(Polygon::area).sum::<i64>(), 150);
    }

    #[test]
    fn duplicate_merging_does_not_change_results() {
        let polys = vec![square(0, 0, 10, 10), square(0, 0, 10, 10), square(10, 0, 20, 10)];
        let mut ep = EdgeProcessor::new();
        let merged = ep.simple_merge(&polys, FillRule::NonZero, true, false);
        ep.set_merge_duplicates(false);
        assert!(!ep.merge_duplicates());
        let unmerged = ep.simple_merge(&polys, FillRule::NonZero, true, false);
        assert_eq!(merged, unmerged);
        assert_eq!(merged, vec![square(0, 0, 20, 10)]);
    }

    #[test]
    fn coverage() {
        let polys = vec![square(0, 0, 10, 10), square(5, 0, 15, 10), square(8, 0, 20, 10)];
        let mut ep = EdgeProcessor::new();
        assert_eq!(ep.merge(&polys, 0, 0, true, false), vec![square(0, 0, 20, 10)]);
        assert_eq!(ep.merge(&polys, 1, 0, true, false), vec![square(5, 0, 15, 10)]);
        assert_eq!(ep.merge(&polys, 2, 0, true, false), vec![square(8, 0, 10, 10)]);
        // The triple overlap is only 2 wide.
        assert!(ep.merge(&polys, 2, 3, true, false).is_empty());
    }

    #[test]
    fn sizing_errors() {
        let mut ep = EdgeProcessor::new();
        let r = ep.size(&[square(0, 0, 10, 10)], 1, 1, 6, true, false);
        assert_matches!(r, Err(Error::InvalidSizingMode(6)));
    }

    #[test]
    fn classification() {
        let mut ep = EdgeProcessor::new();
        let edges = [Edge::new((-5, 5), (15, 5))];
        let polys = [square(0, 0, 10, 10)];
        let (inside, outside) = ep.classify_edges(&edges, &polys, ClassifyMode::Both, false);
        assert_eq!(inside, vec![Edge::new((0, 5), (10, 5))]);
        assert_eq!(outside.len(), 2);

        let (inside, outside) = ep.classify_edges(&edges, &polys, ClassifyMode::Outside, false);
        assert!(inside.is_empty());
        assert_eq!(outside.len(), 2);
    }

    #[test]
    fn classification_keeps_repeated_and_opposite_edges() {
        let edges = [
            Edge::new((2, 5), (8, 5)),
            Edge::new((8, 5), (2, 5)),
            Edge::new((12, 5), (18, 5)),
            Edge::new((12, 5), (18, 5)),
        ];
        let polys = [square(0, 0, 20, 10)];
        let key = |e: &Edge| (e.p1, e.p2);

        let mut ep = EdgeProcessor::new();
        let (mut merged, _) = ep.classify_edges(&edges, &polys, ClassifyMode::Inside, false);
        merged.sort_by_key(key);
        let mut expected = edges.to_vec();
        expected.sort_by_key(key);
        assert_eq!(merged, expected);

        ep.set_merge_duplicates(false);
        let (mut unmerged, _) = ep.classify_edges(&edges, &polys, ClassifyMode::Inside, false);
        unmerged.sort_by_key(key);
        assert_eq!(merged, unmerged);
    }

    #[test]
    fn redo_sees_new_edges() {
        let mut ep = EdgeProcessor::new();
        ep.insert_rect(&Rect::new(0, 0, 10, 10), 0);
        let mut first = PolygonGenerator::new(Vec::new(), true, false);
        ep.process(&mut first, &mut BooleanOp::new(BinaryOp::Or));
        assert_eq!(first.into_sink(), vec![square(0, 0, 10, 10)]);

        // The new rect crosses the old one, so the old edges have to be split
        // again before the next pass.
        ep.insert_rect(&Rect::new(5, -5, 15, 5), 0);
        let mut second = PolygonGenerator::new(Vec::new(), true, false);
        ep.redo(&mut second, &mut BooleanOp::new(BinaryOp::Or));
        let second = second.into_sink();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].area(), 175);
        assert_eq!(second[0].bbox(), Rect::new(0, -5, 15, 10));
    }
}
