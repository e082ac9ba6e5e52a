//! Merging a stream of shapes while keeping their properties apart.
//!
//! Shapes are only merged with shapes carrying the same properties. The box
//! scanner finds the groups of touching shapes, and each group is merged by its
//! own edge processor pass, so the cost of a pass stays proportional to the
//! size of one group rather than of the whole input.

use tracing::debug;

use crate::box_scanner::{BoxScanner, BoxScannerReceiver};
use crate::cluster::{Cluster, ClusterCollector};
use crate::evaluator::{FillRule, SimpleMerge};
use crate::geom::Polygon;
use crate::properties::{PropertiesId, PropertyTagged};
use crate::polygon_gen::PolygonGenerator;
use crate::EdgeProcessor;

type Shape = PropertyTagged<Polygon>;

// Passes on only the interactions between shapes with equal properties.
struct SameProperties<R>(R);

impl<'a, R> BoxScannerReceiver<'a, Shape, PropertiesId> for SameProperties<R>
where
    R: BoxScannerReceiver<'a, Shape, PropertiesId>,
{
    fn initialize(&mut self) {
        self.0.initialize();
    }

    fn add(&mut self, o1: &'a Shape, p1: &PropertiesId, o2: &'a Shape, p2: &PropertiesId) {
        if p1 == p2 {
            self.0.add(o1, p1, o2, p2);
        }
    }

    fn stop(&self) -> bool {
        self.0.stop()
    }

    fn finish(&mut self, obj: &'a Shape, prop: &PropertiesId) {
        self.0.finish(obj, prop);
    }

    fn finalize(&mut self, aborted: bool) {
        self.0.finalize(aborted);
    }
}

#[derive(Clone, Debug)]
struct MergeCluster<'a> {
    resolve_holes: bool,
    min_coherence: bool,
    properties_id: PropertiesId,
    members: Vec<&'a Polygon>,
    merged: Vec<Polygon>,
}

impl<'a> Cluster<'a, Shape, PropertiesId> for MergeCluster<'a> {
    fn add(&mut self, obj: &'a Shape, prop: &PropertiesId) {
        self.properties_id = *prop;
        self.members.push(&obj.value);
    }

    fn join(&mut self, other: Self) {
        debug_assert_eq!(self.properties_id, other.properties_id);
        self.members.extend(other.members);
    }

    fn finish(&mut self) {
        let mut ep = EdgeProcessor::new();
        for p in self.members.drain(..) {
            ep.insert_polygon(p, 0);
        }
        let mut gen = PolygonGenerator::new(Vec::new(), self.resolve_holes, self.min_coherence);
        ep.process(&mut gen, &mut SimpleMerge::new(FillRule::NonZero));
        self.merged = gen.into_sink();
    }
}

/// Merges touching or overlapping shapes with equal properties.
///
/// Every resulting polygon carries the properties of the shapes it was made
/// of. Shapes touching nothing come out on their own (normalized).
pub fn merge_by_property(
    shapes: &[PropertyTagged<Polygon>],
    resolve_holes: bool,
    min_coherence: bool,
) -> Vec<PropertyTagged<Polygon>> {
    let mut scanner = BoxScanner::new();
    scanner.reserve(shapes.len());
    for s in shapes.iter().filter(|s| !s.value.is_empty()) {
        scanner.insert(s, s.properties_id);
    }
    let prototype = MergeCluster {
        resolve_holes,
        min_coherence,
        properties_id: PropertiesId::EMPTY,
        members: Vec::new(),
        merged: Vec::new(),
    };
    let mut collector = SameProperties(ClusterCollector::new(prototype, true));
    scanner.process(&mut collector, 1, &|s: &Shape| s.value.bbox());

    let clusters = collector.0.into_clusters();
    debug!(
        shapes = shapes.len(),
        clusters = clusters.len(),
        "merged by property"
    );
    clusters
        .into_iter()
        .flat_map(|c| {
            let id = c.properties_id;
            c.merged
                .into_iter()
                .map(move |p| PropertyTagged::new(p, id))
        })
        .collect()
}
