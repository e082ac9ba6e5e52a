use std::collections::BTreeSet;

use layoutsweep::{
    BinaryOp, BoxScanner, BooleanOp, ClassifyMode, Cluster, ClusterCollector, Edge, EdgeContainer,
    EdgeProcessor, InteractionMode, MergeOp, Polygon, PolygonGenerator, Rect,
    TrapezoidGenerator,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn rect(l: i32, b: i32, r: i32, t: i32) -> Polygon {
    Polygon::from_rect(Rect::new(l, b, r, t))
}

fn strings(polys: &[Polygon]) -> Vec<String> {
    let mut ret: Vec<String> = polys.iter().map(|p| p.to_string()).collect();
    ret.sort();
    ret
}

#[derive(Clone, Debug, Default)]
struct Members(BTreeSet<usize>);

impl<'a> Cluster<'a, Rect, usize> for Members {
    fn add(&mut self, _obj: &'a Rect, prop: &usize) {
        self.0.insert(*prop);
    }

    fn join(&mut self, other: Self) {
        self.0.extend(other.0);
    }
}

#[test]
fn six_boxes_make_two_clusters() {
    init_tracing();
    let boxes = [
        Rect::new(0, 210, 200, 310),
        Rect::new(10, 220, 210, 320),
        Rect::new(0, 0, 100, 100),
        Rect::new(50, 50, 150, 150),
        Rect::new(10, 10, 110, 110),
        Rect::new(100, 10, 200, 110),
    ];
    let mut scanner = BoxScanner::new();
    for (i, b) in boxes.iter().enumerate() {
        scanner.insert(b, i);
    }
    let mut collector = ClusterCollector::new(Members::default(), false);
    assert!(scanner.process(&mut collector, 1, &|r: &Rect| *r));
    let mut clusters: Vec<BTreeSet<usize>> = collector.into_clusters().into_iter().map(|c| c.0).collect();
    clusters.sort();
    assert_eq!(
        clusters,
        vec![BTreeSet::from([0, 1]), BTreeSet::from([2, 3, 4, 5])]
    );
}

#[test]
fn xor_ring_as_trapezoids() {
    init_tracing();
    let traps = EdgeProcessor::new().boolean_to_trapezoids(
        &[rect(0, 0, 1000, 1000)],
        &[rect(100, 100, 800, 800)],
        BinaryOp::Xor,
    );
    insta::assert_debug_snapshot!(strings(&traps), @r#"
    [
        "(0,0;0,1000;100,1000;100,0)",
        "(100,0;100,100;800,100;800,0)",
        "(100,800;100,1000;800,1000;800,800)",
        "(800,0;800,1000;1000,1000;1000,0)",
    ]
    "#);
    let area: i64 = traps.iter().map(Polygon::area).sum();
    assert_eq!(area, 1000 * 1000 - 700 * 700);
}

#[test]
fn sizing_a_box() {
    init_tracing();
    let square = [rect(0, 0, 100, 100)];
    let mut ep = EdgeProcessor::new();
    assert!(ep.size(&square, -75, -75, 2, false, false).unwrap().is_empty());
    let inset = ep.size(&square, -25, -25, 2, false, false).unwrap();
    assert_eq!(inset, vec![rect(25, 25, 75, 75)]);
}

#[test]
fn coverage_levels() {
    init_tracing();
    // Three stacked boxes: one layer everywhere, two in the middle, three in the center.
    let polys = [rect(0, 0, 30, 10), rect(10, 0, 40, 10), rect(15, 0, 25, 10)];
    let mut ep = EdgeProcessor::new();
    let counts: Vec<Vec<String>> = (0..3)
        .map(|c| strings(&ep.merge(&polys, c, 0, false, true)))
        .collect();
    assert_eq!(
        counts,
        vec![
            vec!["(0,0;0,10;40,10;40,0)".to_owned()],
            vec!["(10,0;10,10;30,10;30,0)".to_owned()],
            vec!["(15,0;15,10;25,10;25,0)".to_owned()],
        ]
    );
}

#[test]
fn several_results_in_one_pass() {
    init_tracing();
    let mut ep = EdgeProcessor::new();
    ep.insert_polygon(&rect(0, 0, 20, 20), 0);
    ep.insert_polygon(&rect(10, 10, 30, 30), 1);

    let mut and = PolygonGenerator::new(Vec::new(), false, true);
    let mut or = PolygonGenerator::new(Vec::new(), false, true);
    let mut traps = TrapezoidGenerator::new(Vec::new());
    let mut edges = EdgeContainer::new();
    let mut e_and = BooleanOp::new(BinaryOp::And);
    let mut e_or = BooleanOp::new(BinaryOp::Or);
    let mut e_xor = BooleanOp::new(BinaryOp::Xor);
    let mut e_merge = MergeOp::new(1);
    ep.process_many(&mut [
        (&mut and, &mut e_and),
        (&mut or, &mut e_or),
        (&mut traps, &mut e_xor),
        (&mut edges, &mut e_merge),
    ]);
    assert_eq!(and.into_sink(), vec![rect(10, 10, 20, 20)]);
    assert_eq!(or.sink().len(), 1);
    assert_eq!(or.sink()[0].area(), 700);
    let xor_area: i64 = traps.sink().iter().map(Polygon::area).sum();
    assert_eq!(xor_area, 600);
    // Coverage above one is the intersection again.
    assert_eq!(edges.edges().len(), 4);
}

#[test]
fn interactions_with_background() {
    init_tracing();
    let polys = [
        rect(0, 0, 100, 100),
        rect(10, 10, 20, 20),
        rect(90, 10, 110, 20),
        rect(100, 50, 120, 60),
        rect(300, 0, 310, 10),
    ];
    let mut ep = EdgeProcessor::new();
    assert_eq!(
        ep.interactions(&polys, InteractionMode::Inside { background: 0 }),
        vec![(0, 1)]
    );
    assert_eq!(
        ep.interactions(&polys, InteractionMode::Outside { background: 0 }),
        vec![(0, 2), (0, 3)]
    );
    assert_eq!(
        ep.interactions(&polys, InteractionMode::Touching),
        vec![(0, 1), (0, 2), (0, 3)]
    );
}

#[test]
fn classify_edges_both_ways() {
    init_tracing();
    let edges = [Edge::new((-10, 5), (30, 5)), Edge::new((50, 0), (50, 10))];
    let polys = [rect(0, 0, 20, 10)];
    let (inside, outside) =
        EdgeProcessor::new().classify_edges(&edges, &polys, ClassifyMode::Both, false);
    assert_eq!(inside, vec![Edge::new((0, 5), (20, 5))]);
    let mut outside = outside;
    outside.sort_by_key(|e| (e.p1, e.p2));
    assert_eq!(
        outside,
        vec![
            Edge::new((-10, 5), (0, 5)),
            Edge::new((20, 5), (30, 5)),
            Edge::new((50, 0), (50, 10)),
        ]
    );
}
