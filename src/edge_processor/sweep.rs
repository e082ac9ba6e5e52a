//! The sweep itself.
//!
//! The plane is cut into vertical slabs at every x coordinate where a fragment
//! starts or ends. Inside a slab, the active fragments never cross, so they can
//! be ordered from bottom to top once; walking them in that order gives the
//! winding numbers of every region in the slab. The boundary of the result is
//! made of the fragments where an evaluator's answer changes, plus vertical
//! pieces at the slab boundaries ("cuts") wherever the inside of the left slab
//! differs from the inside of the right one.

use std::collections::BTreeMap;

use tracing::trace;

use super::snap::{EdgeIdx, EdgeVec, Prepared, SweepEdge};
use crate::evaluator::{Evaluator, ProbeClass, Windings};
use crate::geom::{Coord, Edge, Point};
use crate::num::{y_at, Rational};
use crate::sink::{EdgeSink, Span, SpanEdge};

type Interval = (Rational, Rational);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum RunKind {
    // The region is below, so the result edge goes towards +x.
    Forward,
    Backward,
    Probe(u32),
}

// A piece of a fragment that has been part of the output since `x0`.
#[derive(Clone, Copy, Debug)]
struct Run {
    x0: Coord,
    x1: Coord,
}

/// A sink and the evaluator feeding it.
pub(crate) struct Channel<'c> {
    sink: &'c mut dyn EdgeSink,
    eval: &'c mut dyn Evaluator,
    region: bool,
    probe: Option<u32>,
    contacts: bool,
    // Is the region we're currently walking through inside?
    inside: bool,
    runs: BTreeMap<(EdgeIdx, RunKind), Run>,
    span_lower: Option<EdgeIdx>,
    open: Option<Interval>,
    // The inside intervals on the current cut, seen from the left and the
    // right, and on the next cut, seen from the left.
    left: Vec<Interval>,
    right: Vec<Interval>,
    next_left: Vec<Interval>,
}

impl<'c> Channel<'c> {
    pub fn new(sink: &'c mut dyn EdgeSink, eval: &'c mut dyn Evaluator) -> Self {
        Channel {
            sink,
            eval,
            region: true,
            probe: None,
            contacts: false,
            inside: false,
            runs: BTreeMap::new(),
            span_lower: None,
            open: None,
            left: Vec::new(),
            right: Vec::new(),
            next_left: Vec::new(),
        }
    }

    fn start(&mut self) {
        self.eval.reset();
        self.region = self.eval.emits_region();
        self.probe = self.eval.probe_tag();
        self.contacts = self.eval.wants_contacts();
        self.runs.clear();
        self.left.clear();
        self.right.clear();
        self.next_left.clear();
        self.sink.start();
    }

    fn extend_run(&mut self, idx: EdgeIdx, kind: RunKind, xa: Coord, xb: Coord) {
        let run = self
            .runs
            .entry((idx, kind))
            .or_insert(Run { x0: xa, x1: xa });
        debug_assert_eq!(run.x1, xa);
        run.x1 = xb;
    }

    // Emits every run that didn't make it to `until` (or all of them).
    fn flush_runs(&mut self, edges: &EdgeVec<SweepEdge>, until: Option<Coord>) {
        let sink = &mut *self.sink;
        self.runs.retain(|&(idx, kind), run| {
            if Some(run.x1) == until {
                return true;
            }
            emit_run(sink, &edges[idx], kind, *run);
            false
        });
    }

    fn finish(&mut self, edges: &EdgeVec<SweepEdge>) {
        self.flush_runs(edges, None);
        self.sink.flush();
        self.eval.finish();
    }
}

fn emit_run(sink: &mut dyn EdgeSink, e: &SweepEdge, kind: RunKind, run: Run) {
    let line = e.as_edge();
    let a = Point::new(run.x0, y_at(&line, run.x0).round_coord());
    let b = Point::new(run.x1, y_at(&line, run.x1).round_coord());
    match kind {
        RunKind::Forward => sink.put(Edge { p1: a, p2: b }),
        RunKind::Backward => sink.put(Edge { p1: b, p2: a }),
        RunKind::Probe(tag) => {
            for piece in e.pieces(a, b) {
                sink.put_tagged(piece, tag);
            }
        }
    }
}

// An interval on a cut with positive winding somewhere, for contact detection.
#[derive(Debug)]
struct Gap {
    lo: Rational,
    hi: Rational,
    tags: Vec<u32>,
}

fn slab_key(edges: &EdgeVec<SweepEdge>, idx: EdgeIdx, xa: Coord, xb: Coord) -> (Rational, Rational, EdgeIdx) {
    let line = edges[idx].as_edge();
    (y_at(&line, xa), y_at(&line, xb), idx)
}

struct Sweeper<'p> {
    prep: &'p Prepared,
    windings: Windings,
    want_contacts: bool,
    // Gaps on the left and right end of the current slab.
    gaps_a: Vec<Gap>,
    gaps_b: Vec<Gap>,
}

impl Sweeper<'_> {
    fn slab(&mut self, xa: Coord, xb: Coord, active: &[EdgeIdx], channels: &mut [Channel<'_>]) {
        let prep = self.prep;
        let edges = &prep.edges;
        self.windings.clear();
        for ch in channels.iter_mut() {
            ch.inside = ch.eval.is_inside(&self.windings);
            ch.span_lower = None;
            ch.open = None;
        }

        let mut prev: Option<(Rational, Rational)> = None;
        let mut start = 0;
        while start < active.len() {
            // Sorting by index puts the smallest index first in each group.
            let rep = active[start];
            let line = edges[rep].as_edge();
            let (ya, yb) = (y_at(&line, xa), y_at(&line, xb));
            let mut end = start + 1;
            while end < active.len() {
                let other = edges[active[end]].as_edge();
                if y_at(&other, xa) != ya || y_at(&other, xb) != yb {
                    break;
                }
                end += 1;
            }
            let group = &active[start..end];

            let mut touching = Vec::new();
            if self.want_contacts && !self.windings.is_zero() {
                if let Some((pa, pb)) = prev {
                    let tags: Vec<u32> = self.windings.covered().collect();
                    for ch in channels.iter_mut().filter(|ch| ch.contacts) {
                        ch.eval.area(&self.windings);
                    }
                    self.gaps_a.push(Gap {
                        lo: pa,
                        hi: ya,
                        tags: tags.clone(),
                    });
                    self.gaps_b.push(Gap {
                        lo: pb,
                        hi: yb,
                        tags: tags.clone(),
                    });
                    touching = tags;
                }
            }

            for &i in group {
                self.windings.apply(edges[i].tag, edges[i].delta);
            }

            if self.want_contacts {
                touching.extend(self.windings.covered());
                touching.sort_unstable();
                touching.dedup();
                if touching.len() >= 2 {
                    for ch in channels.iter_mut().filter(|ch| ch.contacts) {
                        ch.eval.contact(&touching);
                    }
                }
            }

            for ch in channels.iter_mut() {
                let below = ch.inside;
                let above = ch.eval.is_inside(&self.windings);
                ch.inside = above;

                if below != above {
                    if ch.region {
                        let kind = if below {
                            RunKind::Forward
                        } else {
                            RunKind::Backward
                        };
                        ch.extend_run(rep, kind, xa, xb);
                        if above {
                            ch.span_lower = Some(rep);
                        } else if let Some(lower) = ch.span_lower.take() {
                            ch.sink.span(&Span {
                                x0: xa,
                                x1: xb,
                                lower: SpanEdge {
                                    id: lower.0,
                                    edge: edges[lower].as_edge(),
                                },
                                upper: SpanEdge {
                                    id: rep.0,
                                    edge: line,
                                },
                            });
                        }
                    }
                    if above {
                        ch.open = Some((ya, yb));
                    } else if let Some((oa, ob)) = ch.open.take() {
                        ch.right.push((oa, ya));
                        ch.next_left.push((ob, yb));
                    }
                }

                if let Some(tag) = ch.probe {
                    if let Some(out) = ch.eval.probe_output(ProbeClass::from_sides(below, above)) {
                        for &i in group.iter().filter(|&&i| edges[i].tag == tag) {
                            ch.extend_run(i, RunKind::Probe(out), xa, xb);
                        }
                    }
                }
            }

            prev = Some((ya, yb));
            start = end;
        }

        for ch in channels.iter_mut() {
            ch.flush_runs(edges, Some(xb));
        }
    }

    fn cut(&mut self, x: Coord, verticals: &[SweepEdge], left_gaps: &[Gap], channels: &mut [Channel<'_>]) {
        for ch in channels.iter_mut() {
            merge_touching(&mut ch.left);
            merge_touching(&mut ch.right);

            if ch.region {
                for (lo, hi, from_left) in boundary_pieces(&ch.left, &ch.right) {
                    let p = Point::new(x, lo.round_coord());
                    let q = Point::new(x, hi.round_coord());
                    if from_left {
                        ch.sink.put(Edge { p1: q, p2: p });
                    } else {
                        ch.sink.put(Edge { p1: p, p2: q });
                    }
                }
            }

            if let Some(tag) = ch.probe {
                for v in verticals.iter().filter(|v| v.tag == tag) {
                    for (lo, hi, class) in classify_vertical(v, &ch.left, &ch.right) {
                        if let Some(out) = ch.eval.probe_output(class) {
                            let a = Point::new(x, lo.round_coord());
                            let b = Point::new(x, hi.round_coord());
                            for piece in v.pieces(a, b) {
                                ch.sink.put_tagged(piece, out);
                            }
                        }
                    }
                }
            }

            ch.left = std::mem::take(&mut ch.next_left);
            ch.right.clear();
        }

        if self.want_contacts {
            let right_gaps = &self.gaps_a;
            let mut first = 0;
            for l in left_gaps {
                while first < right_gaps.len() && right_gaps[first].hi < l.lo {
                    first += 1;
                }
                for r in right_gaps[first..].iter().take_while(|r| r.lo <= l.hi) {
                    let mut tags: Vec<u32> = l.tags.iter().chain(&r.tags).copied().collect();
                    tags.sort_unstable();
                    tags.dedup();
                    if tags.len() >= 2 {
                        for ch in channels.iter_mut().filter(|ch| ch.contacts) {
                            ch.eval.contact(&tags);
                        }
                    }
                }
            }
        }
    }
}

// Joins intervals that meet.
fn merge_touching(v: &mut Vec<Interval>) {
    let mut out: Vec<Interval> = Vec::with_capacity(v.len());
    for &(lo, hi) in v.iter() {
        match out.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
            _ => out.push((lo, hi)),
        }
    }
    *v = out;
}

// Is `lo..hi` (which doesn't straddle any interval boundary) covered?
fn covers(v: &[Interval], lo: Rational, hi: Rational) -> bool {
    let i = v.partition_point(|iv| iv.1 < hi);
    i < v.len() && v[i].0 <= lo
}

fn breakpoints(left: &[Interval], right: &[Interval]) -> Vec<Rational> {
    let mut ys: Vec<Rational> = left
        .iter()
        .chain(right)
        .flat_map(|&(lo, hi)| [lo, hi])
        .collect();
    ys.sort();
    ys.dedup();
    ys
}

// The maximal pieces of the cut that are inside on exactly one side. The flag
// says whether that side is the left one.
fn boundary_pieces(left: &[Interval], right: &[Interval]) -> Vec<(Rational, Rational, bool)> {
    let mut out: Vec<(Rational, Rational, bool)> = Vec::new();
    for w in breakpoints(left, right).windows(2) {
        let (p, q) = (w[0], w[1]);
        let in_left = covers(left, p, q);
        if in_left == covers(right, p, q) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.1 == p && last.2 == in_left => last.1 = q,
            _ => out.push((p, q, in_left)),
        }
    }
    out
}

fn classify_vertical(
    v: &SweepEdge,
    left: &[Interval],
    right: &[Interval],
) -> Vec<(Rational, Rational, ProbeClass)> {
    let lo = Rational::from_int(v.left.y as i128);
    let hi = Rational::from_int(v.right.y as i128);
    let mut ys = vec![lo, hi];
    ys.extend(
        breakpoints(left, right)
            .into_iter()
            .filter(|y| lo < *y && *y < hi),
    );
    ys.sort();

    let mut out: Vec<(Rational, Rational, ProbeClass)> = Vec::new();
    for w in ys.windows(2) {
        let (p, q) = (w[0], w[1]);
        let class = ProbeClass::from_sides(covers(left, p, q), covers(right, p, q));
        match out.last_mut() {
            Some(last) if last.2 == class => last.1 = q,
            _ => out.push((p, q, class)),
        }
    }
    out
}

// Merges two lists that are sorted by `key`.
fn merge_sorted<K: Ord>(a: &[EdgeIdx], b: &[EdgeIdx], key: impl Fn(&EdgeIdx) -> K) -> Vec<EdgeIdx> {
    let mut ret = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if key(&a[i]) <= key(&b[j]) {
            ret.push(a[i]);
            i += 1;
        } else {
            ret.push(b[j]);
            j += 1;
        }
    }
    ret.extend_from_slice(&a[i..]);
    ret.extend_from_slice(&b[j..]);
    ret
}

/// Runs one sweep over the prepared input, feeding every channel.
pub(crate) fn sweep(prep: &Prepared, channels: &mut [Channel<'_>]) {
    for ch in channels.iter_mut() {
        ch.start();
    }
    let mut s = Sweeper {
        prep,
        windings: Windings::new(prep.max_tag),
        want_contacts: channels.iter().any(|ch| ch.contacts),
        gaps_a: Vec::new(),
        gaps_b: Vec::new(),
    };

    let edges = &prep.edges;
    let mut active: Vec<EdgeIdx> = Vec::new();
    let mut left_gaps: Vec<Gap> = Vec::new();
    let mut next = 0;
    let mut next_vertical = 0;
    for (k, &x) in prep.xs.iter().enumerate() {
        active.retain(|&i| edges[i].right.x > x);
        s.gaps_a.clear();
        s.gaps_b.clear();

        if let Some(&xb) = prep.xs.get(k + 1) {
            let first = next;
            while next < edges.len() && edges[EdgeIdx(next)].left.x == x {
                next += 1;
            }
            if next > first {
                // Fragments don't cross, so the old order still holds and the
                // new ones can be merged in.
                let mut starting: Vec<EdgeIdx> = (first..next).map(EdgeIdx).collect();
                starting.sort_by_cached_key(|&i| slab_key(edges, i, x, xb));
                active = merge_sorted(&active, &starting, |&i| slab_key(edges, i, x, xb));
            }
            #[cfg(feature = "slow-asserts")]
            assert!(active
                .windows(2)
                .all(|w| slab_key(edges, w[0], x, xb) < slab_key(edges, w[1], x, xb)));
            trace!(xa = x, xb, active = active.len(), "slab");
            s.slab(x, xb, &active, channels);
        }

        let first_vertical = next_vertical;
        while next_vertical < prep.verticals.len() && prep.verticals[next_vertical].left.x == x {
            next_vertical += 1;
        }
        s.cut(
            x,
            &prep.verticals[first_vertical..next_vertical],
            &left_gaps,
            channels,
        );
        left_gaps = std::mem::take(&mut s.gaps_b);
    }

    for ch in channels.iter_mut() {
        ch.finish(edges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge_processor::snap::{prepare, InputEdge};
    use crate::evaluator::{BinaryOp, BooleanOp, ClassifyMode, EdgePolygonClassifier, SimpleMerge};
    use crate::geom::Polygon;
    use crate::sink::EdgeContainer;

    fn input(polys: &[(Polygon, u32)]) -> Vec<InputEdge> {
        polys
            .iter()
            .flat_map(|(p, tag)| p.edges().map(move |edge| InputEdge { edge, tag: *tag }))
            .collect()
    }

    fn square(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> Polygon {
        Polygon::new([(x0, y0), (x0, y1), (x1, y1), (x1, y0)])
    }

    fn run(prep: &Prepared, eval: &mut dyn Evaluator) -> Vec<Edge> {
        let mut out = EdgeContainer::new();
        {
            let mut channels = [Channel::new(&mut out, eval)];
            sweep(prep, &mut channels);
        }
        let mut edges = out.into_edges();
        edges.sort_by_key(|e| (e.p1, e.p2));
        edges
    }

    #[test]
    fn square_boundary() {
        let prep = prepare(&input(&[(square(0, 0, 10, 10), 0)]), true);
        let edges = run(&prep, &mut SimpleMerge::default());
        assert_eq!(
            edges,
            vec![
                Edge::new((0, 0), (0, 10)),
                Edge::new((0, 10), (10, 10)),
                Edge::new((10, 0), (0, 0)),
                Edge::new((10, 10), (10, 0)),
            ]
        );
    }

    #[test]
    fn long_fragments_come_out_whole() {
        // The small square adds events at x = 4 and x = 6, which split the
        // big one's fragments into several slabs.
        let prep = prepare(
            &input(&[(square(0, 0, 10, 10), 0), (square(4, 20, 6, 22), 1)]),
            true,
        );
        let edges = run(&prep, &mut BooleanOp::new(BinaryOp::ANotB));
        assert_eq!(edges.len(), 4);
        assert!(edges.contains(&Edge::new((0, 10), (10, 10))));
    }

    #[test]
    fn overlapping_squares() {
        let prep = prepare(
            &input(&[(square(0, 0, 10, 10), 0), (square(5, 5, 15, 15), 1)]),
            true,
        );
        let and = run(&prep, &mut BooleanOp::new(BinaryOp::And));
        assert_eq!(
            and,
            vec![
                Edge::new((5, 5), (5, 10)),
                Edge::new((5, 10), (10, 10)),
                Edge::new((10, 5), (5, 5)),
                Edge::new((10, 10), (10, 5)),
            ]
        );
        let or = run(&prep, &mut BooleanOp::new(BinaryOp::Or));
        assert_eq!(or.len(), 8);
    }

    #[test]
    fn several_channels_in_one_pass() {
        let prep = prepare(
            &input(&[(square(0, 0, 10, 10), 0), (square(5, 5, 15, 15), 1)]),
            true,
        );
        let mut and_eval = BooleanOp::new(BinaryOp::And);
        let mut xor_eval = BooleanOp::new(BinaryOp::Xor);
        let mut and_out = EdgeContainer::new();
        let mut xor_out = EdgeContainer::new();
        {
            let mut channels = [
                Channel::new(&mut and_out, &mut and_eval),
                Channel::new(&mut xor_out, &mut xor_eval),
            ];
            sweep(&prep, &mut channels);
        }
        assert_eq!(and_out.edges().len(), 4);
        // The xor is two L shapes touching at two points.
        assert_eq!(xor_out.edges().len(), 12);
    }

    #[test]
    fn probes() {
        let mut edges = input(&[(square(0, 0, 10, 10), 1)]);
        edges.push(InputEdge {
            edge: Edge::new((-5, 5), (15, 5)),
            tag: 0,
        });
        edges.push(InputEdge {
            edge: Edge::new((5, 20), (5, -20)),
            tag: 0,
        });
        edges.push(InputEdge {
            edge: Edge::new((0, 2), (0, 4)),
            tag: 0,
        });
        let prep = prepare(&edges, true);

        let inside = run(&prep, &mut EdgePolygonClassifier::new(ClassifyMode::Inside, false));
        // Probes are cut wherever they cross each other or the polygon.
        assert_eq!(
            inside,
            vec![
                Edge::new((0, 5), (5, 5)),
                Edge::new((5, 5), (5, 0)),
                Edge::new((5, 5), (10, 5)),
                Edge::new((5, 10), (5, 5)),
            ]
        );

        let outside = run(&prep, &mut EdgePolygonClassifier::new(ClassifyMode::Outside, false));
        assert_eq!(
            outside,
            vec![
                Edge::new((-5, 5), (0, 5)),
                Edge::new((0, 2), (0, 4)),
                Edge::new((5, 0), (5, -20)),
                Edge::new((5, 20), (5, 10)),
                Edge::new((10, 5), (15, 5)),
            ]
        );

        let touching = run(&prep, &mut EdgePolygonClassifier::new(ClassifyMode::Inside, true));
        assert_eq!(touching.len(), 5);
        assert!(touching.contains(&Edge::new((0, 2), (0, 4))));
    }
}
