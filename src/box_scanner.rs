//! The broad phase: finding pairs of objects whose bounding boxes interact.
//!
//! Objects are inserted by reference, each with a "property" (any clonable
//! payload, often just an index). [`BoxScanner::process`] then reports every
//! interacting pair to a [`BoxScannerReceiver`], and tells the receiver about
//! each object once nothing more can interact with it.
//!
//! Small or very dense inputs are compared pairwise; everything else goes
//! through a sweep over the boxes' left edges.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use tracing::debug;

use crate::geom::{Coord, Rect};

/// The default value of [`BoxScanner::set_fill_factor`].
pub const DEFAULT_FILL_FACTOR: u32 = 150;

/// The default value of [`BoxScanner::set_scanner_threshold`].
pub const DEFAULT_SCANNER_THRESHOLD: usize = 10;

/// Computes the bounding box of an object.
///
/// Implemented by every `Fn(&O) -> Rect`.
pub trait BoxConverter<O: ?Sized> {
    /// The bounding box of `obj`.
    fn bbox(&self, obj: &O) -> Rect;
}

impl<O: ?Sized, F: Fn(&O) -> Rect> BoxConverter<O> for F {
    fn bbox(&self, obj: &O) -> Rect {
        self(obj)
    }
}

/// Receives the results of a one-set scan.
pub trait BoxScannerReceiver<'a, O: ?Sized, P> {
    /// Called once, before anything else.
    fn initialize(&mut self) {}

    /// Called for every pair of interacting objects.
    fn add(&mut self, o1: &'a O, p1: &P, o2: &'a O, p2: &P);

    /// Polled after each reported pair; returning `true` aborts the scan.
    fn stop(&self) -> bool {
        false
    }

    /// Called once per inserted object, after its last interaction.
    fn finish(&mut self, _obj: &'a O, _prop: &P) {}

    /// Called once at the very end. `aborted` is true if [`stop`](Self::stop)
    /// ended the scan early, in which case some objects were never finished.
    fn finalize(&mut self, _aborted: bool) {}
}

/// Receives the results of a two-set scan.
pub trait BoxScannerReceiver2<'a, O1: ?Sized, P1, O2: ?Sized, P2> {
    /// Called once, before anything else.
    fn initialize(&mut self) {}

    /// Called for every interacting pair of one object of each set.
    fn add(&mut self, o1: &'a O1, p1: &P1, o2: &'a O2, p2: &P2);

    /// Polled after each reported pair; returning `true` aborts the scan.
    fn stop(&self) -> bool {
        false
    }

    /// Called once per object of the first set, after its last interaction.
    fn finish1(&mut self, _obj: &'a O1, _prop: &P1) {}

    /// Called once per object of the second set, after its last interaction.
    fn finish2(&mut self, _obj: &'a O2, _prop: &P2) {}

    /// Called once at the very end.
    fn finalize(&mut self, _aborted: bool) {}
}

// Should we skip the sweep and compare everything pairwise?
//
// The sweep only pays off if the active set stays small, which it doesn't when
// the boxes are wide compared to the total extent.
fn too_dense(boxes: &[Rect], fill_factor: u32) -> bool {
    let extent = boxes.iter().fold(Rect::empty(), |r, b| r.union(b));
    if extent.is_empty() {
        return true;
    }
    let total: i128 = boxes.iter().map(|b| b.width() as i128 + 1).sum();
    total * fill_factor as i128 >= boxes.len() as i128 * (extent.width() as i128 + 1) * 100
}

/// The boxes currently crossed by a sweep, indexed by their y range.
///
/// Boxes are bucketed by height (one bucket per power of two), and each bucket
/// is ordered by bottom. A box of height `h` can only reach down to
/// `bottom - h`, so a query looks at a window of each bucket that is at most
/// twice as tall as the bucket's boxes. Stacks of equally sized boxes, like
/// parallel wires, are thus queried in logarithmic time.
#[derive(Debug, Default)]
pub(crate) struct YIndex {
    buckets: Vec<BTreeSet<(i64, usize)>>,
}

fn height_class(r: &Rect) -> usize {
    (u64::BITS - (r.height().max(0) as u64).leading_zeros()) as usize
}

impl YIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, r: &Rect, id: usize) {
        let class = height_class(r);
        if self.buckets.len() <= class {
            self.buckets.resize_with(class + 1, BTreeSet::new);
        }
        self.buckets[class].insert((r.bottom as i64, id));
    }

    pub fn remove(&mut self, r: &Rect, id: usize) {
        if let Some(bucket) = self.buckets.get_mut(height_class(r)) {
            bucket.remove(&(r.bottom as i64, id));
        }
    }

    /// Every box that might come within `gap` of `r` vertically, and some
    /// that don't.
    pub fn candidates(&self, r: &Rect, gap: i64) -> impl Iterator<Item = usize> + '_ {
        let top = r.top as i64 + gap;
        let bottom = r.bottom as i64 - gap;
        self.buckets
            .iter()
            .enumerate()
            .filter_map(move |(class, bucket)| {
                let tallest = (1i64 << class) - 1;
                let lo = bottom - tallest;
                (lo <= top).then(|| bucket.range((lo, 0)..=(top, usize::MAX)))
            })
            .flatten()
            .map(|&(_, id)| id)
    }
}

/// Finds interacting pairs among one set of objects.
pub struct BoxScanner<'a, O: ?Sized, P> {
    entries: Vec<(&'a O, P)>,
    fill_factor: u32,
    scanner_threshold: usize,
}

impl<O: ?Sized, P> Default for BoxScanner<'_, O, P> {
    fn default() -> Self {
        BoxScanner {
            entries: Vec::new(),
            fill_factor: DEFAULT_FILL_FACTOR,
            scanner_threshold: DEFAULT_SCANNER_THRESHOLD,
        }
    }
}

impl<'a, O: ?Sized, P> BoxScanner<'a, O, P> {
    /// Creates an empty scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the density threshold (in percent) above which the pairwise algorithm is used.
    ///
    /// If the summed widths of the boxes, scaled by this factor, reach the
    /// number of boxes times the total width of the input, the boxes are
    /// considered too wide for the sweep to prune anything.
    pub fn set_fill_factor(&mut self, percent: u32) {
        self.fill_factor = percent;
    }

    /// The density threshold, in percent.
    pub fn fill_factor(&self) -> u32 {
        self.fill_factor
    }

    /// Sets the number of objects up to which the pairwise algorithm is always used.
    pub fn set_scanner_threshold(&mut self, n: usize) {
        self.scanner_threshold = n;
    }

    /// The number of objects up to which the pairwise algorithm is always used.
    pub fn scanner_threshold(&self) -> usize {
        self.scanner_threshold
    }

    /// Reserves space for `n` more objects.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
    }

    /// Removes all objects.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The number of inserted objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there no objects?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an object. The same object may be inserted several times.
    pub fn insert(&mut self, obj: &'a O, prop: P) {
        self.entries.push((obj, prop));
    }

    /// Reports all interacting pairs to `rec`.
    ///
    /// See [`Rect::interacts`] for the meaning of `mode`. Returns `false` if the
    /// receiver stopped the scan.
    pub fn process<R, C>(&self, rec: &mut R, mode: Coord, bc: &C) -> bool
    where
        R: BoxScannerReceiver<'a, O, P> + ?Sized,
        C: BoxConverter<O> + ?Sized,
    {
        rec.initialize();

        let boxes: Vec<Rect> = self.entries.iter().map(|(o, _)| bc.bbox(o)).collect();
        let brute_force =
            self.entries.len() <= self.scanner_threshold || too_dense(&boxes, self.fill_factor);
        debug!(
            objects = self.entries.len(),
            mode,
            brute_force,
            "box scanner pass"
        );

        let completed = if brute_force {
            self.process_brute_force(rec, mode, &boxes)
        } else {
            self.process_sweep(rec, mode, &boxes)
        };

        rec.finalize(!completed);
        completed
    }

    fn process_brute_force<R>(&self, rec: &mut R, mode: Coord, boxes: &[Rect]) -> bool
    where
        R: BoxScannerReceiver<'a, O, P> + ?Sized,
    {
        for i in 0..self.entries.len() {
            for j in (i + 1)..self.entries.len() {
                if boxes[i].interacts(&boxes[j], mode) {
                    let (o1, p1) = &self.entries[i];
                    let (o2, p2) = &self.entries[j];
                    rec.add(*o1, p1, *o2, p2);
                    if rec.stop() {
                        return false;
                    }
                }
            }
        }
        for (o, p) in &self.entries {
            rec.finish(*o, p);
        }
        true
    }

    fn process_sweep<R>(&self, rec: &mut R, mode: Coord, boxes: &[Rect]) -> bool
    where
        R: BoxScannerReceiver<'a, O, P> + ?Sized,
    {
        let e = mode as i64 - 1;

        let mut order = Vec::with_capacity(self.entries.len());
        for (i, (o, p)) in self.entries.iter().enumerate() {
            if boxes[i].is_empty() {
                rec.finish(*o, p);
            } else {
                order.push(i);
            }
        }
        order.sort_by_key(|&i| (boxes[i].left, i));

        let mut active = YIndex::new();
        // The same boxes, ordered by when they stop being interesting.
        let mut closing: BinaryHeap<Reverse<(i64, usize)>> = BinaryHeap::new();
        let mut pairs = 0usize;

        for &i in &order {
            let b = boxes[i];
            while let Some(&Reverse((right, j))) = closing.peek() {
                if right + e >= b.left as i64 {
                    break;
                }
                closing.pop();
                active.remove(&boxes[j], j);
                let (o, p) = &self.entries[j];
                rec.finish(*o, p);
            }

            let (o2, p2) = &self.entries[i];
            for j in active.candidates(&b, e) {
                if boxes[j].interacts(&b, mode) {
                    let (o1, p1) = &self.entries[j];
                    rec.add(*o1, p1, *o2, p2);
                    pairs += 1;
                    if rec.stop() {
                        debug!(pairs, "box scanner stopped");
                        return false;
                    }
                }
            }

            active.insert(&b, i);
            closing.push(Reverse((b.right as i64, i)));
        }

        while let Some(Reverse((_, j))) = closing.pop() {
            let (o, p) = &self.entries[j];
            rec.finish(*o, p);
        }
        debug!(pairs, "box scanner sweep done");
        true
    }
}

/// Finds interacting pairs between two sets of objects.
///
/// Pairs within one set are never reported.
pub struct BoxScanner2<'a, O1: ?Sized, P1, O2: ?Sized, P2> {
    entries1: Vec<(&'a O1, P1)>,
    entries2: Vec<(&'a O2, P2)>,
    fill_factor: u32,
    scanner_threshold: usize,
}

impl<O1: ?Sized, P1, O2: ?Sized, P2> Default for BoxScanner2<'_, O1, P1, O2, P2> {
    fn default() -> Self {
        BoxScanner2 {
            entries1: Vec::new(),
            entries2: Vec::new(),
            fill_factor: DEFAULT_FILL_FACTOR,
            scanner_threshold: DEFAULT_SCANNER_THRESHOLD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Side {
    First,
    Second,
}

impl<'a, O1: ?Sized, P1, O2: ?Sized, P2> BoxScanner2<'a, O1, P1, O2, P2> {
    /// Creates an empty scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`BoxScanner::set_fill_factor`].
    pub fn set_fill_factor(&mut self, percent: u32) {
        self.fill_factor = percent;
    }

    /// See [`BoxScanner::set_scanner_threshold`]. Here the pairwise algorithm
    /// is used if either set is this small.
    pub fn set_scanner_threshold(&mut self, n: usize) {
        self.scanner_threshold = n;
    }

    /// Removes all objects from both sets.
    pub fn clear(&mut self) {
        self.entries1.clear();
        self.entries2.clear();
    }

    /// Adds an object to the first set.
    pub fn insert1(&mut self, obj: &'a O1, prop: P1) {
        self.entries1.push((obj, prop));
    }

    /// Adds an object to the second set.
    pub fn insert2(&mut self, obj: &'a O2, prop: P2) {
        self.entries2.push((obj, prop));
    }

    /// Reports all interacting pairs (one object from each set) to `rec`.
    ///
    /// Returns `false` if the receiver stopped the scan.
    pub fn process<R, C1, C2>(&self, rec: &mut R, mode: Coord, bc1: &C1, bc2: &C2) -> bool
    where
        R: BoxScannerReceiver2<'a, O1, P1, O2, P2> + ?Sized,
        C1: BoxConverter<O1> + ?Sized,
        C2: BoxConverter<O2> + ?Sized,
    {
        rec.initialize();

        let boxes1: Vec<Rect> = self.entries1.iter().map(|(o, _)| bc1.bbox(o)).collect();
        let boxes2: Vec<Rect> = self.entries2.iter().map(|(o, _)| bc2.bbox(o)).collect();
        let brute_force = self.entries1.len() <= self.scanner_threshold
            || self.entries2.len() <= self.scanner_threshold
            || too_dense(
                &boxes1.iter().chain(&boxes2).copied().collect::<Vec<_>>(),
                self.fill_factor,
            );
        debug!(
            objects1 = self.entries1.len(),
            objects2 = self.entries2.len(),
            mode,
            brute_force,
            "two-set box scanner pass"
        );

        let completed = if brute_force {
            self.process_brute_force(rec, mode, &boxes1, &boxes2)
        } else {
            self.process_sweep(rec, mode, &boxes1, &boxes2)
        };
        rec.finalize(!completed);
        completed
    }

    fn process_brute_force<R>(&self, rec: &mut R, mode: Coord, boxes1: &[Rect], boxes2: &[Rect]) -> bool
    where
        R: BoxScannerReceiver2<'a, O1, P1, O2, P2> + ?Sized,
    {
        for (i, (o1, p1)) in self.entries1.iter().enumerate() {
            for (j, (o2, p2)) in self.entries2.iter().enumerate() {
                if boxes1[i].interacts(&boxes2[j], mode) {
                    rec.add(*o1, p1, *o2, p2);
                    if rec.stop() {
                        return false;
                    }
                }
            }
        }
        for (o, p) in &self.entries1 {
            rec.finish1(*o, p);
        }
        for (o, p) in &self.entries2 {
            rec.finish2(*o, p);
        }
        true
    }

    fn finish<R>(&self, rec: &mut R, side: Side, idx: usize)
    where
        R: BoxScannerReceiver2<'a, O1, P1, O2, P2> + ?Sized,
    {
        match side {
            Side::First => {
                let (o, p) = &self.entries1[idx];
                rec.finish1(*o, p);
            }
            Side::Second => {
                let (o, p) = &self.entries2[idx];
                rec.finish2(*o, p);
            }
        }
    }

    fn process_sweep<R>(&self, rec: &mut R, mode: Coord, boxes1: &[Rect], boxes2: &[Rect]) -> bool
    where
        R: BoxScannerReceiver2<'a, O1, P1, O2, P2> + ?Sized,
    {
        let e = mode as i64 - 1;
        let bbox = |side: Side, idx: usize| match side {
            Side::First => boxes1[idx],
            Side::Second => boxes2[idx],
        };

        let mut order = Vec::with_capacity(boxes1.len() + boxes2.len());
        for (side, boxes) in [(Side::First, boxes1), (Side::Second, boxes2)] {
            for (i, b) in boxes.iter().enumerate() {
                if b.is_empty() {
                    self.finish(rec, side, i);
                } else {
                    order.push((side, i));
                }
            }
        }
        order.sort_by_key(|&(side, i)| (bbox(side, i).left, side, i));

        let mut active1 = YIndex::new();
        let mut active2 = YIndex::new();
        let mut closing: BinaryHeap<Reverse<(i64, Side, usize)>> = BinaryHeap::new();

        for &(side, i) in &order {
            let b = bbox(side, i);
            while let Some(&Reverse((right, s, j))) = closing.peek() {
                if right + e >= b.left as i64 {
                    break;
                }
                closing.pop();
                match s {
                    Side::First => active1.remove(&bbox(s, j), j),
                    Side::Second => active2.remove(&bbox(s, j), j),
                }
                self.finish(rec, s, j);
            }

            match side {
                Side::First => {
                    let (o1, p1) = &self.entries1[i];
                    for j in active2.candidates(&b, e) {
                        if boxes2[j].interacts(&b, mode) {
                            let (o2, p2) = &self.entries2[j];
                            rec.add(*o1, p1, *o2, p2);
                            if rec.stop() {
                                return false;
                            }
                        }
                    }
                    active1.insert(&b, i);
                }
                Side::Second => {
                    let (o2, p2) = &self.entries2[i];
                    for j in active1.candidates(&b, e) {
                        if boxes1[j].interacts(&b, mode) {
                            let (o1, p1) = &self.entries1[j];
                            rec.add(*o1, p1, *o2, p2);
                            if rec.stop() {
                                return false;
                            }
                        }
                    }
                    active2.insert(&b, i);
                }
            }
            closing.push(Reverse((b.right as i64, side, i)));
        }

        while let Some(Reverse((_, s, j))) = closing.pop() {
            self.finish(rec, s, j);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        initialized: usize,
        pairs: Vec<(usize, usize)>,
        finished: Vec<usize>,
        finalized: Vec<bool>,
        stop_after: Option<usize>,
    }

    impl<'a> BoxScannerReceiver<'a, Rect, usize> for Recorder {
        fn initialize(&mut self) {
            self.initialized += 1;
        }

        fn add(&mut self, _: &'a Rect, p1: &usize, _: &'a Rect, p2: &usize) {
            assert!(!self.finished.contains(p1) && !self.finished.contains(p2));
            self.pairs.push((*p1.min(p2), *p1.max(p2)));
        }

        fn stop(&self) -> bool {
            self.stop_after.is_some_and(|n| self.pairs.len() >= n)
        }

        fn finish(&mut self, _: &'a Rect, p: &usize) {
            self.finished.push(*p);
        }

        fn finalize(&mut self, aborted: bool) {
            self.finalized.push(aborted);
        }
    }

    fn scan(boxes: &[Rect], mode: Coord, force_sweep: bool) -> Recorder {
        let mut scanner = BoxScanner::new();
        if force_sweep {
            scanner.set_scanner_threshold(0);
            scanner.set_fill_factor(0);
        }
        for (i, b) in boxes.iter().enumerate() {
            scanner.insert(b, i);
        }
        let mut rec = Recorder::default();
        assert!(scanner.process(&mut rec, mode, &|r: &Rect| *r));
        rec
    }

    fn brute_force(boxes: &[Rect], mode: Coord) -> BTreeSet<(usize, usize)> {
        let mut ret = BTreeSet::new();
        for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                if boxes[i].interacts(&boxes[j], mode) {
                    ret.insert((i, j));
                }
            }
        }
        ret
    }

    #[test]
    fn empty_input() {
        let rec = scan(&[], 1, false);
        assert_eq!(rec.initialized, 1);
        assert!(rec.pairs.is_empty());
        assert!(rec.finished.is_empty());
        assert_eq!(rec.finalized, vec![false]);
    }

    #[test]
    fn modes() {
        let boxes = [
            Rect::new(0, 0, 10, 10),
            Rect::new(10, 0, 20, 10),
            Rect::new(23, 0, 30, 10),
            Rect::empty(),
        ];
        for force_sweep in [false, true] {
            assert!(scan(&boxes, 0, force_sweep).pairs.is_empty());
            assert_eq!(scan(&boxes, 1, force_sweep).pairs, vec![(0, 1)]);
            assert_eq!(scan(&boxes, 3, force_sweep).pairs, vec![(0, 1)]);
            let mut pairs = scan(&boxes, 4, force_sweep).pairs;
            pairs.sort();
            assert_eq!(pairs, vec![(0, 1), (1, 2)]);

            let mut finished = scan(&boxes, 4, force_sweep).finished;
            finished.sort();
            assert_eq!(finished, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn duplicates_are_counted() {
        let b = Rect::new(0, 0, 10, 10);
        let mut scanner = BoxScanner::new();
        scanner.insert(&b, 0);
        scanner.insert(&b, 1);
        scanner.insert(&b, 2);
        let mut rec = Recorder::default();
        scanner.process(&mut rec, 1, &|r: &Rect| *r);
        assert_eq!(rec.pairs.len(), 3);
    }

    #[test]
    fn stopping() {
        let boxes: Vec<_> = (0..20).map(|i| Rect::new(i, 0, i + 5, 5)).collect();
        for threshold in [0, 100] {
            let mut scanner = BoxScanner::new();
            scanner.set_scanner_threshold(threshold);
            for (i, b) in boxes.iter().enumerate() {
                scanner.insert(b, i);
            }
            let mut rec = Recorder {
                stop_after: Some(3),
                ..Default::default()
            };
            assert!(!scanner.process(&mut rec, 1, &|r: &Rect| *r));
            assert_eq!(rec.pairs.len(), 3);
            assert_eq!(rec.finalized, vec![true]);
        }
    }

    #[derive(Default)]
    struct Recorder2 {
        pairs: BTreeSet<(usize, usize)>,
        finished1: usize,
        finished2: usize,
        finalized: Vec<bool>,
        stop_after: Option<usize>,
    }

    impl<'a> BoxScannerReceiver2<'a, Rect, usize, Rect, usize> for Recorder2 {
        fn add(&mut self, _: &'a Rect, p1: &usize, _: &'a Rect, p2: &usize) {
            assert!(self.pairs.insert((*p1, *p2)));
        }

        fn stop(&self) -> bool {
            self.stop_after.is_some_and(|n| self.pairs.len() >= n)
        }

        fn finalize(&mut self, aborted: bool) {
            self.finalized.push(aborted);
        }

        fn finish1(&mut self, _: &'a Rect, _: &usize) {
            self.finished1 += 1;
        }

        fn finish2(&mut self, _: &'a Rect, _: &usize) {
            self.finished2 += 1;
        }
    }

    #[test]
    fn stopping_two_sets() {
        let a: Vec<_> = (0..20).map(|i| Rect::new(i, 0, i + 5, 5)).collect();
        let b: Vec<_> = (0..20).map(|i| Rect::new(i, 3, i + 5, 8)).collect();
        for threshold in [0, 100] {
            let mut scanner = BoxScanner2::new();
            scanner.set_scanner_threshold(threshold);
            scanner.set_fill_factor(0);
            for (i, r) in a.iter().enumerate() {
                scanner.insert1(r, i);
            }
            for (j, r) in b.iter().enumerate() {
                scanner.insert2(r, j);
            }
            let mut rec = Recorder2 {
                stop_after: Some(2),
                ..Default::default()
            };
            assert!(!scanner.process(&mut rec, 1, &|r: &Rect| *r, &|r: &Rect| *r));
            assert_eq!(rec.pairs.len(), 2);
            assert_eq!(rec.finalized, vec![true]);

            let mut rec = Recorder2::default();
            assert!(scanner.process(&mut rec, 1, &|r: &Rect| *r, &|r: &Rect| *r));
            assert_eq!(rec.finalized, vec![false]);
            assert_eq!(rec.finished1, 20);
        }
    }

    #[test]
    fn y_index_only_looks_near_the_query() {
        let wires: Vec<_> = (0..100).map(|i| Rect::new(0, 4 * i, 100, 4 * i + 2)).collect();
        let tall = Rect::new(0, 0, 100, 1000);
        let mut index = YIndex::new();
        for (i, w) in wires.iter().enumerate() {
            index.insert(w, i);
        }
        index.insert(&tall, 100);

        let query = Rect::new(0, 40, 100, 42);
        let found: BTreeSet<_> = index.candidates(&query, 0).collect();
        assert_eq!(found, BTreeSet::from([10, 100]));
        let found: BTreeSet<_> = index.candidates(&query, 2).collect();
        assert_eq!(found, BTreeSet::from([9, 10, 11, 100]));

        index.remove(&tall, 100);
        index.remove(&wires[10], 10);
        let found: BTreeSet<_> = index.candidates(&query, 2).collect();
        assert_eq!(found, BTreeSet::from([9, 11]));
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (0..100i32, 0..100i32, 0..30i32, 0..30i32)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, x + w, y + h))
    }

    proptest! {
        #[test]
        fn sweep_matches_brute_force(boxes in prop::collection::vec(arb_rect(), 0..60), mode in 0..4i32) {
            let rec = scan(&boxes, mode, true);
            let pairs: BTreeSet<_> = rec.pairs.iter().copied().collect();
            prop_assert_eq!(pairs.len(), rec.pairs.len());
            prop_assert_eq!(pairs, brute_force(&boxes, mode));

            let mut finished = rec.finished.clone();
            finished.sort();
            prop_assert_eq!(finished, (0..boxes.len()).collect::<Vec<_>>());
        }

        #[test]
        fn two_sets_match_brute_force(
            a in prop::collection::vec(arb_rect(), 0..40),
            b in prop::collection::vec(arb_rect(), 0..40),
            mode in 0..3i32,
            force_sweep in any::<bool>(),
        ) {
            let mut scanner = BoxScanner2::new();
            if force_sweep {
                scanner.set_scanner_threshold(0);
                scanner.set_fill_factor(0);
            }
            for (i, r) in a.iter().enumerate() {
                scanner.insert1(r, i);
            }
            for (j, r) in b.iter().enumerate() {
                scanner.insert2(r, j);
            }
            let mut rec = Recorder2::default();
            scanner.process(&mut rec, mode, &|r: &Rect| *r, &|r: &Rect| *r);

            let mut expected = BTreeSet::new();
            for (i, ra) in a.iter().enumerate() {
                for (j, rb) in b.iter().enumerate() {
                    if ra.interacts(rb, mode) {
                        expected.insert((i, j));
                    }
                }
            }
            prop_assert_eq!(rec.pairs, expected);
            prop_assert_eq!(rec.finished1, a.len());
            prop_assert_eq!(rec.finished2, b.len());
        }
    }
}
