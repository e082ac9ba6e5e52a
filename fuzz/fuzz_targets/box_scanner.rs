#![no_main]

use std::collections::BTreeSet;

use arbitrary::Unstructured;
use layoutsweep::{BoxScanner, BoxScannerReceiver, Rect};
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Pairs {
    pairs: BTreeSet<(usize, usize)>,
    finished: usize,
}

impl<'a> BoxScannerReceiver<'a, Rect, usize> for Pairs {
    fn add(&mut self, _o1: &'a Rect, p1: &usize, _o2: &'a Rect, p2: &usize) {
        let pair = (*p1.min(p2), *p1.max(p2));
        assert!(self.pairs.insert(pair), "pair {pair:?} reported twice");
    }

    fn finish(&mut self, _obj: &'a Rect, _prop: &usize) {
        self.finished += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(count) = u.int_in_range(0..=40usize) else {
        return;
    };
    let mut rects = Vec::with_capacity(count);
    for _ in 0..count {
        let Ok(r) = layoutsweep::arbitrary::rect(1000, &mut u) else {
            return;
        };
        rects.push(r);
    }
    let Ok(mode) = u.int_in_range(0..=5) else {
        return;
    };

    let mut expected = BTreeSet::new();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].interacts(&rects[j], mode) {
                expected.insert((i, j));
            }
        }
    }

    let mut scanner = BoxScanner::new();
    // Force the sweep, even for inputs the scanner would rather do pairwise.
    scanner.set_scanner_threshold(0);
    scanner.set_fill_factor(0);
    for (i, r) in rects.iter().enumerate() {
        scanner.insert(r, i);
    }
    let mut pairs = Pairs::default();
    assert!(scanner.process(&mut pairs, mode, &|r: &Rect| *r));
    assert_eq!(pairs.pairs, expected);
    assert_eq!(pairs.finished, rects.len());
});
