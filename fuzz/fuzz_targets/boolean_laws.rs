#![no_main]

use arbitrary::Unstructured;
use layoutsweep::{BinaryOp, EdgeProcessor, Polygon};
use libfuzzer_sys::fuzz_target;

fn area2(polys: &[Polygon]) -> i128 {
    polys.iter().map(Polygon::area2).sum()
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(a) = layoutsweep::arbitrary::polygons(100, 4, &mut u) else {
        return;
    };
    let Ok(b) = layoutsweep::arbitrary::polygons(100, 4, &mut u) else {
        return;
    };

    let mut ep = EdgeProcessor::new();
    let mut run = |op| ep.boolean(&a, &b, op, false, true);
    let and = run(BinaryOp::And);
    let or = run(BinaryOp::Or);
    let xor = run(BinaryOp::Xor);
    let a_not_b = run(BinaryOp::ANotB);
    let b_not_a = run(BinaryOp::BNotA);

    for p in and.iter().chain(&or).chain(&xor) {
        assert!(p.area2() > 0);
        assert!(p.hull().len() >= 3);
    }
    assert_eq!(area2(&and) + area2(&xor), area2(&or));
    assert_eq!(area2(&a_not_b) + area2(&b_not_a), area2(&xor));
});
