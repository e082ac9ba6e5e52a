//! Utilities for generating examples, benchmarks, and test cases.

use crate::{Coord, Polygon, Rect};

/// Generate a bunch of squares, arranged in a grid.
///
/// The bottom-left of the first square is at (x0, y0). Each square has size `size
/// x size`, and the distance between squares (both horizontally and vertically)
/// is `offset`.
///
/// If `slant` is non-zero, generates parallelograms instead of squares: the
/// right-hand side of each square gets translated up by `slant`.
fn squares((x0, y0): (Coord, Coord), size: Coord, offset: Coord, slant: Coord, count: usize) -> Vec<Polygon> {
    let mut ret = Vec::new();
    for i in 0..count {
        let x = x0 + i as Coord * offset;
        for j in 0..count {
            let y = y0 + j as Coord * offset;
            ret.push(Polygon::new([
                (x, y),
                (x, y + size),
                (x + size, y + size + slant),
                (x + size, y + slant),
            ]));
        }
    }

    ret
}

/// Generate an `n` by `n` checkerboard-like pattern with overlapping squares.
/// For `n = 3`, it looks like:
///
/// ```text
/// +----+ +----+ +----+
/// |    | |    | |    |
/// |  +-+-+-++-+-+-+  |
/// +--+-+ +-++-+ +-+--+
/// +--+-+ +-++-+ +-+--+
/// |  +-+-+-++-+-+-+  |
/// |  +-+-+-++-+-+-+  |
/// +--+-+ +-++-+ +-+--+
/// +--+-+ +-++-+ +-+--+
/// |  +-+-+-++-+-+-+  |
/// |    | |    | |    |
/// +----+ +----+ +----+
/// ```
///
/// We return the pattern in two parts: the outer collection of `n x n`
/// non-overlapping squares, and the inner collection of `(n - 1) x (n - 1)`
/// non-overlapping squares.
pub fn checkerboard(n: usize) -> (Vec<Polygon>, Vec<Polygon>) {
    (
        squares((0, 0), 30, 40, 0, n),
        squares((20, 20), 30, 40, 0, n.saturating_sub(1)),
    )
}

/// Like `checkerboard`, but with no exactly-horizontal lines.
///
/// Slanted edges cross off the grid, so this exercises snap rounding.
pub fn slanted_checkerboard(n: usize) -> (Vec<Polygon>, Vec<Polygon>) {
    (
        squares((0, 0), 30, 40, 1, n),
        squares((20, 20), 30, 40, 1, n.saturating_sub(1)),
    )
}

/// The "evens" are a bunch of long, skinny parallelograms going from bottom-left
/// to top-right. The "odds" go from bottom-right to top-left.
pub fn slanties(n: usize) -> (Vec<Polygon>, Vec<Polygon>) {
    let h = 20 * n as Coord;

    let mut even = Vec::new();
    let mut odd = Vec::new();
    for i in 0..n {
        let x_off = 20 * i as Coord;
        even.push(Polygon::new([
            (x_off, 0),
            (x_off + h, h),
            (x_off + h + 10, h),
            (x_off + 10, 0),
        ]));

        odd.push(Polygon::new([
            (x_off + h, 0),
            (x_off, h),
            (x_off + 10, h),
            (x_off + h + 10, 0),
        ]));
    }

    (even, odd)
}

/// A routing-like pattern: `n` horizontal wires on one layer, `n` vertical ones
/// on another, and a via box at every crossing.
pub fn wires(n: usize) -> (Vec<Polygon>, Vec<Polygon>, Vec<Rect>) {
    let len = 100 * n as Coord;
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    let mut vias = Vec::new();
    for i in 0..n {
        let p = 100 * i as Coord + 50;
        horizontal.push(Polygon::from_rect(Rect::new(0, p - 5, len, p + 5)));
        vertical.push(Polygon::from_rect(Rect::new(p - 5, 0, p + 5, len)));
        for j in 0..n {
            let q = 100 * j as Coord + 50;
            vias.push(Rect::new(p - 3, q - 3, p + 3, q + 3));
        }
    }
    (horizontal, vertical, vias)
}
