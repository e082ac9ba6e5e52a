//! Offset contours for growing and shrinking polygons.
//!
//! Every edge of a contour is moved sideways (away from the interior when
//! growing). The moved edges are joined at each corner, and the resulting,
//! possibly self-overlapping, contour is handed to the edge processor, which
//! keeps the area of positive winding.

use arrayvec::ArrayVec;

use crate::geom::{Coord, Edge, Point};
use crate::num::{round_div, round_div_sqrt};
use crate::Error;

/// How sharp a corner may get before sizing cuts it off.
///
/// When growing, the corner where two moved edges separate is normally filled
/// by extending both edges until they meet (a miter). Sharp corners would grow
/// long spikes that way, so beyond a mode-dependent bend angle the two edge ends
/// are joined directly instead (a bevel):
///
/// | mode | corners bent by more than this are cut |
/// |---|---|
/// | 0 | 0° (every corner) |
/// | 1 | 45° |
/// | 2 | 90° |
/// | 3 | 135° |
/// | 4 | about 168° |
/// | 5 | about 179° |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SizingMode(u8);

// The cosine threshold for each mode, as (sign, numerator², denominator²) of the
// threshold's absolute value.
const THRESHOLDS: [(i8, i128, i128); 6] = [
    (1, 1, 1),
    (1, 1, 2),
    (0, 0, 1),
    (-1, 1, 2),
    (-1, 49 * 49, 50 * 50),
    (-1, 4999 * 4999, 5000 * 5000),
];

impl SizingMode {
    /// The largest valid mode.
    pub const MAX: u32 = 5;

    /// Does a corner between directions `a` and `b` get cut off?
    fn cuts(self, a: (i64, i64), b: (i64, i64)) -> bool {
        let a = scale_down(a);
        let b = scale_down(b);
        let dot = a.0 * b.0 + a.1 * b.1;
        let len2 = (a.0 * a.0 + a.1 * a.1) * (b.0 * b.0 + b.1 * b.1);
        let (sign, num2, den2) = THRESHOLDS[self.0 as usize];
        // Is dot / sqrt(len2) below the threshold?
        match sign {
            0 => dot < 0,
            s if s > 0 => dot < 0 || dot * dot * den2 < num2 * len2,
            _ => dot < 0 && dot * dot * den2 > num2 * len2,
        }
    }
}

impl Default for SizingMode {
    fn default() -> Self {
        SizingMode(2)
    }
}

impl TryFrom<u32> for SizingMode {
    type Error = Error;

    fn try_from(mode: u32) -> Result<Self, Error> {
        if mode <= Self::MAX {
            Ok(SizingMode(mode as u8))
        } else {
            Err(Error::InvalidSizingMode(mode))
        }
    }
}

impl From<SizingMode> for u32 {
    fn from(mode: SizingMode) -> u32 {
        mode.0 as u32
    }
}

// Only the direction matters, so shrink long vectors until their products
// comfortably fit in an i128.
fn scale_down((mut x, mut y): (i64, i64)) -> (i128, i128) {
    while x.abs().max(y.abs()) > 1 << 20 {
        x >>= 1;
        y >>= 1;
    }
    (x as i128, y as i128)
}

fn to_point(x: i128, y: i128) -> Result<Point, Error> {
    let x = Coord::try_from(x).map_err(|_| Error::CoordinateOverflow)?;
    let y = Coord::try_from(y).map_err(|_| Error::CoordinateOverflow)?;
    Ok(Point::new(x, y))
}

// How far an edge with direction `d` moves.
fn shift(d: (i64, i64), dx: Coord, dy: Coord) -> (i128, i128) {
    let (ex, ey) = scale_down(d);
    let len2 = (ex * ex + ey * ey) as u128;
    (
        round_div_sqrt(-(dx as i128) * ey, len2),
        round_div_sqrt(dy as i128 * ex, len2),
    )
}

/// The raw offset of one closed contour, as edges.
///
/// `dx` and `dy` must not have opposite signs. The contour must be normalized
/// (interior on the right, no repeated points).
pub(crate) fn offset_contour(
    contour: &[Point],
    dx: Coord,
    dy: Coord,
    mode: SizingMode,
) -> Result<Vec<Edge>, Error> {
    debug_assert!(!(dx < 0 && dy > 0) && !(dx > 0 && dy < 0));
    let n = contour.len();
    if n < 3 {
        return Ok(Vec::new());
    }
    let grow = dx > 0 || dy > 0;
    let dirs: Vec<(i64, i64)> = (0..n)
        .map(|i| {
            let (p, q) = (contour[i], contour[(i + 1) % n]);
            (q.x as i64 - p.x as i64, q.y as i64 - p.y as i64)
        })
        .collect();
    let shifts: Vec<(i128, i128)> = dirs.iter().map(|&d| shift(d, dx, dy)).collect();

    let mut points: Vec<Point> = Vec::with_capacity(2 * n);
    for i in 0..n {
        let prev = (i + n - 1) % n;
        let p = contour[i];
        let (px, py) = (p.x as i128, p.y as i128);
        let (da, db) = (dirs[prev], dirs[i]);
        let a_end = (px + shifts[prev].0, py + shifts[prev].1);
        let b_start = (px + shifts[i].0, py + shifts[i].1);

        let cross = da.0 as i128 * db.1 as i128 - da.1 as i128 * db.0 as i128;
        let dot = da.0 as i128 * db.0 as i128 + da.1 as i128 * db.1 as i128;
        let mut corner: ArrayVec<(i128, i128), 3> = ArrayVec::new();
        if cross == 0 && dot > 0 {
            corner.push(a_end);
            if b_start != a_end {
                corner.push(b_start);
            }
        } else if cross == 0 || (cross < 0) == grow {
            // The moved edges separate here (and for a spike, they point
            // right back at each other).
            if cross == 0 || mode.cuts(da, db) {
                corner.push(a_end);
                corner.push(b_start);
            } else {
                corner.push(miter(a_end, da, b_start, db, cross));
            }
        } else {
            // The moved edges overlap: go around through the original corner,
            // the loop this creates has negative winding.
            corner.push(a_end);
            corner.push((px, py));
            corner.push(b_start);
        }
        for (x, y) in corner {
            let q = to_point(x, y)?;
            if points.last() != Some(&q) {
                points.push(q);
            }
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    let m = points.len();
    Ok((0..m)
        .map(|i| Edge {
            p1: points[i],
            p2: points[(i + 1) % m],
        })
        .filter(|e| !e.is_degenerate())
        .collect())
}

// Where the line through `a` with direction `da` meets the one through `b` with
// direction `db`, rounded to the grid. `cross` is `da x db`, which is non-zero.
fn miter(a: (i128, i128), da: (i64, i64), b: (i128, i128), db: (i64, i64), cross: i128) -> (i128, i128) {
    let (ax, ay) = (da.0 as i128, da.1 as i128);
    let (bx, by) = (db.0 as i128, db.1 as i128);
    let t = (b.0 - a.0) * by - (b.1 - a.1) * bx;
    (a.0 + round_div(t * ax, cross), a.1 + round_div(t * ay, cross))
}
