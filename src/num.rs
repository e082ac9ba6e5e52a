//! Exact arithmetic helpers.
//!
//! Everything the sweep compares is either an integer or a [`Rational`] whose
//! numerator and denominator come from 32-bit coordinates, so `i128` is always
//! wide enough and no comparison ever needs a tolerance.

use std::cmp::Ordering;

use crate::geom::{Coord, Edge, Point};

/// A rational number `num / den` with `den > 0`.
///
/// Mostly used for the y coordinate of an edge at some integer x.
#[derive(Clone, Copy)]
pub struct Rational {
    num: i128,
    den: i128,
}

impl std::fmt::Debug for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl Rational {
    /// Creates `num / den`. Panics if `den` is zero.
    pub fn new(num: i128, den: i128) -> Self {
        assert!(den != 0, "zero denominator");
        if den < 0 {
            Rational {
                num: -num,
                den: -den,
            }
        } else {
            Rational { num, den }
        }
    }

    /// An integer, as a rational.
    pub fn from_int(x: i128) -> Self {
        Rational { num: x, den: 1 }
    }

    /// Rounds to the nearest integer, with halves going up.
    pub fn round(&self) -> i128 {
        round_div(self.num, self.den)
    }

    /// Rounds towards negative infinity.
    pub fn floor(&self) -> i128 {
        self.num.div_euclid(self.den)
    }

    /// Rounds towards positive infinity.
    pub fn ceil(&self) -> i128 {
        -(-self.num).div_euclid(self.den)
    }

    /// Rounds to the nearest grid coordinate.
    pub fn round_coord(&self) -> Coord {
        let r = self.round();
        debug_assert!(r >= Coord::MIN as i128 && r <= Coord::MAX as i128);
        r as Coord
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rational {}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

/// `a / b` rounded to the nearest integer, with halves rounding up.
pub fn round_div(a: i128, b: i128) -> i128 {
    debug_assert!(b != 0);
    let (a, b) = if b < 0 { (-a, -b) } else { (a, b) };
    (2 * a + b).div_euclid(2 * b)
}

/// The nearest integer to `num / sqrt(sq)`, with halves rounding away from zero.
///
/// `sq` must be positive. Computed without floating point: we look for the
/// integer `r` minimizing `|r - num / sqrt(sq)|` by comparing squares.
pub fn round_div_sqrt(num: i128, sq: u128) -> i128 {
    debug_assert!(sq > 0);
    let neg = num < 0;
    let n = num.unsigned_abs();
    // r = round(n / sqrt(sq)) is the largest r with (2r - 1)^2 * sq <= 4 n^2.
    let target = 4 * n * n;
    let mut lo: u128 = 0;
    let mut hi: u128 = n + 1;
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        let t = 2 * mid - 1;
        let ok = match t.checked_mul(t).and_then(|tt| tt.checked_mul(sq)) {
            Some(v) => v <= target,
            None => false,
        };
        if ok {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    let r = lo as i128;
    if neg {
        -r
    } else {
        r
    }
}

/// The exact y coordinate of the (non-vertical) line through `e` at `x`.
pub fn y_at(e: &Edge, x: Coord) -> Rational {
    let dx = e.dx() as i128;
    debug_assert!(dx != 0, "vertical edge {e:?}");
    let num = e.p1.y as i128 * dx + (x as i128 - e.p1.x as i128) * e.dy() as i128;
    Rational::new(num, dx)
}

/// The cross product `(b - a) x (d - c)`.
pub fn cross_dirs(a: Point, b: Point, c: Point, d: Point) -> i128 {
    let (ux, uy) = (b.x as i128 - a.x as i128, b.y as i128 - a.y as i128);
    let (vx, vy) = (d.x as i128 - c.x as i128, d.y as i128 - c.y as i128);
    ux * vy - uy * vx
}
