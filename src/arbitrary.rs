//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;

use crate::{Coord, Edge, Point, Polygon, Rect};

/// Generate an arbitrary coordinate in some range.
pub fn coord_in_range(
    start: Coord,
    end: Coord,
    u: &mut Unstructured<'_>,
) -> Result<Coord, arbitrary::Error> {
    u.int_in_range(start..=end)
}

/// Generate a coordinate in some range, but give it a chance to be equal or close to another one.
///
/// Coincidences are what make layout geometry hard, so we want a lot of them.
fn another_coord_in_range(
    orig: Coord,
    start: Coord,
    end: Coord,
    u: &mut Unstructured<'_>,
) -> Result<Coord, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let delta: Coord = u.int_in_range(-2..=2)?;
        Ok((orig + delta).clamp(start, end))
    } else {
        coord_in_range(start, end, u)
    }
}

/// Generate an arbitrary point with both coordinates in `-size..=size`.
pub fn point(size: Coord, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        coord_in_range(-size, size, u)?,
        coord_in_range(-size, size, u)?,
    ))
}

/// Generate an arbitrary box with corners in `-size..=size`.
///
/// Degenerate (zero width or height) boxes come out now and then.
pub fn rect(size: Coord, u: &mut Unstructured<'_>) -> Result<Rect, arbitrary::Error> {
    let p = point(size, u)?;
    let x = another_coord_in_range(p.x, -size, size, u)?;
    let y = another_coord_in_range(p.y, -size, size, u)?;
    Ok(Rect::new(p.x, p.y, x, y))
}

/// Generate an arbitrary edge with endpoints in `-size..=size`.
pub fn edge(size: Coord, u: &mut Unstructured<'_>) -> Result<Edge, arbitrary::Error> {
    Ok(Edge::new(point(size, u)?, point(size, u)?))
}

/// Generate an arbitrary rectilinear polygon: a staircase of boxes sharing their bottom edge.
pub fn manhattan_polygon(size: Coord, u: &mut Unstructured<'_>) -> Result<Polygon, arbitrary::Error> {
    let steps = u.int_in_range(1..=4)?;
    let bottom = coord_in_range(-size, size, u)?;
    let mut x = coord_in_range(-size, size, u)?;
    let mut pts = vec![Point::new(x, bottom)];
    for _ in 0..steps {
        let top = coord_in_range(bottom, size, u)?;
        let next = coord_in_range(x, size, u)?;
        pts.push(Point::new(x, top));
        pts.push(Point::new(next, top));
        x = next;
    }
    pts.push(Point::new(x, bottom));
    Ok(Polygon::new(pts))
}

/// Generate an arbitrary polygon with up to `max_vertices` vertices.
///
/// The polygon may be self-intersecting, and its vertices tend to share
/// coordinates with their predecessors.
pub fn polygon(
    size: Coord,
    max_vertices: usize,
    u: &mut Unstructured<'_>,
) -> Result<Polygon, arbitrary::Error> {
    let n = u.int_in_range(3..=max_vertices.max(3))?;
    let mut pts = vec![point(size, u)?];
    for _ in 1..n {
        let last = pts[pts.len() - 1];
        pts.push(Point::new(
            another_coord_in_range(last.x, -size, size, u)?,
            another_coord_in_range(last.y, -size, size, u)?,
        ));
    }
    Ok(Polygon::new(pts))
}

/// Generate a list of polygons, mixing boxes, rectilinear and general polygons.
pub fn polygons(
    size: Coord,
    max_count: usize,
    u: &mut Unstructured<'_>,
) -> Result<Vec<Polygon>, arbitrary::Error> {
    let n = u.int_in_range(0..=max_count)?;
    let mut ret = Vec::with_capacity(n);
    for _ in 0..n {
        let p = match u.int_in_range(0..=2)? {
            0 => Polygon::from_rect(rect(size, u)?),
            1 => manhattan_polygon(size, u)?,
            _ => polygon(size, 6, u)?,
        };
        ret.push(p);
    }
    Ok(ret)
}
