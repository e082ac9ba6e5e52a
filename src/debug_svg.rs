//! Dumping geometry to SVG, for looking at it while debugging.

use svg::node::element::path::Data;
use svg::node::element::Path;
use svg::Document;

use crate::geom::{contour_edges, Edge, Polygon, Rect};

/// Builds a document showing layers of polygons, each in its own color.
///
/// The y axis points up, as in layouts.
pub fn polygons(layers: &[(&[Polygon], &str)]) -> Document {
    let bbox = layers
        .iter()
        .flat_map(|(polys, _)| polys.iter())
        .fold(Rect::empty(), |r, p| r.union(&p.bbox()));
    let mut doc = document(bbox);
    let stroke_width = stroke_width(bbox);

    for (polys, color) in layers {
        let mut data = Data::new();
        for p in polys.iter() {
            for c in std::iter::once(p.hull()).chain(p.holes().iter().map(Vec::as_slice)) {
                let Some((first, rest)) = c.split_first() else {
                    continue;
                };
                data = data.move_to((first.x as f64, first.y as f64));
                for q in rest {
                    data = data.line_to((q.x as f64, q.y as f64));
                }
                data = data.close();
            }
        }
        let path = Path::new()
            .set("stroke", "black")
            .set("stroke-width", stroke_width)
            .set("stroke-linejoin", "round")
            .set("fill-rule", "evenodd")
            .set("opacity", 0.5)
            .set("fill", *color)
            .set("d", data);
        doc = doc.add(path);
    }
    doc
}

/// Adds edges, for example the raw output of an edge processor pass, to a document.
pub fn add_edges(mut doc: Document, edges: &[Edge], color: &str, stroke_width: f64) -> Document {
    for e in edges {
        let data = Data::new()
            .move_to((e.p1.x as f64, e.p1.y as f64))
            .line_to((e.p2.x as f64, e.p2.y as f64));
        let path = Path::new()
            .set("stroke", color)
            .set("stroke-width", stroke_width)
            .set("stroke-linecap", "round")
            .set("d", data);
        doc = doc.add(path);
    }
    doc
}

/// Adds the edges of polygons to a document.
pub fn add_outlines(doc: Document, polys: &[Polygon], color: &str, stroke_width: f64) -> Document {
    let edges: Vec<Edge> = polys
        .iter()
        .flat_map(|p| {
            std::iter::once(p.hull())
                .chain(p.holes().iter().map(Vec::as_slice))
                .flat_map(contour_edges)
        })
        .collect();
    add_edges(doc, &edges, color, stroke_width)
}

fn stroke_width(bbox: Rect) -> f64 {
    (bbox.width().max(bbox.height()) as f64 / 512.0).max(0.1)
}

fn document(bbox: Rect) -> Document {
    let bbox = if bbox.is_empty() {
        Rect::new(0, 0, 1, 1)
    } else {
        bbox
    };
    let pad = stroke_width(bbox) * 4.0;
    let (w, h) = (bbox.width() as f64, bbox.height() as f64);
    let group_transform = format!("matrix(1 0 0 -1 0 {})", bbox.top as f64 + bbox.bottom as f64);
    Document::new()
        .set(
            "viewBox",
            (
                bbox.left as f64 - pad,
                bbox.bottom as f64 - pad,
                w + 2.0 * pad,
                h + 2.0 * pad,
            ),
        )
        .set("transform", group_transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump() {
        let a = [Polygon::from_rect(Rect::new(0, 0, 10, 10))];
        let doc = polygons(&[(&a[..], "red")]);
        let doc = add_outlines(doc, &a, "blue", 0.5);
        let text = doc.to_string();
        assert!(text.contains("viewBox"));
        assert_eq!(text.matches("<path").count(), 5);
    }
}
