#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod box_scanner;
pub mod cluster;
#[cfg(feature = "debug-svg")]
pub mod debug_svg;
pub mod edge_processor;
pub mod evaluator;
mod geom;
pub mod interaction;
mod num;
pub mod polygon_gen;
pub mod properties;
pub mod property_merge;
pub mod shape_gen;
pub mod sink;
pub mod sizing;
pub mod trapezoid;

#[cfg(feature = "generators")]
pub mod generators;

pub use box_scanner::{
    BoxConverter, BoxScanner, BoxScanner2, BoxScannerReceiver, BoxScannerReceiver2,
};
pub use cluster::{Cluster, ClusterCollector};
pub use edge_processor::EdgeProcessor;
pub use evaluator::{
    BinaryOp, BooleanOp, BooleanOp2, ClassifyMode, EdgePolygonClassifier, Evaluator, FillRule,
    MergeOp, ProbeClass, SimpleMerge, Windings,
};
pub use geom::{Area, Containment, Coord, Edge, Point, Polygon, Rect};
pub use interaction::{InteractionDetector, InteractionMode};
pub use polygon_gen::{PolygonGenerator, SliverFilter};
pub use properties::{PropertiesId, PropertyRepository, PropertySet, PropertyStore, PropertyTagged};
pub use property_merge::merge_by_property;
pub use shape_gen::{ShapeContainer, ShapeGenerator};
pub use sink::{EdgeContainer, EdgeSink, PolygonSink, Span, SpanEdge};
pub use sizing::SizingMode;
pub use trapezoid::TrapezoidGenerator;

/// The things that can go wrong.
///
/// Most operations can't fail: any input, however degenerate, has a
/// well-defined result. Only sizing can produce geometry that doesn't fit
/// the coordinate type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The sizing mode was out of range; valid modes are 0 to 5.
    InvalidSizingMode(u32),
    /// Sizing moved some point beyond the coordinate range.
    CoordinateOverflow,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidSizingMode(m) => {
                write!(f, "invalid sizing mode {m}, expected 0 to {}", SizingMode::MAX)
            }
            Error::CoordinateOverflow => write!(f, "a coordinate overflowed"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_squares() {
        let a = Polygon::from_rect(Rect::new(0, 0, 10, 10));
        let b = Polygon::from_rect(Rect::new(-5, -5, 5, 5));
        let output = EdgeProcessor::new().boolean(&[a], &[b], BinaryOp::And, false, true);
        insta::assert_debug_snapshot!(output, @r"
        [
            (0,0;0,5;5,5;5,0),
        ]
        ");
    }

    #[test]
    fn errors() {
        assert_eq!(
            Error::InvalidSizingMode(9).to_string(),
            "invalid sizing mode 9, expected 0 to 5"
        );
        assert_eq!(Error::CoordinateOverflow.to_string(), "a coordinate overflowed");
    }
}
