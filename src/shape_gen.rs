//! Writing results into a shape container.

use crate::geom::Polygon;
use crate::properties::{PropertiesId, PropertyTagged};
use crate::sink::PolygonSink;

/// Where a layout database keeps its shapes.
pub trait ShapeContainer {
    /// Removes all shapes.
    fn clear(&mut self);

    /// Adds a shape.
    fn insert(&mut self, shape: PropertyTagged<Polygon>);
}

impl ShapeContainer for Vec<PropertyTagged<Polygon>> {
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn insert(&mut self, shape: PropertyTagged<Polygon>) {
        self.push(shape);
    }
}

/// A polygon sink inserting into a [`ShapeContainer`].
///
/// If asked to, the container is cleared when the first pass starts. Later
/// passes append, so that one generator can collect the results of several
/// edge processor runs.
pub struct ShapeGenerator<'c, C: ?Sized> {
    container: &'c mut C,
    properties_id: PropertiesId,
    clear_first: bool,
    started: bool,
}

impl<C: ShapeContainer + ?Sized> std::fmt::Debug for ShapeGenerator<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeGenerator")
            .field("properties_id", &self.properties_id)
            .field("clear_first", &self.clear_first)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl<'c, C: ShapeContainer + ?Sized> ShapeGenerator<'c, C> {
    /// Creates a generator writing shapes without properties into `container`.
    pub fn new(container: &'c mut C, clear_first: bool) -> Self {
        ShapeGenerator {
            container,
            properties_id: PropertiesId::EMPTY,
            clear_first,
            started: false,
        }
    }

    /// Sets the properties attached to the shapes written from now on.
    pub fn set_properties_id(&mut self, id: PropertiesId) {
        self.properties_id = id;
    }

    /// The properties attached to new shapes.
    pub fn properties_id(&self) -> PropertiesId {
        self.properties_id
    }
}

impl<C: ShapeContainer + ?Sized> PolygonSink for ShapeGenerator<'_, C> {
    fn start(&mut self) {
        if self.clear_first && !self.started {
            self.container.clear();
        }
        self.started = true;
    }

    fn put(&mut self, polygon: Polygon) {
        self.container
            .insert(PropertyTagged::new(polygon, self.properties_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, BooleanOp, EdgeProcessor, PolygonGenerator, Rect};

    #[test]
    fn clears_once() {
        let stale = PropertyTagged::new(Polygon::from_rect(Rect::new(0, 0, 1, 1)), PropertiesId(3));
        let mut shapes = vec![stale];

        let mut ep = EdgeProcessor::new();
        ep.insert_rect(&Rect::new(0, 0, 10, 10), 0);
        ep.insert_rect(&Rect::new(20, 0, 30, 10), 1);
        {
            let mut shape_gen = ShapeGenerator::new(&mut shapes, true);
            shape_gen.set_properties_id(PropertiesId(7));
            let mut gen = PolygonGenerator::new(&mut shape_gen, false, true);
            ep.process(&mut gen, &mut BooleanOp::new(BinaryOp::Or));
            ep.redo(&mut gen, &mut BooleanOp::new(BinaryOp::ANotB));
        }
        let got: Vec<String> = shapes
            .iter()
            .map(|s| format!("{:?} {}", s.properties_id, s.value))
            .collect();
        assert_eq!(
            got,
            vec![
                "prop_7 (0,0;0,10;10,10;10,0)",
                "prop_7 (20,0;20,10;30,10;30,0)",
                "prop_7 (0,0;0,10;10,10;10,0)",
            ]
        );
    }

    #[test]
    fn keeps_existing_shapes() {
        let kept = PropertyTagged::new(Polygon::from_rect(Rect::new(0, 0, 1, 1)), PropertiesId(3));
        let mut shapes = vec![kept.clone()];
        let mut gen = ShapeGenerator::new(&mut shapes, false);
        gen.start();
        gen.put(Polygon::from_rect(Rect::new(5, 5, 6, 6)));
        gen.flush();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0], kept);
        assert_eq!(shapes[1].properties_id, PropertiesId::EMPTY);
    }
}
