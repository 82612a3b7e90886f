//! Leaf entity that paints a single styled shape.

use std::any::Any;

use crate::canvas::Canvas;
use crate::dirty::Dirty;
use crate::entity::{Entity, EntityCore};
use crate::error::SceneError;
use crate::geometry::Rect;
use crate::shape::Shape;
use crate::stage::{BrushId, EntityId, Stage};

/// A shape drawn with a shared brush.
///
/// The frame is sized to the shape's bounding rect; the shape's own
/// coordinates are local. Attach a brush after registration so style
/// changes fan back to this entity.
pub struct PaintedShape {
    core: EntityCore,
    shape: Shape,
    brush: Option<BrushId>,
}

impl PaintedShape {
    pub fn new(shape: Shape) -> Self {
        let scope = shape.scope();
        Self {
            core: EntityCore::new().sized(scope.right(), scope.bottom()),
            shape,
            brush: None,
        }
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        Self::new(Shape::rectangle(0.0, 0.0, width, height))
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(Shape::circle(radius, radius, radius))
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.core = self.core.at(x, y);
        self
    }

    pub fn buffered(mut self) -> Self {
        self.core = self.core.with_buffering(true);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.core.name = Some(name.into());
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn brush(&self) -> Option<BrushId> {
        self.brush
    }

    /// Swap the painted shape; the frame follows its bounding rect.
    pub fn set_shape(&mut self, stage: &mut Stage, id: EntityId, shape: Shape) {
        if self.shape == shape {
            return;
        }
        let scope = shape.scope();
        self.shape = shape;
        self.core.frame.width = scope.right().max(self.core.min_width);
        self.core.frame.height = scope.bottom().max(self.core.min_height);
        self.core.invalidate_matrix();
        stage.dirty(id, Dirty::CONTENT | Dirty::SIZE);
    }

    /// Attach a shared brush, detaching any previous one.
    pub fn set_brush(
        &mut self,
        stage: &mut Stage,
        id: EntityId,
        brush: Option<BrushId>,
    ) -> Result<(), SceneError> {
        if self.brush == brush {
            return Ok(());
        }
        if let Some(old) = self.brush {
            stage.detach_brush(old, id);
        }
        if let Some(new) = brush {
            stage.attach_brush(new, id, Dirty::STYLE)?;
        }
        self.brush = brush;
        stage.dirty(id, Dirty::STYLE);
        Ok(())
    }
}

impl Entity for PaintedShape {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn draw_contents(&mut self, stage: &mut Stage, _id: EntityId, canvas: &mut dyn Canvas) {
        let Some(brush) = self.brush.and_then(|b| stage.brush(b)).cloned() else {
            return;
        };
        canvas.paint_shape(&self.shape, &brush);
    }

    fn content_scope(&self, stage: &Stage, _id: EntityId) -> Option<Rect> {
        let brush = self.brush.and_then(|b| stage.brush(b))?;
        let padding = brush.scope_padding();
        let mut scope = self.shape.scope();
        if padding > 0.0 {
            scope = scope.outset(padding);
        }
        Some(scope)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{Brush, Color};
    use crate::canvas::{CanvasOp, RecordingCanvas};
    use crate::entity::draw_entity;

    #[test]
    fn test_frame_follows_shape() {
        let shape = PaintedShape::rectangle(30.0, 20.0);
        let frame = shape.core().frame();
        assert_eq!((frame.width, frame.height), (30.0, 20.0));
        let circle = PaintedShape::circle(10.0);
        let frame = circle.core().frame();
        assert_eq!((frame.width, frame.height), (20.0, 20.0));
    }

    #[test]
    fn test_draw_paints_shape_with_brush() {
        let mut stage = Stage::new();
        let id = stage.register(PaintedShape::rectangle(10.0, 10.0).at(5.0, 5.0));
        let brush = stage.add_brush(Brush::fill(Color::RED));
        stage.with_typed_mut::<PaintedShape, _>(id, |stage, shape| {
            shape.set_brush(stage, id, Some(brush)).unwrap();
        });
        let mut canvas = RecordingCanvas::new();
        draw_entity(&mut stage, id, &mut canvas);
        assert!(canvas
            .ops()
            .iter()
            .any(|op| matches!(op, CanvasOp::PaintShape(_, _))));
        assert!(stage.is_clean(id));
    }

    #[test]
    fn test_no_brush_paints_nothing() {
        let mut stage = Stage::new();
        let id = stage.register(PaintedShape::rectangle(10.0, 10.0));
        let mut canvas = RecordingCanvas::new();
        draw_entity(&mut stage, id, &mut canvas);
        assert!(!canvas
            .ops()
            .iter()
            .any(|op| matches!(op, CanvasOp::PaintShape(_, _))));
    }

    #[test]
    fn test_brush_update_dirties_shape() {
        let mut stage = Stage::new();
        let id = stage.register(PaintedShape::rectangle(10.0, 10.0));
        let brush = stage.add_brush(Brush::fill(Color::RED));
        stage.with_typed_mut::<PaintedShape, _>(id, |stage, shape| {
            shape.set_brush(stage, id, Some(brush)).unwrap();
        });
        stage.mark_drawn(id);
        stage
            .update_brush(brush, |b| b.set_fill_color(Color::BLUE))
            .unwrap();
        assert!(stage.dirtied(id).contains(Dirty::STYLE));
    }

    #[test]
    fn test_content_scope_includes_stroke() {
        let mut stage = Stage::new();
        let id = stage.register(PaintedShape::rectangle(10.0, 10.0));
        let brush = stage.add_brush(Brush::fill(Color::RED).with_stroke(Color::BLACK, 4.0));
        stage.with_typed_mut::<PaintedShape, _>(id, |stage, shape| {
            shape.set_brush(stage, id, Some(brush)).unwrap();
        });
        let scope = stage
            .with_entity_mut(id, |stage, e| e.content_scope(stage, id))
            .flatten()
            .unwrap();
        assert_eq!(scope, Rect::new(-2.0, -2.0, 14.0, 14.0));
    }

    #[test]
    fn test_buffered_replays_cached_list() {
        let mut stage = Stage::new();
        let id = stage.register(PaintedShape::rectangle(10.0, 10.0).buffered());
        let brush = stage.add_brush(Brush::fill(Color::GREEN));
        stage.with_typed_mut::<PaintedShape, _>(id, |stage, shape| {
            shape.set_brush(stage, id, Some(brush)).unwrap();
        });
        let mut first = RecordingCanvas::new();
        draw_entity(&mut stage, id, &mut first);
        // Clean redraw replays the cache and produces identical ops.
        let mut second = RecordingCanvas::new();
        draw_entity(&mut stage, id, &mut second);
        assert_eq!(first.ops(), second.ops());
    }
}
