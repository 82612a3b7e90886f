//! The entity trait and the shared per-entity state block.
//!
//! Concrete entities embed an [`EntityCore`] and expose it through the
//! [`Entity`] trait; the stage drives layout, drawing, and event
//! delivery generically through that surface.

use std::any::Any;

use crate::canvas::{Canvas, DisplayList, RecordingCanvas};
use crate::dirty::Dirty;
use crate::geometry::{Matrix, Point, Rect};
use crate::layout::SizePolicy;
use crate::responder::Responder;
use crate::shape::Shape;
use crate::stage::{BrushId, EntityId, Stage};

/// Repositions an entity whenever its parent's frame changes.
///
/// Receives the entity's core and the parent's local rect.
pub type Constraint = Box<dyn FnMut(&mut EntityCore, Rect)>;

/// State every entity carries: frame, styling, transforms, buffering,
/// and the handler registry.
pub struct EntityCore {
    pub name: Option<String>,

    /// Position and size in the parent's coordinate space.
    pub(crate) frame: Rect,
    pub min_width: f32,
    pub min_height: f32,
    pub width_policy: SizePolicy,
    pub height_policy: SizePolicy,

    pub(crate) visible: bool,
    /// Excluded entities are skipped by both layout and drawing.
    pub(crate) included: bool,
    pub(crate) alpha: f32,
    /// Snap the frame origin to whole pixels when drawing.
    pub round_x: bool,
    pub round_y: bool,

    pub(crate) anchor_x: f32,
    pub(crate) anchor_y: f32,
    pub(crate) scale_x: f32,
    pub(crate) scale_y: f32,
    pub(crate) rotation: f32,
    pub(crate) flip_x: bool,
    pub(crate) flip_y: bool,
    matrix_cache: Option<Matrix>,

    pub(crate) background: Option<BrushId>,
    /// Custom hit-test bounds in local coordinates. Defaults to the
    /// frame rect when absent.
    pub bounds: Option<Shape>,

    pub(crate) buffered: bool,
    pub(crate) display_list: Option<DisplayList>,

    pub responder: Responder,
    pub track_cursor: bool,
    pub(crate) cursor_inside: bool,
    pub draggable: bool,

    pub(crate) constraints: Vec<Constraint>,
}

impl Default for EntityCore {
    fn default() -> Self {
        Self {
            name: None,
            frame: Rect::new(0.0, 0.0, 0.0, 0.0),
            min_width: 0.0,
            min_height: 0.0,
            width_policy: SizePolicy::default(),
            height_policy: SizePolicy::default(),
            visible: true,
            included: true,
            alpha: 1.0,
            round_x: false,
            round_y: false,
            anchor_x: 0.0,
            anchor_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            matrix_cache: None,
            background: None,
            bounds: None,
            buffered: false,
            display_list: None,
            responder: Responder::new(),
            track_cursor: false,
            cursor_inside: false,
            draggable: false,
            constraints: Vec::new(),
        }
    }
}

impl EntityCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// The local rect `(0, 0, width, height)`.
    pub fn local_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.frame.width, self.frame.height)
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn included(&self) -> bool {
        self.included
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn background(&self) -> Option<BrushId> {
        self.background
    }

    pub fn buffered(&self) -> bool {
        self.buffered
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Pre-registration positioning. The stage setters replace these
    /// once the entity lives in a stage.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.frame.x = x;
        self.frame.y = y;
        self
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.frame.width = width.max(self.min_width);
        self.frame.height = height.max(self.min_height);
        self
    }

    pub fn with_policy(mut self, width: SizePolicy, height: SizePolicy) -> Self {
        self.width_policy = width;
        self.height_policy = height;
        self
    }

    pub fn with_buffering(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Whether the entity applies any transform beyond its position.
    pub fn is_transformed(&self) -> bool {
        self.scale_x != 1.0
            || self.scale_y != 1.0
            || self.rotation != 0.0
            || self.flip_x
            || self.flip_y
    }

    pub(crate) fn invalidate_matrix(&mut self) {
        self.matrix_cache = None;
    }

    /// The local-to-parent matrix, lazily rebuilt after POSITION, SIZE,
    /// or TRANSFORMS changes.
    ///
    /// Order: translate to the anchored position, scale, rotate, undo
    /// the anchor shift, then mirror across the frame center for flips.
    pub fn matrix(&mut self) -> Matrix {
        if let Some(m) = self.matrix_cache {
            return m;
        }
        let x = if self.round_x {
            self.frame.x.round()
        } else {
            self.frame.x
        };
        let y = if self.round_y {
            self.frame.y.round()
        } else {
            self.frame.y
        };
        let mut m = Matrix::identity();
        m.translate(x + self.anchor_x, y + self.anchor_y);
        if self.scale_x != 1.0 || self.scale_y != 1.0 {
            m.scale(self.scale_x, self.scale_y);
        }
        if self.rotation != 0.0 {
            m.rotate(self.rotation);
        }
        m.translate(-self.anchor_x, -self.anchor_y);
        if self.flip_x {
            m.translate(self.frame.width, 0.0);
            m.scale(-1.0, 1.0);
        }
        if self.flip_y {
            m.translate(0.0, self.frame.height);
            m.scale(1.0, -1.0);
        }
        self.matrix_cache = Some(m);
        m
    }

    /// Map a point from parent coordinates into local coordinates.
    /// Fails when the matrix collapses, as with a zero scale.
    pub fn parent_to_local(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let m = self.matrix();
        if m.determinant() == 0.0 {
            return None;
        }
        let p = m.inverse_transform_point(Point::new(x, y));
        Some((p.x, p.y))
    }

    /// Boundary-inclusive local hit test against the custom bounds or
    /// the frame rect.
    pub fn hit_test_local(&self, x: f32, y: f32) -> bool {
        match &self.bounds {
            Some(shape) => shape.contains(x, y),
            None => self.local_rect().contains(x, y),
        }
    }
}

impl std::fmt::Debug for EntityCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCore")
            .field("name", &self.name)
            .field("frame", &self.frame)
            .field("visible", &self.visible)
            .field("included", &self.included)
            .field("buffered", &self.buffered)
            .finish()
    }
}

/// A node in the scenegraph.
///
/// The stage owns entities behind this trait; hooks receive the stage
/// and the entity's own id so they can reach children and siblings.
pub trait Entity: Any {
    fn core(&self) -> &EntityCore;
    fn core_mut(&mut self) -> &mut EntityCore;

    /// Recompute child placement. Containers override; leaves ignore.
    fn form(&mut self, _stage: &mut Stage, _id: EntityId) {}

    /// Paint the entity's own content in local coordinates. Children
    /// are drawn by the stage afterwards.
    fn draw_contents(&mut self, _stage: &mut Stage, _id: EntityId, _canvas: &mut dyn Canvas) {}

    /// A child was attached under this entity.
    fn child_added(&mut self, _stage: &mut Stage, _id: EntityId, _child: EntityId) {}

    /// A child was detached from this entity.
    fn child_removed(&mut self, _stage: &mut Stage, _id: EntityId, _child: EntityId) {}

    /// A child in this entity's subtree was dirtied. The default bubbles
    /// a CONTENT dirty; containers reform when a child's frame changed.
    fn child_dirtied(&mut self, stage: &mut Stage, id: EntityId, _child: EntityId, _flags: Dirty) {
        stage.dirty(id, Dirty::CONTENT);
    }

    /// Extra painted region beyond the frame, in local coordinates.
    /// Leaves that stroke or shadow outside their frame report it here.
    fn content_scope(&self, _stage: &Stage, _id: EntityId) -> Option<Rect> {
        None
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Draw an entity and its subtree onto a canvas.
///
/// Applies visibility, alpha, position, transforms, and the background
/// before the entity's own content, then recurses into children in
/// z-order and clears the accumulated dirt.
pub fn draw_entity(stage: &mut Stage, id: EntityId, canvas: &mut dyn Canvas) {
    let (visible, included) = match stage.try_core(id) {
        Some(core) => (core.visible, core.included),
        None => return,
    };
    if !visible || !included {
        stage.mark_drawn(id);
        return;
    }

    canvas.save();
    apply_local_transform(stage, id, canvas);

    // Background fills the frame behind the contents.
    if let Some(brush_id) = stage.try_core(id).and_then(|c| c.background) {
        if let Some(brush) = stage.brush(brush_id) {
            let brush = brush.clone();
            let rect = stage.try_core(id).map(|c| c.local_rect()).unwrap_or_default();
            canvas.paint_rect(rect, &brush);
        }
    }

    draw_contents_buffered(stage, id, canvas);

    for child in stage.children(id) {
        draw_entity(stage, child, canvas);
    }

    canvas.restore();
    stage.mark_drawn(id);
}

/// Emit the save-scoped transform calls for an entity's frame.
pub(crate) fn apply_local_transform(stage: &mut Stage, id: EntityId, canvas: &mut dyn Canvas) {
    let Some(core) = stage.try_core_mut(id) else {
        return;
    };
    let alpha = core.alpha;
    let x = if core.round_x {
        core.frame.x.round()
    } else {
        core.frame.x
    };
    let y = if core.round_y {
        core.frame.y.round()
    } else {
        core.frame.y
    };
    let (anchor_x, anchor_y) = (core.anchor_x, core.anchor_y);
    let (scale_x, scale_y) = (core.scale_x, core.scale_y);
    let rotation = core.rotation;
    let (flip_x, flip_y) = (core.flip_x, core.flip_y);
    let (width, height) = (core.frame.width, core.frame.height);

    if alpha < 1.0 {
        canvas.apply_alpha(alpha);
    }
    canvas.translate(x + anchor_x, y + anchor_y);
    if scale_x != 1.0 || scale_y != 1.0 {
        canvas.scale(scale_x, scale_y);
    }
    if rotation != 0.0 {
        canvas.rotate(rotation);
    }
    if anchor_x != 0.0 || anchor_y != 0.0 {
        canvas.translate(-anchor_x, -anchor_y);
    }
    if flip_x {
        canvas.translate(width, 0.0);
        canvas.scale(-1.0, 1.0);
    }
    if flip_y {
        canvas.translate(0.0, height);
        canvas.scale(1.0, -1.0);
    }
}

/// Paint own contents, through the display-list cache when buffered.
fn draw_contents_buffered(stage: &mut Stage, id: EntityId, canvas: &mut dyn Canvas) {
    let buffered = stage.try_core(id).is_some_and(|c| c.buffered);
    if !buffered {
        stage.with_entity_mut(id, |stage, entity| {
            entity.draw_contents(stage, id, canvas);
        });
        return;
    }

    let content_stale = stage
        .dirtied(id)
        .intersects(Dirty::CONTENT | Dirty::STYLE | Dirty::SIZE)
        || stage.try_core(id).is_some_and(|c| c.display_list.is_none());
    if content_stale {
        let mut recorder = RecordingCanvas::new();
        stage.with_entity_mut(id, |stage, entity| {
            entity.draw_contents(stage, id, &mut recorder);
        });
        if let Some(core) = stage.try_core_mut(id) {
            core.display_list = Some(recorder.into_list());
        }
    }
    if let Some(list) = stage.try_core(id).and_then(|c| c.display_list.clone()) {
        canvas.draw_list(&list);
    }
}

/// The region an entity's subtree paints, in parent coordinates.
///
/// Covers the frame outset by the background brush's stroke and shadow
/// reach, custom bounds, and every child scope, all mapped through the
/// entity's transform.
pub fn scope_of(stage: &mut Stage, id: EntityId) -> Option<Rect> {
    let core = stage.try_core(id)?;
    if !core.included || !core.visible {
        return None;
    }
    let mut local = core.local_rect();
    if let Some(bounds) = &core.bounds {
        local = local.include(bounds.scope());
    }
    if let Some(brush_id) = core.background {
        if let Some(brush) = stage.brush(brush_id) {
            let padding = brush.scope_padding();
            local = local.outset(padding);
        }
    }
    let content = stage
        .with_entity_mut(id, |stage, entity| entity.content_scope(stage, id))
        .flatten();
    if let Some(content) = content {
        local = local.include(content);
    }
    for child in stage.children(id) {
        if let Some(child_scope) = scope_of(stage, child) {
            local = local.include(child_scope);
        }
    }
    let matrix = stage.try_core_mut(id)?.matrix();
    Some(matrix.transform_rect(local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_position_only() {
        let mut core = EntityCore::new().at(10.0, 20.0).sized(5.0, 5.0);
        let m = core.matrix();
        let p = m.transform_point(crate::geometry::Point::new(0.0, 0.0));
        assert_eq!((p.x, p.y), (10.0, 20.0));
    }

    #[test]
    fn test_matrix_cached_until_invalidated() {
        let mut core = EntityCore::new().at(1.0, 1.0);
        let _ = core.matrix();
        core.frame.x = 50.0;
        // Stale until invalidated.
        let p = core
            .matrix()
            .transform_point(crate::geometry::Point::new(0.0, 0.0));
        assert_eq!(p.x, 1.0);
        core.invalidate_matrix();
        let p = core
            .matrix()
            .transform_point(crate::geometry::Point::new(0.0, 0.0));
        assert_eq!(p.x, 50.0);
    }

    #[test]
    fn test_rotation_about_anchor() {
        let mut core = EntityCore::new().sized(10.0, 10.0);
        core.anchor_x = 5.0;
        core.anchor_y = 5.0;
        core.rotation = std::f32::consts::PI;
        let m = core.matrix();
        let p = m.transform_point(crate::geometry::Point::new(0.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-4);
        assert!((p.y - 10.0).abs() < 1e-4);
        // The anchor itself stays fixed.
        let c = m.transform_point(crate::geometry::Point::new(5.0, 5.0));
        assert!((c.x - 5.0).abs() < 1e-4);
        assert!((c.y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_flip_x_mirrors_about_center() {
        let mut core = EntityCore::new().sized(10.0, 4.0);
        core.flip_x = true;
        let m = core.matrix();
        let p = m.transform_point(crate::geometry::Point::new(0.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-4);
        let c = m.transform_point(crate::geometry::Point::new(5.0, 2.0));
        assert!((c.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_hit_test_boundary_inclusive() {
        let core = EntityCore::new().sized(10.0, 10.0);
        assert!(core.hit_test_local(0.0, 0.0));
        assert!(core.hit_test_local(10.0, 10.0));
        assert!(!core.hit_test_local(10.1, 5.0));
    }

    #[test]
    fn test_custom_bounds_hit_test() {
        let mut core = EntityCore::new().sized(10.0, 10.0);
        core.bounds = Some(Shape::circle(5.0, 5.0, 5.0));
        assert!(core.hit_test_local(5.0, 5.0));
        assert!(!core.hit_test_local(0.5, 0.5));
    }
}
