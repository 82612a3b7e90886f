//! Scene: the root container that owns incremental redraw.
//!
//! A scene tracks which direct children changed since the last refresh
//! and repaints only the damaged regions of its canvas, falling back to
//! a full redraw when the structure changed or optimization is off.

use std::any::Any;

use crate::canvas::Canvas;
use crate::dirty::Dirty;
use crate::entity::{apply_local_transform, draw_entity, scope_of, Entity, EntityCore};
use crate::geometry::Rect;
use crate::stage::{EntityId, Stage};

/// Scene-own dirt that invalidates every pixel at once.
const FULL_REDRAW_MASK: Dirty = Dirty::VISIBILITY
    .union(Dirty::POSITION)
    .union(Dirty::SIZE)
    .union(Dirty::TRANSFORMS)
    .union(Dirty::STYLE)
    .union(Dirty::BACKGROUND);

/// A drawing surface at the top of an entity subtree.
pub struct Scene {
    core: EntityCore,
    /// Repaint damaged regions only instead of the whole surface.
    pub optimize: bool,
    /// Union overlapping damage rects before repainting.
    pub group_damaged_regions: bool,
    /// Outset applied to every damage rect, covering antialiasing
    /// bleed at region edges.
    pub damaged_region_padding: f32,
    /// Clip children to the scene frame while drawing.
    pub clip_children_to_frame: bool,
    redraw_all: bool,
}

impl Scene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            core: EntityCore::new().sized(width, height),
            optimize: true,
            group_damaged_regions: true,
            damaged_region_padding: 2.0,
            clip_children_to_frame: false,
            redraw_all: true,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.core = self.core.at(x, y);
        self
    }

    pub fn unoptimized(mut self) -> Self {
        self.optimize = false;
        self
    }

    pub fn without_grouping(mut self) -> Self {
        self.group_damaged_regions = false;
        self
    }

    pub fn with_damage_padding(mut self, padding: f32) -> Self {
        self.damaged_region_padding = padding;
        self
    }

    pub fn clipped(mut self) -> Self {
        self.clip_children_to_frame = true;
        self
    }

    /// Request a full repaint at the next refresh.
    pub fn force_redraw_all(&mut self) {
        self.redraw_all = true;
    }

    /// Repaint onto the embedder's canvas, which holds the previous
    /// refresh's pixels.
    ///
    /// Collects per-child damage as the union of each changed child's
    /// previous and current scope, pads and optionally groups the
    /// regions, then clears, repaints the background, and redraws every
    /// intersecting child in z-order inside a clip over the damage.
    pub fn refresh(&mut self, stage: &mut Stage, id: EntityId, canvas: &mut dyn Canvas) {
        if stage.take_structure_changed(id) {
            self.redraw_all = true;
        }
        if stage.dirtied(id).intersects(FULL_REDRAW_MASK) {
            self.redraw_all = true;
        }
        if !self.optimize || self.redraw_all {
            self.full_redraw(stage, id, canvas);
            return;
        }

        let children = stage.children(id);
        let mut regions = Vec::new();
        let mut scopes = Vec::with_capacity(children.len());
        for child in &children {
            let current = scope_of(stage, *child);
            if !stage.is_clean(*child) {
                if let Some(prev) = stage.prev_scope(*child) {
                    regions.push(prev);
                }
                if let Some(current) = current {
                    regions.push(current);
                }
            }
            scopes.push(current);
        }
        if regions.is_empty() {
            stage.mark_drawn(id);
            return;
        }

        let padding = self.damaged_region_padding;
        for region in &mut regions {
            *region = region.outset(padding);
        }
        if self.group_damaged_regions {
            merge_regions(&mut regions);
        }

        canvas.save();
        apply_local_transform(stage, id, canvas);
        if self.clip_children_to_frame {
            canvas.clip_rects(&[self.core.local_rect()]);
        }
        canvas.clip_rects(&regions);
        for region in &regions {
            canvas.clear_rect(*region);
        }
        self.paint_background(stage, canvas);
        for (child, scope) in children.iter().zip(&scopes) {
            let touches = matches!(scope, Some(s) if regions.iter().any(|r| r.intersects(s)));
            if touches || !stage.is_clean(*child) {
                draw_entity(stage, *child, canvas);
            }
        }
        canvas.restore();

        for (child, scope) in children.iter().zip(&scopes) {
            stage.set_prev_scope(*child, *scope);
        }
        stage.mark_drawn(id);
    }

    fn full_redraw(&mut self, stage: &mut Stage, id: EntityId, canvas: &mut dyn Canvas) {
        canvas.save();
        apply_local_transform(stage, id, canvas);
        let local = self.core.local_rect();
        if self.clip_children_to_frame {
            canvas.clip_rects(&[local]);
        }
        canvas.clear_rect(local);
        self.paint_background(stage, canvas);
        let children = stage.children(id);
        for child in &children {
            draw_entity(stage, *child, canvas);
        }
        canvas.restore();
        for child in children {
            let scope = scope_of(stage, child);
            stage.set_prev_scope(child, scope);
            stage.mark_drawn(child);
        }
        stage.mark_drawn(id);
        self.redraw_all = false;
    }

    fn paint_background(&self, stage: &Stage, canvas: &mut dyn Canvas) {
        if let Some(brush) = self.core.background().and_then(|b| stage.brush(b)) {
            let brush = brush.clone();
            canvas.paint_rect(self.core.local_rect(), &brush);
        }
    }
}

/// Union intersecting rects until no two overlap.
fn merge_regions(regions: &mut Vec<Rect>) {
    loop {
        let mut merged = None;
        'scan: for i in 0..regions.len() {
            for j in (i + 1)..regions.len() {
                if regions[i].intersects(&regions[j]) {
                    merged = Some((i, j));
                    break 'scan;
                }
            }
        }
        let Some((i, j)) = merged else { break };
        let other = regions.remove(j);
        regions[i] = regions[i].include(other);
    }
}

impl Entity for Scene {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Refresh a registered [`Scene`] by id.
pub fn refresh_scene(stage: &mut Stage, id: EntityId, canvas: &mut dyn Canvas) {
    let refreshed = stage
        .with_typed_mut::<Scene, _>(id, |stage, scene| {
            scene.refresh(stage, id, canvas);
        })
        .is_some();
    if !refreshed {
        log::warn!("refresh_scene on an id that is not a Scene");
    }
}
