//! Sequential stack that sizes itself to its children.

use std::any::Any;

use crate::dirty::Dirty;
use crate::entity::{Entity, EntityCore};
use crate::geometry::Rect;
use crate::layout::{layout_children, Axis, Container};
use crate::stage::{EntityId, Stage};

/// Places children one after another along an axis, keeping their own
/// sizes, and resizes itself to the content: the main extent is the sum
/// of child extents plus spacing, the cross extent the largest child.
///
/// With `reversed` the last-added child is placed first.
pub struct StackLayout {
    core: EntityCore,
    axis: Axis,
    spacing: f32,
    reversed: bool,
}

impl StackLayout {
    pub fn new(axis: Axis) -> Self {
        Self {
            core: EntityCore::new(),
            axis,
            spacing: 0.0,
            reversed: false,
        }
    }

    pub fn horizontal() -> Self {
        Self::new(Axis::Horizontal)
    }

    pub fn vertical() -> Self {
        Self::new(Axis::Vertical)
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.core = self.core.at(x, y);
        self
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn set_spacing(&mut self, stage: &mut Stage, id: EntityId, spacing: f32) {
        if self.spacing == spacing {
            return;
        }
        self.spacing = spacing;
        self.reform_self(stage, id);
        stage.dirty(id, Dirty::CONTENT);
    }

    pub fn set_reversed(&mut self, stage: &mut Stage, id: EntityId, reversed: bool) {
        if self.reversed == reversed {
            return;
        }
        self.reversed = reversed;
        self.reform_self(stage, id);
        stage.dirty(id, Dirty::CONTENT);
    }
}

impl Entity for StackLayout {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn form(&mut self, stage: &mut Stage, id: EntityId) {
        let mut children = layout_children(stage, id);
        if self.reversed {
            children.reverse();
        }
        let horizontal = self.axis == Axis::Horizontal;
        let mut cursor = 0.0;
        let mut cross_max: f32 = 0.0;
        for child in &children {
            let Some(frame) = stage.try_core(*child).map(|c| c.frame()) else {
                continue;
            };
            let (main, cross) = if horizontal {
                (frame.width, frame.height)
            } else {
                (frame.height, frame.width)
            };
            let placed = if horizontal {
                Rect::new(cursor, 0.0, frame.width, frame.height)
            } else {
                Rect::new(0.0, cursor, frame.width, frame.height)
            };
            stage.set_frame(*child, placed);
            cursor += main + self.spacing;
            cross_max = cross_max.max(cross);
        }
        let content_main = if children.is_empty() {
            0.0
        } else {
            cursor - self.spacing
        };
        let (new_width, new_height) = if horizontal {
            (content_main, cross_max)
        } else {
            (cross_max, content_main)
        };
        if self.core.frame.width != new_width || self.core.frame.height != new_height {
            self.core.frame.width = new_width;
            self.core.frame.height = new_height;
            self.core.invalidate_matrix();
            stage.dirty(id, Dirty::SIZE);
        }
    }

    fn child_added(&mut self, stage: &mut Stage, id: EntityId, _child: EntityId) {
        self.reform_self(stage, id);
    }

    fn child_removed(&mut self, stage: &mut Stage, id: EntityId, _child: EntityId) {
        self.reform_self(stage, id);
    }

    fn child_dirtied(&mut self, stage: &mut Stage, id: EntityId, _child: EntityId, flags: Dirty) {
        self.on_child_dirtied(stage, id, flags);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Container for StackLayout {}
