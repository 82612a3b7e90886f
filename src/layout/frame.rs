//! Single-child container with margins.

use std::any::Any;

use crate::dirty::Dirty;
use crate::entity::{Entity, EntityCore};
use crate::layout::{layout_children, Container};
use crate::stage::{EntityId, Stage};

/// Which side of the margin relationship gives way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSizing {
    /// The frame resizes itself to the child plus margins.
    ResizeSelf,
    /// The child is resized to the frame minus margins.
    ResizeChild,
}

/// Wraps one child with margins on all four sides.
pub struct Frame {
    core: EntityCore,
    margin_left: f32,
    margin_top: f32,
    margin_right: f32,
    margin_bottom: f32,
    sizing: FrameSizing,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            core: EntityCore::new(),
            margin_left: 0.0,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            sizing: FrameSizing::ResizeSelf,
        }
    }

    pub fn with_margins(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.margin_left = left;
        self.margin_top = top;
        self.margin_right = right;
        self.margin_bottom = bottom;
        self
    }

    pub fn with_uniform_margin(self, margin: f32) -> Self {
        self.with_margins(margin, margin, margin, margin)
    }

    pub fn with_sizing(mut self, sizing: FrameSizing) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.core = self.core.sized(width, height);
        self
    }

    pub fn margins(&self) -> (f32, f32, f32, f32) {
        (
            self.margin_left,
            self.margin_top,
            self.margin_right,
            self.margin_bottom,
        )
    }

    pub fn sizing(&self) -> FrameSizing {
        self.sizing
    }

    pub fn set_margins(
        &mut self,
        stage: &mut Stage,
        id: EntityId,
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
    ) {
        if (left, top, right, bottom)
            == (
                self.margin_left,
                self.margin_top,
                self.margin_right,
                self.margin_bottom,
            )
        {
            return;
        }
        self.margin_left = left;
        self.margin_top = top;
        self.margin_right = right;
        self.margin_bottom = bottom;
        self.reform_self(stage, id);
        stage.dirty(id, Dirty::CONTENT);
    }

    pub fn set_sizing(&mut self, stage: &mut Stage, id: EntityId, sizing: FrameSizing) {
        if self.sizing == sizing {
            return;
        }
        self.sizing = sizing;
        self.reform_self(stage, id);
        stage.dirty(id, Dirty::CONTENT);
    }

    /// The wrapped child, when present.
    pub fn child(&self, stage: &Stage, id: EntityId) -> Option<EntityId> {
        layout_children(stage, id).into_iter().next()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Frame {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn form(&mut self, stage: &mut Stage, id: EntityId) {
        let Some(child) = layout_children(stage, id).into_iter().next() else {
            return;
        };
        match self.sizing {
            FrameSizing::ResizeSelf => {
                stage.set_position(child, self.margin_left, self.margin_top);
                let Some(frame) = stage.try_core(child).map(|c| c.frame()) else {
                    return;
                };
                let width = frame.width + self.margin_left + self.margin_right;
                let height = frame.height + self.margin_top + self.margin_bottom;
                if self.core.frame.width != width || self.core.frame.height != height {
                    self.core.frame.width = width;
                    self.core.frame.height = height;
                    self.core.invalidate_matrix();
                    stage.dirty(id, Dirty::SIZE);
                }
            }
            FrameSizing::ResizeChild => {
                let inner = self.core.local_rect();
                let width = (inner.width - self.margin_left - self.margin_right).max(0.0);
                let height = (inner.height - self.margin_top - self.margin_bottom).max(0.0);
                stage.set_position(child, self.margin_left, self.margin_top);
                stage.set_size(child, width, height);
            }
        }
    }

    fn child_added(&mut self, stage: &mut Stage, id: EntityId, child: EntityId) {
        // One child only; newcomers replace the incumbent.
        for existing in stage.children(id) {
            if existing != child {
                let _ = stage.remove_parent(existing);
            }
        }
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

impl Container for Frame {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::layout::add_to;
    use crate::test_util::Leaf;

    fn frame_of(stage: &Stage, id: EntityId) -> Rect {
        stage.try_core(id).unwrap().frame()
    }

    #[test]
    fn test_resize_self_wraps_child() {
        let mut stage = Stage::new();
        let frame = stage.register(Frame::new().with_margins(4.0, 2.0, 6.0, 8.0));
        let child = stage.register(Leaf::sized(20.0, 10.0));
        add_to(&mut stage, frame, child).unwrap();
        assert_eq!(frame_of(&stage, child).origin(), crate::geometry::Point::new(4.0, 2.0));
        let own = frame_of(&stage, frame);
        assert_eq!((own.width, own.height), (30.0, 20.0));
    }

    #[test]
    fn test_resize_self_follows_child_growth() {
        let mut stage = Stage::new();
        let frame = stage.register(Frame::new().with_uniform_margin(5.0));
        let child = stage.register(Leaf::sized(10.0, 10.0));
        add_to(&mut stage, frame, child).unwrap();
        stage.set_size(child, 40.0, 20.0);
        let own = frame_of(&stage, frame);
        assert_eq!((own.width, own.height), (50.0, 30.0));
    }

    #[test]
    fn test_resize_child_fills_margin_box() {
        let mut stage = Stage::new();
        let frame = stage.register(
            Frame::new()
                .with_uniform_margin(5.0)
                .with_sizing(FrameSizing::ResizeChild)
                .sized(100.0, 60.0),
        );
        let child = stage.register(Leaf::new());
        add_to(&mut stage, frame, child).unwrap();
        assert_eq!(frame_of(&stage, child), Rect::new(5.0, 5.0, 90.0, 50.0));
        stage.set_size(frame, 50.0, 40.0);
        assert_eq!(frame_of(&stage, child), Rect::new(5.0, 5.0, 40.0, 30.0));
    }

    #[test]
    fn test_resize_child_respects_minimum() {
        let mut stage = Stage::new();
        let frame = stage.register(
            Frame::new()
                .with_uniform_margin(5.0)
                .with_sizing(FrameSizing::ResizeChild)
                .sized(20.0, 20.0),
        );
        let mut leaf = Leaf::new();
        leaf.core.min_width = 30.0;
        leaf.core.min_height = 30.0;
        let child = stage.register(leaf);
        add_to(&mut stage, frame, child).unwrap();
        let child_frame = frame_of(&stage, child);
        assert_eq!((child_frame.width, child_frame.height), (30.0, 30.0));
    }

    #[test]
    fn test_second_child_replaces_first() {
        let mut stage = Stage::new();
        let frame = stage.register(Frame::new());
        let first = stage.register(Leaf::sized(10.0, 10.0));
        let second = stage.register(Leaf::sized(20.0, 20.0));
        add_to(&mut stage, frame, first).unwrap();
        add_to(&mut stage, frame, second).unwrap();
        assert_eq!(stage.parent(first), None);
        assert_eq!(stage.parent(second), Some(frame));
    }
}
