//! Width-constrained line-packing container.

use std::any::Any;
use std::collections::HashMap;

use crate::dirty::Dirty;
use crate::entity::{Entity, EntityCore};
use crate::layout::{layout_children, Container};
use crate::stage::{EntityId, Stage};

/// Packs children into lines against the container width, keeping their
/// own sizes.
///
/// Each line is shifted right by `alignment` times the leftover width
/// (0 left, 0.5 centered, 1 right); within a line a child sits at
/// `vertical_align` times the leftover line height, overridable per
/// child. With `contract_height` the container's height follows the
/// packed content.
pub struct FlowLayout {
    core: EntityCore,
    spacing: f32,
    line_spacing: f32,
    alignment: f32,
    vertical_align: f32,
    child_vertical_align: HashMap<EntityId, f32>,
    contract_height: bool,
}

impl FlowLayout {
    pub fn new(width: f32) -> Self {
        Self {
            core: EntityCore::new().sized(width, 0.0),
            spacing: 0.0,
            line_spacing: 0.0,
            alignment: 0.0,
            vertical_align: 0.0,
            child_vertical_align: HashMap::new(),
            contract_height: true,
        }
    }

    pub fn with_spacing(mut self, spacing: f32, line_spacing: f32) -> Self {
        self.spacing = spacing;
        self.line_spacing = line_spacing;
        self
    }

    pub fn with_alignment(mut self, alignment: f32) -> Self {
        self.alignment = alignment.clamp(0.0, 1.0);
        self
    }

    pub fn with_vertical_align(mut self, vertical_align: f32) -> Self {
        self.vertical_align = vertical_align.clamp(0.0, 1.0);
        self
    }

    pub fn keep_height(mut self) -> Self {
        self.contract_height = false;
        self
    }

    pub fn alignment(&self) -> f32 {
        self.alignment
    }

    pub fn set_alignment(&mut self, stage: &mut Stage, id: EntityId, alignment: f32) {
        let alignment = alignment.clamp(0.0, 1.0);
        if self.alignment == alignment {
            return;
        }
        self.alignment = alignment;
        self.reform_self(stage, id);
        stage.dirty(id, Dirty::CONTENT);
    }

    /// Override the line-relative vertical alignment of one child.
    pub fn set_child_vertical_align(
        &mut self,
        stage: &mut Stage,
        id: EntityId,
        child: EntityId,
        vertical_align: f32,
    ) {
        self.child_vertical_align
            .insert(child, vertical_align.clamp(0.0, 1.0));
        self.reform_self(stage, id);
        stage.dirty(id, Dirty::CONTENT);
    }

    fn vertical_align_for(&self, child: EntityId) -> f32 {
        self.child_vertical_align
            .get(&child)
            .copied()
            .unwrap_or(self.vertical_align)
    }
}

struct Line {
    children: Vec<(EntityId, f32, f32)>,
    width: f32,
    height: f32,
}

impl Entity for FlowLayout {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn form(&mut self, stage: &mut Stage, id: EntityId) {
        let children = layout_children(stage, id);
        let width = self.core.frame.width;

        let mut lines: Vec<Line> = Vec::new();
        let mut current = Line {
            children: Vec::new(),
            width: 0.0,
            height: 0.0,
        };
        for child in children {
            let Some(frame) = stage.try_core(child).map(|c| c.frame()) else {
                continue;
            };
            let advance = if current.children.is_empty() {
                frame.width
            } else {
                self.spacing + frame.width
            };
            // A line takes at least one child, however wide; otherwise
            // it breaks as soon as the next child would fill it.
            if !current.children.is_empty() && current.width + advance >= width {
                lines.push(current);
                current = Line {
                    children: Vec::new(),
                    width: 0.0,
                    height: 0.0,
                };
            }
            let advance = if current.children.is_empty() {
                frame.width
            } else {
                self.spacing + frame.width
            };
            current
                .children
                .push((child, frame.width, frame.height));
            current.width += advance;
            current.height = current.height.max(frame.height);
        }
        if !current.children.is_empty() {
            lines.push(current);
        }

        let mut line_y = 0.0;
        for line in &lines {
            let shift = (width - line.width).max(0.0) * self.alignment;
            let mut x = shift;
            for (child, child_width, child_height) in &line.children {
                let y = line_y + (line.height - child_height) * self.vertical_align_for(*child);
                stage.set_position(*child, x, y);
                x += child_width + self.spacing;
            }
            line_y += line.height + self.line_spacing;
        }

        if self.contract_height {
            let content_height = if lines.is_empty() {
                0.0
            } else {
                line_y - self.line_spacing
            };
            if self.core.frame.height != content_height {
                self.core.frame.height = content_height;
                self.core.invalidate_matrix();
                stage.dirty(id, Dirty::SIZE);
            }
        }
    }

    fn child_added(&mut self, stage: &mut Stage, id: EntityId, _child: EntityId) {
        self.reform_self(stage, id);
    }

    fn child_removed(&mut self, stage: &mut Stage, id: EntityId, child: EntityId) {
        self.child_vertical_align.remove(&child);
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

impl Container for FlowLayout {}
