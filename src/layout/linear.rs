//! Weighted single-axis container.

use std::any::Any;

use crate::dirty::Dirty;
use crate::entity::{Entity, EntityCore};
use crate::geometry::Rect;
use crate::layout::{layout_children, Axis, Container};
use crate::stage::{EntityId, Stage};

/// Lays children out along one axis in two passes: base sizes first,
/// then leftover space split among expanding children by weight.
///
/// Children fill the cross axis when their cross policy expands. When
/// the base sizes overflow the container, the container grows along the
/// main axis to fit them.
pub struct BoxLayout {
    core: EntityCore,
    axis: Axis,
    spacing: f32,
}

impl BoxLayout {
    pub fn new(axis: Axis) -> Self {
        Self {
            core: EntityCore::new(),
            axis,
            spacing: 0.0,
        }
    }

    /// A left-to-right row.
    pub fn horizontal() -> Self {
        Self::new(Axis::Horizontal)
    }

    /// A top-to-bottom column.
    pub fn vertical() -> Self {
        Self::new(Axis::Vertical)
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.core = self.core.sized(width, height);
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn set_spacing(&mut self, stage: &mut Stage, id: EntityId, spacing: f32) {
        if self.spacing == spacing {
            return;
        }
        self.spacing = spacing;
        self.reform_self(stage, id);
        stage.dirty(id, Dirty::CONTENT);
    }
}

struct ChildPlan {
    id: EntityId,
    base: f32,
    weight: f32,
    expand: bool,
    cross: f32,
    cross_expand: bool,
}

impl Entity for BoxLayout {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn form(&mut self, stage: &mut Stage, id: EntityId) {
        let children = layout_children(stage, id);
        if children.is_empty() {
            return;
        }
        let horizontal = self.axis == Axis::Horizontal;
        let inner = self.core.local_rect();
        let main_size = if horizontal { inner.width } else { inner.height };
        let cross_size = if horizontal { inner.height } else { inner.width };

        let mut plans = Vec::with_capacity(children.len());
        let mut base_total = 0.0;
        let mut total_weight = 0.0;
        for child in children {
            let Some(core) = stage.try_core(child) else { continue };
            let (policy, min_main) = if horizontal {
                (core.width_policy, core.min_width)
            } else {
                (core.height_policy, core.min_height)
            };
            let (cross_policy, cross_current) = if horizontal {
                (core.height_policy, core.frame().height)
            } else {
                (core.width_policy, core.frame().width)
            };
            let base = policy.size.max(min_main);
            base_total += base;
            if policy.expand {
                total_weight += policy.weight;
            }
            plans.push(ChildPlan {
                id: child,
                base,
                weight: policy.weight,
                expand: policy.expand,
                cross: cross_current,
                cross_expand: cross_policy.expand,
            });
        }

        let spacing_total = self.spacing * (plans.len().saturating_sub(1)) as f32;
        let required = base_total + spacing_total;
        if required > main_size {
            // Grow along the main axis to hold the base sizes.
            if horizontal {
                self.core.frame.width = required;
            } else {
                self.core.frame.height = required;
            }
            self.core.invalidate_matrix();
            stage.dirty(id, Dirty::SIZE);
        }
        let main_size = main_size.max(required);
        let extra = main_size - required;

        let mut cursor = 0.0;
        for plan in &plans {
            let mut size = plan.base;
            if plan.expand && total_weight > 0.0 {
                size += extra * plan.weight / total_weight;
            }
            let cross = if plan.cross_expand { cross_size } else { plan.cross };
            let frame = if horizontal {
                Rect::new(cursor, 0.0, size, cross)
            } else {
                Rect::new(0.0, cursor, cross, size)
            };
            stage.set_frame(plan.id, frame);
            cursor += size + self.spacing;
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

impl Container for BoxLayout {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{add_to, SizePolicy};
    use crate::test_util::Leaf;

    fn frame_of(stage: &Stage, id: EntityId) -> Rect {
        stage.try_core(id).unwrap().frame()
    }

    #[test]
    fn test_equal_weights_split_evenly() {
        let mut stage = Stage::new();
        let row = stage.register(BoxLayout::horizontal().sized(90.0, 30.0));
        let a = stage.register(Leaf::new());
        let b = stage.register(Leaf::new());
        let c = stage.register(Leaf::new());
        for child in [a, b, c] {
            add_to(&mut stage, row, child).unwrap();
        }
        assert_eq!(frame_of(&stage, a), Rect::new(0.0, 0.0, 30.0, 30.0));
        assert_eq!(frame_of(&stage, b), Rect::new(30.0, 0.0, 30.0, 30.0));
        assert_eq!(frame_of(&stage, c), Rect::new(60.0, 0.0, 30.0, 30.0));
    }

    #[test]
    fn test_weight_proportions() {
        let mut stage = Stage::new();
        let row = stage.register(BoxLayout::horizontal().sized(100.0, 10.0));
        let light = stage.register(Leaf::with_policy(
            SizePolicy::weighted(1.0),
            SizePolicy::default(),
        ));
        let heavy = stage.register(Leaf::with_policy(
            SizePolicy::weighted(3.0),
            SizePolicy::default(),
        ));
        add_to(&mut stage, row, light).unwrap();
        add_to(&mut stage, row, heavy).unwrap();
        assert_eq!(frame_of(&stage, light).width, 25.0);
        assert_eq!(frame_of(&stage, heavy).width, 75.0);
    }

    #[test]
    fn test_fixed_children_keep_size() {
        let mut stage = Stage::new();
        let row = stage.register(BoxLayout::horizontal().sized(100.0, 10.0));
        let fixed = stage.register(Leaf::with_policy(
            SizePolicy::fixed(20.0),
            SizePolicy::default(),
        ));
        let flex = stage.register(Leaf::new());
        add_to(&mut stage, row, fixed).unwrap();
        add_to(&mut stage, row, flex).unwrap();
        assert_eq!(frame_of(&stage, fixed).width, 20.0);
        assert_eq!(frame_of(&stage, flex).width, 80.0);
    }

    #[test]
    fn test_zero_total_weight_skips_expansion() {
        let mut stage = Stage::new();
        let row = stage.register(BoxLayout::horizontal().sized(100.0, 10.0));
        let a = stage.register(Leaf::with_policy(
            SizePolicy::fixed(20.0),
            SizePolicy::default(),
        ));
        let b = stage.register(Leaf::with_policy(
            SizePolicy::fixed(30.0),
            SizePolicy::default(),
        ));
        add_to(&mut stage, row, a).unwrap();
        add_to(&mut stage, row, b).unwrap();
        assert_eq!(frame_of(&stage, a).width, 20.0);
        assert_eq!(frame_of(&stage, b).x, 20.0);
        assert_eq!(frame_of(&stage, b).width, 30.0);
    }

    #[test]
    fn test_spacing_counts_against_extra() {
        let mut stage = Stage::new();
        let row = stage.register(
            BoxLayout::horizontal()
                .with_spacing(10.0)
                .sized(100.0, 10.0),
        );
        let a = stage.register(Leaf::new());
        let b = stage.register(Leaf::new());
        add_to(&mut stage, row, a).unwrap();
        add_to(&mut stage, row, b).unwrap();
        assert_eq!(frame_of(&stage, a).width, 45.0);
        assert_eq!(frame_of(&stage, b).x, 55.0);
        assert_eq!(frame_of(&stage, b).width, 45.0);
    }

    #[test]
    fn test_vertical_axis() {
        let mut stage = Stage::new();
        let column = stage.register(BoxLayout::vertical().sized(20.0, 60.0));
        let a = stage.register(Leaf::new());
        let b = stage.register(Leaf::new());
        add_to(&mut stage, column, a).unwrap();
        add_to(&mut stage, column, b).unwrap();
        assert_eq!(frame_of(&stage, a), Rect::new(0.0, 0.0, 20.0, 30.0));
        assert_eq!(frame_of(&stage, b), Rect::new(0.0, 30.0, 20.0, 30.0));
    }

    #[test]
    fn test_overflow_grows_container() {
        let mut stage = Stage::new();
        let row = stage.register(BoxLayout::horizontal().sized(30.0, 10.0));
        let a = stage.register(Leaf::with_policy(
            SizePolicy::fixed(25.0),
            SizePolicy::default(),
        ));
        let b = stage.register(Leaf::with_policy(
            SizePolicy::fixed(25.0),
            SizePolicy::default(),
        ));
        add_to(&mut stage, row, a).unwrap();
        add_to(&mut stage, row, b).unwrap();
        assert_eq!(frame_of(&stage, row).width, 50.0);
    }

    #[test]
    fn test_excluded_child_skipped() {
        let mut stage = Stage::new();
        let row = stage.register(BoxLayout::horizontal().sized(90.0, 10.0));
        let a = stage.register(Leaf::new());
        let b = stage.register(Leaf::new());
        let c = stage.register(Leaf::new());
        for child in [a, b, c] {
            add_to(&mut stage, row, child).unwrap();
        }
        stage.set_included(b, false);
        assert_eq!(frame_of(&stage, a).width, 45.0);
        assert_eq!(frame_of(&stage, c).x, 45.0);
    }

    #[test]
    fn test_resize_reflows() {
        let mut stage = Stage::new();
        let row = stage.register(BoxLayout::horizontal().sized(40.0, 10.0));
        let a = stage.register(Leaf::new());
        let b = stage.register(Leaf::new());
        add_to(&mut stage, row, a).unwrap();
        add_to(&mut stage, row, b).unwrap();
        stage.set_size(row, 80.0, 10.0);
        assert_eq!(frame_of(&stage, a).width, 40.0);
        assert_eq!(frame_of(&stage, b).x, 40.0);
    }
}
