//! Layout containers.
//!
//! Containers are entities whose `form` pass positions their children.
//! Mutations go through the stage; the helpers here pair a hierarchy
//! change with the container's reflow.

use serde::{Deserialize, Serialize};

use crate::dirty::Dirty;
use crate::entity::Entity;
use crate::error::SceneError;
use crate::stage::{EntityId, Stage};

pub mod flow;
pub mod frame;
pub mod grid;
pub mod linear;
pub mod stack;

pub use flow::FlowLayout;
pub use frame::{Frame, FrameSizing};
pub use grid::Grid;
pub use linear::BoxLayout;
pub use stack::StackLayout;

/// The main axis of a linear container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// How a weighted container sizes an entity along one axis.
///
/// `size` is the base extent before distribution; `weight` is the
/// entity's share of leftover space; `expand` opts out of distribution
/// entirely when false.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizePolicy {
    pub size: f32,
    pub weight: f32,
    pub expand: bool,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            size: 0.0,
            weight: 1.0,
            expand: true,
        }
    }
}

impl SizePolicy {
    pub fn fixed(size: f32) -> Self {
        Self {
            size,
            weight: 0.0,
            expand: false,
        }
    }

    pub fn weighted(weight: f32) -> Self {
        Self {
            size: 0.0,
            weight,
            expand: true,
        }
    }
}

/// Shared container behavior over [`Entity`].
pub trait Container: Entity {
    /// Reflow now unless a reflow is already in progress on this
    /// container.
    fn reform_self(&mut self, stage: &mut Stage, id: EntityId) {
        if stage.is_forming(id) {
            return;
        }
        stage.begin_forming(id);
        self.form(stage, id);
        stage.end_forming(id);
    }

    /// Standard container reaction to a dirty child: reflow when the
    /// child's frame changed, then surface a content change.
    fn on_child_dirtied(&mut self, stage: &mut Stage, id: EntityId, flags: Dirty) {
        if flags.intersects(Dirty::FRAME) {
            self.reform_self(stage, id);
        }
        stage.dirty(id, Dirty::CONTENT);
    }
}

/// The children a layout pass actually places.
pub(crate) fn layout_children(stage: &Stage, id: EntityId) -> Vec<EntityId> {
    stage
        .children(id)
        .into_iter()
        .filter(|c| stage.try_core(*c).is_some_and(|core| core.included()))
        .collect()
}

/// Attach a child to a container and reflow it.
pub fn add_to(stage: &mut Stage, container: EntityId, child: EntityId) -> Result<(), SceneError> {
    stage.set_parent(child, container)?;
    stage.reform(container);
    Ok(())
}

/// Detach a child from a container and reflow it.
pub fn remove_from(
    stage: &mut Stage,
    container: EntityId,
    child: EntityId,
) -> Result<(), SceneError> {
    if stage.parent(child) != Some(container) {
        return Err(SceneError::NotParented);
    }
    stage.remove_parent(child)?;
    stage.reform(container);
    Ok(())
}
