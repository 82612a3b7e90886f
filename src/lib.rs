//! Retained 2D scenegraph with incremental redraw.
//!
//! Entities live in a [`stage::Stage`], form a tree plus a dependency
//! graph, and report what changed through [`dirty::Dirty`] flags. A
//! [`scene::Scene`] at the root of a subtree repaints only the damaged
//! regions of its canvas each refresh. Layout containers, shared
//! brushes, pointer events, and time-driven animation build on the
//! same stage.
//!
//! The embedder supplies a [`canvas::Canvas`] implementation and calls
//! [`scene::refresh_scene`] once per frame; everything in between is
//! backend-agnostic.

pub mod animation;
pub mod brush;
pub mod canvas;
pub mod dirty;
pub mod entity;
pub mod error;
pub mod event;
pub mod geometry;
pub mod layout;
pub mod painted_shape;
pub mod responder;
pub mod scene;
pub mod shape;
pub mod stage;

#[cfg(test)]
mod test_util;

pub mod prelude {
    pub use crate::animation::{Animator, AnimatorId, Easing, Scheduler, Tween};
    pub use crate::brush::{Brush, Color, Gradient, Paint, Shadow, Stroke};
    pub use crate::canvas::{Canvas, CanvasOp, DisplayList, PixelCanvas, RecordingCanvas};
    pub use crate::dirty::Dirty;
    pub use crate::entity::{draw_entity, scope_of, Entity, EntityCore};
    pub use crate::error::SceneError;
    pub use crate::event::{Button, Event, EventKind, Key};
    pub use crate::geometry::{Matrix, Point, Rect, Size};
    pub use crate::layout::{
        Axis, BoxLayout, FlowLayout, Frame, FrameSizing, Grid, SizePolicy, StackLayout,
    };
    pub use crate::painted_shape::PaintedShape;
    pub use crate::responder::{Handler, HandlerId, Responder};
    pub use crate::scene::{refresh_scene, Scene};
    pub use crate::shape::Shape;
    pub use crate::stage::{BrushId, EntityId, Stage};
}
