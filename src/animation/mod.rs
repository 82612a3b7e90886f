//! Time-based animation: easing curves, animators, and the scheduler
//! that drives them each frame.

pub mod animator;
pub mod scheduler;
pub mod timing;

pub use animator::{Animator, Tween, Update};
pub use scheduler::{AnimatorId, Scheduler};
pub use timing::Easing;
