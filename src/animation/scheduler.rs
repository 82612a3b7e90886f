//! Central tick loop for running animators.

use std::time::Duration;

use crate::animation::animator::Animator;
use crate::error::SceneError;
use crate::stage::Stage;

/// Identifies a scheduled animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimatorId(u64);

/// Owns running animators and advances them together.
///
/// The embedder calls [`tick`](Self::tick) once per frame with a
/// monotonic timestamp; finished animators drop out on their own.
#[derive(Default)]
pub struct Scheduler {
    next_id: u64,
    running: Vec<(AnimatorId, Animator)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an animator at `now` and take ownership of it.
    pub fn start(
        &mut self,
        stage: &mut Stage,
        now: Duration,
        mut animator: Animator,
    ) -> Result<AnimatorId, SceneError> {
        animator.start(now, stage)?;
        let id = AnimatorId(self.next_id);
        self.next_id += 1;
        self.running.push((id, animator));
        Ok(id)
    }

    /// Halt and discard an animator without a final update.
    pub fn stop(&mut self, id: AnimatorId) -> Result<(), SceneError> {
        let Some(at) = self.running.iter().position(|(a, _)| *a == id) else {
            return Err(SceneError::AnimatorNotRunning);
        };
        let (_, mut animator) = self.running.remove(at);
        animator.stop()
    }

    /// Jump an animator to its end value and discard it.
    pub fn finish(&mut self, stage: &mut Stage, id: AnimatorId) -> Result<(), SceneError> {
        let Some(at) = self.running.iter().position(|(a, _)| *a == id) else {
            return Err(SceneError::AnimatorNotRunning);
        };
        let (_, mut animator) = self.running.remove(at);
        animator.finish(stage)
    }

    pub fn is_running(&self, id: AnimatorId) -> bool {
        self.running.iter().any(|(a, _)| *a == id)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Advance every running animator to `now`.
    pub fn tick(&mut self, stage: &mut Stage, now: Duration) {
        self.running
            .retain_mut(|(_, animator)| animator.tick(now, stage));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::animator::Tween;
    use crate::test_util::Leaf;

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn test_finished_animators_drop_out() {
        let mut stage = Stage::new();
        let id = stage.register(Leaf::sized(5.0, 5.0));
        let mut scheduler = Scheduler::new();
        let anim = Animator::new(secs(1.0), Tween::alpha(id, 1.0, 0.0));
        let handle = scheduler.start(&mut stage, secs(0.0), anim).unwrap();
        scheduler.tick(&mut stage, secs(0.5));
        assert!(scheduler.is_running(handle));
        scheduler.tick(&mut stage, secs(2.0));
        assert!(!scheduler.is_running(handle));
        assert!(scheduler.is_empty());
        assert_eq!(stage.try_core(id).unwrap().alpha(), 0.0);
    }

    #[test]
    fn test_parallel_animators() {
        let mut stage = Stage::new();
        let a = stage.register(Leaf::sized(5.0, 5.0));
        let b = stage.register(Leaf::sized(5.0, 5.0));
        let mut scheduler = Scheduler::new();
        scheduler
            .start(
                &mut stage,
                secs(0.0),
                Animator::new(secs(1.0), Tween::alpha(a, 1.0, 0.0)),
            )
            .unwrap();
        scheduler
            .start(
                &mut stage,
                secs(0.0),
                Animator::new(secs(2.0), Tween::alpha(b, 1.0, 0.0)),
            )
            .unwrap();
        scheduler.tick(&mut stage, secs(1.0));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(stage.try_core(a).unwrap().alpha(), 0.0);
        assert_eq!(stage.try_core(b).unwrap().alpha(), 0.5);
    }

    #[test]
    fn test_stop_unknown_errors() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.stop(AnimatorId(7)).is_err());
    }

    #[test]
    fn test_finish_applies_end_value() {
        let mut stage = Stage::new();
        let id = stage.register(Leaf::sized(5.0, 5.0));
        let mut scheduler = Scheduler::new();
        let handle = scheduler
            .start(
                &mut stage,
                secs(0.0),
                Animator::new(secs(10.0), Tween::alpha(id, 1.0, 0.0)),
            )
            .unwrap();
        scheduler.finish(&mut stage, handle).unwrap();
        assert_eq!(stage.try_core(id).unwrap().alpha(), 0.0);
        assert!(scheduler.is_empty());
    }
}
