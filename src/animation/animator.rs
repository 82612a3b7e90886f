//! Time-driven property animation.

use std::time::Duration;

use crate::animation::timing::Easing;
use crate::error::SceneError;
use crate::geometry::Point;
use crate::stage::{EntityId, Stage};

/// Applies the eased progress in `0..=1` to the stage.
pub type Update = Box<dyn FnMut(&mut Stage, f32)>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Running { started: Duration },
    Finished,
}

/// Drives an [`Update`] from 0 to 1 over a duration.
///
/// A looping animator restarts each cycle; an oscillating one folds the
/// eased position so it plays out and back within each cycle. A plain
/// animator delivers progress 1 exactly once and then finishes.
pub struct Animator {
    duration: Duration,
    easing: Easing,
    looped: bool,
    oscillate: bool,
    update: Update,
    state: State,
}

impl Animator {
    pub fn new(duration: Duration, update: Update) -> Self {
        Self {
            duration,
            easing: Easing::default(),
            looped: false,
            oscillate: false,
            update,
            state: State::Idle,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn looping(mut self) -> Self {
        self.looped = true;
        self
    }

    pub fn oscillating(mut self) -> Self {
        self.oscillate = true;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Begin at `now` and deliver progress 0 immediately.
    pub fn start(&mut self, now: Duration, stage: &mut Stage) -> Result<(), SceneError> {
        if self.is_running() {
            return Err(SceneError::AnimatorRunning);
        }
        self.state = State::Running { started: now };
        let value = self.easing.evaluate(0.0);
        (self.update)(stage, value);
        Ok(())
    }

    /// Halt without delivering a final value.
    pub fn stop(&mut self) -> Result<(), SceneError> {
        if !self.is_running() {
            return Err(SceneError::AnimatorNotRunning);
        }
        self.state = State::Idle;
        Ok(())
    }

    /// Jump to the end: deliver progress 1 and finish.
    pub fn finish(&mut self, stage: &mut Stage) -> Result<(), SceneError> {
        if !self.is_running() {
            return Err(SceneError::AnimatorNotRunning);
        }
        self.complete(stage);
        Ok(())
    }

    fn complete(&mut self, stage: &mut Stage) {
        let value = self.easing.evaluate(1.0);
        (self.update)(stage, value);
        self.state = State::Finished;
    }

    /// Advance to `now`. Returns whether the animator is still running;
    /// ticking a finished or idle animator is a no-op.
    ///
    /// Once `now` reaches the duration a looping animator rebases its
    /// start time; anything else finishes with a forced final update.
    pub fn tick(&mut self, now: Duration, stage: &mut Stage) -> bool {
        let State::Running { mut started } = self.state else {
            return false;
        };
        let seconds = self.duration.as_secs_f32();
        if seconds <= 0.0 {
            self.complete(stage);
            return false;
        }
        // Clocks never run the animation backwards.
        let mut elapsed = now.saturating_sub(started).as_secs_f32();
        if elapsed >= seconds {
            if !self.looped {
                self.complete(stage);
                return false;
            }
            // Rebase the start time so each lap measures from zero.
            let laps = (elapsed / seconds).floor();
            started += Duration::from_secs_f32(seconds * laps);
            self.state = State::Running { started };
            elapsed = now.saturating_sub(started).as_secs_f32();
        }
        let mut pos = self.easing.evaluate(elapsed / seconds);
        if pos < 0.0 {
            pos = 0.0;
        }
        if self.oscillate {
            // Fold the eased position: out over the first half, back
            // over the second.
            pos = if pos <= 0.5 {
                pos * 2.0
            } else {
                1.0 - (pos - 0.5) * 2.0
            };
        }
        (self.update)(stage, pos);
        true
    }
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("looped", &self.looped)
            .field("oscillate", &self.oscillate)
            .field("state", &self.state)
            .finish()
    }
}

/// Ready-made update closures for common entity properties.
pub struct Tween;

impl Tween {
    /// Interpolate a scalar and hand it to `apply`.
    pub fn value(from: f32, to: f32, mut apply: impl FnMut(&mut Stage, f32) + 'static) -> Update {
        Box::new(move |stage, t| apply(stage, from + (to - from) * t))
    }

    pub fn position(id: EntityId, from: Point, to: Point) -> Update {
        Box::new(move |stage, t| {
            stage.set_position(id, from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
        })
    }

    pub fn size(id: EntityId, from: (f32, f32), to: (f32, f32)) -> Update {
        Box::new(move |stage, t| {
            stage.set_size(
                id,
                from.0 + (to.0 - from.0) * t,
                from.1 + (to.1 - from.1) * t,
            );
        })
    }

    pub fn alpha(id: EntityId, from: f32, to: f32) -> Update {
        Box::new(move |stage, t| stage.set_alpha(id, from + (to - from) * t))
    }

    pub fn rotation(id: EntityId, from: f32, to: f32) -> Update {
        Box::new(move |stage, t| stage.set_rotation(id, from + (to - from) * t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    fn recording_animator(log: &Rc<RefCell<Vec<f32>>>, duration: Duration) -> Animator {
        let log = log.clone();
        Animator::new(
            duration,
            Box::new(move |_, t| log.borrow_mut().push(t)),
        )
    }

    #[test]
    fn test_start_delivers_zero() {
        let mut stage = Stage::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut anim = recording_animator(&log, secs(1.0));
        anim.start(secs(10.0), &mut stage).unwrap();
        assert_eq!(*log.borrow(), vec![0.0]);
        assert!(anim.start(secs(10.0), &mut stage).is_err());
    }

    #[test]
    fn test_final_update_exactly_once() {
        let mut stage = Stage::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut anim = recording_animator(&log, secs(1.0));
        anim.start(secs(0.0), &mut stage).unwrap();
        assert!(anim.tick(secs(0.5), &mut stage));
        assert!(!anim.tick(secs(1.5), &mut stage));
        assert!(!anim.tick(secs(2.0), &mut stage));
        assert_eq!(*log.borrow(), vec![0.0, 0.5, 1.0]);
        assert!(anim.is_finished());
    }

    #[test]
    fn test_looped_wraps_progress() {
        let mut stage = Stage::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut anim = recording_animator(&log, secs(1.0)).looping();
        anim.start(secs(0.0), &mut stage).unwrap();
        assert!(anim.tick(secs(1.25), &mut stage));
        assert!((log.borrow().last().unwrap() - 0.25).abs() < 1e-4);
        // Still running after many laps.
        assert!(anim.tick(secs(7.5), &mut stage));
        assert!((log.borrow().last().unwrap() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_oscillate_folds_within_one_cycle() {
        let mut stage = Stage::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut anim = recording_animator(&log, secs(1.0)).oscillating().looping();
        anim.start(secs(0.0), &mut stage).unwrap();
        anim.tick(secs(0.25), &mut stage);
        anim.tick(secs(0.5), &mut stage);
        anim.tick(secs(0.75), &mut stage);
        // The next cycle folds the same way after the rebase.
        anim.tick(secs(1.25), &mut stage);
        assert_eq!(*log.borrow(), vec![0.0, 0.5, 1.0, 0.5, 0.5]);
    }

    #[test]
    fn test_oscillate_finishes_at_duration() {
        let mut stage = Stage::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut anim = recording_animator(&log, secs(1.0)).oscillating();
        anim.start(secs(0.0), &mut stage).unwrap();
        assert!(anim.tick(secs(0.75), &mut stage));
        // Reaching the duration forces the final update.
        assert!(!anim.tick(secs(1.0), &mut stage));
        assert_eq!(*log.borrow(), vec![0.0, 0.5, 1.0]);
        assert!(anim.is_finished());
    }

    #[test]
    fn test_stop_without_final_value() {
        let mut stage = Stage::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut anim = recording_animator(&log, secs(1.0));
        assert!(anim.stop().is_err());
        anim.start(secs(0.0), &mut stage).unwrap();
        anim.stop().unwrap();
        assert!(!anim.tick(secs(0.5), &mut stage));
        assert_eq!(*log.borrow(), vec![0.0]);
    }

    #[test]
    fn test_finish_jumps_to_end() {
        let mut stage = Stage::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut anim = recording_animator(&log, secs(1.0));
        anim.start(secs(0.0), &mut stage).unwrap();
        anim.finish(&mut stage).unwrap();
        assert_eq!(*log.borrow(), vec![0.0, 1.0]);
        assert!(anim.finish(&mut stage).is_err());
    }

    #[test]
    fn test_tween_position() {
        let mut stage = Stage::new();
        let id = stage.register(crate::test_util::Leaf::sized(5.0, 5.0));
        let mut anim = Animator::new(
            secs(1.0),
            Tween::position(id, Point::new(0.0, 0.0), Point::new(10.0, 20.0)),
        );
        anim.start(secs(0.0), &mut stage).unwrap();
        anim.tick(secs(0.5), &mut stage);
        let frame = stage.try_core(id).unwrap().frame();
        assert_eq!((frame.x, frame.y), (5.0, 10.0));
    }
}
