//! Session that can be fed from several threads.
//!
//! Each exercise sits behind its own lock, so a frame for one exercise never
//! waits on another. The set of exercises is fixed once shared.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::info;

use super::{ExerciseSlot, FeedOutcome};
use crate::error::SessionError;
use crate::pose::PoseResult;
use crate::tracker::{ExerciseKind, RepCounterState};

pub struct SharedSession {
    slots: BTreeMap<ExerciseKind, Mutex<ExerciseSlot>>,
}

impl SharedSession {
    pub(super) fn new(exercises: BTreeMap<ExerciseKind, ExerciseSlot>) -> Self {
        let slots = exercises
            .into_iter()
            .map(|(kind, slot)| (kind, Mutex::new(slot)))
            .collect();
        Self { slots }
    }

    fn slot(&self, kind: ExerciseKind) -> Result<&Mutex<ExerciseSlot>, SessionError> {
        self.slots.get(&kind).ok_or(SessionError::NotRegistered(kind))
    }

    pub fn active_kinds(&self) -> impl Iterator<Item = ExerciseKind> + '_ {
        self.slots.keys().copied()
    }

    pub fn feed(&self, kind: ExerciseKind, input: &PoseResult) -> Result<FeedOutcome, SessionError> {
        Ok(self.slot(kind)?.lock().feed(input))
    }

    /// Snapshot of the current state
    pub fn state(&self, kind: ExerciseKind) -> Result<RepCounterState, SessionError> {
        Ok(self.slot(kind)?.lock().state().clone())
    }

    pub fn reset(&self, kind: ExerciseKind) -> Result<(), SessionError> {
        self.slot(kind)?.lock().reset();
        info!(exercise = %kind, "exercise reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExerciseConfig;
    use crate::pose::{BodyPart, Frame, Landmark};
    use crate::session::SessionController;
    use std::time::Duration;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_shared_session_is_send_sync() {
        assert_send_sync::<SharedSession>();
    }

    /// Frame carrying both a right knee angle and a left hip (crunch) angle
    fn frame(t: u64, knee_deg: f32, hip_deg: f32) -> PoseResult {
        let at = |cx: f32, cy: f32, deg: f32| {
            let rad = deg.to_radians();
            Landmark::new(cx + 0.1 * rad.cos(), cy + 0.1 * rad.sin())
        };
        Frame::new(Duration::from_millis(t))
            .with(BodyPart::RightHip, Landmark::new(0.3, 0.3))
            .with(BodyPart::RightKnee, Landmark::new(0.2, 0.3))
            .with(BodyPart::RightAnkle, at(0.2, 0.3, knee_deg))
            .with(BodyPart::LeftHip, Landmark::new(0.6, 0.7))
            .with(BodyPart::LeftKnee, Landmark::new(0.7, 0.7))
            .with(BodyPart::LeftShoulder, at(0.6, 0.7, hip_deg))
            // knee bent at 90°
            .with(BodyPart::LeftAnkle, Landmark::new(0.7, 0.8))
            .into()
    }

    #[test]
    fn test_threads_feed_separate_exercises() {
        let mut session = SessionController::new();
        session
            .register_exercise(ExerciseKind::Squat, ExerciseConfig::squat())
            .unwrap();
        session
            .register_exercise(ExerciseKind::Crunch, ExerciseConfig::crunch())
            .unwrap();
        let shared = session.into_shared();

        std::thread::scope(|s| {
            s.spawn(|| {
                for rep in 0..5u64 {
                    let base = rep * 400;
                    shared.feed(ExerciseKind::Squat, &frame(base, 170.0, 120.0)).unwrap();
                    shared.feed(ExerciseKind::Squat, &frame(base + 200, 80.0, 120.0)).unwrap();
                }
                shared.feed(ExerciseKind::Squat, &frame(2000, 170.0, 120.0)).unwrap();
            });
            s.spawn(|| {
                for rep in 0..3u64 {
                    let base = rep * 400;
                    shared.feed(ExerciseKind::Crunch, &frame(base, 170.0, 120.0)).unwrap();
                    shared.feed(ExerciseKind::Crunch, &frame(base + 200, 170.0, 60.0)).unwrap();
                }
                shared.feed(ExerciseKind::Crunch, &frame(1200, 170.0, 120.0)).unwrap();
            });
        });

        assert_eq!(shared.state(ExerciseKind::Squat).unwrap().count, 5.0);
        assert_eq!(shared.state(ExerciseKind::Crunch).unwrap().count, 3.0);

        shared.reset(ExerciseKind::Crunch).unwrap();
        assert_eq!(shared.state(ExerciseKind::Crunch).unwrap().count, 0.0);
        assert_eq!(shared.state(ExerciseKind::Squat).unwrap().count, 5.0);
        assert!(shared.feed(ExerciseKind::PushUp, &frame(0, 0.0, 0.0)).is_err());
    }
}
