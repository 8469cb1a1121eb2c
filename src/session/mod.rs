//! Session controller: one gate + rep machine per registered exercise.

pub mod shared;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::config::ExerciseConfig;
use crate::error::SessionError;
use crate::pose::PoseResult;
use crate::tracker::{ExerciseKind, FrameGate, RepCounterState, RepMachine, RepUpdate};

pub use shared::SharedSession;

/// Returned by [`SessionController::register_exercise`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExerciseHandle {
    kind: ExerciseKind,
}

impl ExerciseHandle {
    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FeedOutcome {
    /// Arrived before the minimum frame interval elapsed
    Dropped,
    Evaluated(RepUpdate),
}

impl FeedOutcome {
    pub fn update(&self) -> Option<&RepUpdate> {
        match self {
            Self::Dropped => None,
            Self::Evaluated(update) => Some(update),
        }
    }
}

/// Gate and machine of one exercise. Nothing is shared between slots.
pub(crate) struct ExerciseSlot {
    gate: FrameGate,
    machine: RepMachine,
}

impl ExerciseSlot {
    fn new(kind: ExerciseKind, config: ExerciseConfig) -> Result<Self, SessionError> {
        let gate = FrameGate::new(config.min_frame_interval());
        let machine = RepMachine::new(kind, config)?;
        Ok(Self { gate, machine })
    }

    pub(crate) fn feed(&mut self, input: &PoseResult) -> FeedOutcome {
        if !self.gate.accept(input.timestamp()) {
            return FeedOutcome::Dropped;
        }
        FeedOutcome::Evaluated(self.machine.update(input))
    }

    pub(crate) fn state(&self) -> &RepCounterState {
        self.machine.state()
    }

    pub(crate) fn reset(&mut self) {
        self.gate.reset();
        self.machine.reset();
    }
}

#[derive(Default)]
pub struct SessionController {
    exercises: BTreeMap<ExerciseKind, ExerciseSlot>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `config` and starts tracking `kind`.
    pub fn register_exercise(
        &mut self,
        kind: ExerciseKind,
        config: ExerciseConfig,
    ) -> Result<ExerciseHandle, SessionError> {
        if self.exercises.contains_key(&kind) {
            return Err(SessionError::AlreadyRegistered(kind));
        }
        let slot = ExerciseSlot::new(kind, config)?;
        info!(
            exercise = %kind,
            interval_ms = slot.gate.min_interval().as_millis() as u64,
            "exercise registered"
        );
        self.exercises.insert(kind, slot);
        Ok(ExerciseHandle { kind })
    }

    pub fn unregister(&mut self, kind: ExerciseKind) -> Result<RepCounterState, SessionError> {
        let slot = self
            .exercises
            .remove(&kind)
            .ok_or(SessionError::NotRegistered(kind))?;
        info!(exercise = %kind, count = slot.state().count, "exercise unregistered");
        Ok(slot.state().clone())
    }

    pub fn is_registered(&self, kind: ExerciseKind) -> bool {
        self.exercises.contains_key(&kind)
    }

    pub fn active_kinds(&self) -> impl Iterator<Item = ExerciseKind> + '_ {
        self.exercises.keys().copied()
    }

    /// Routes one pose result through the exercise's gate and machine.
    ///
    /// Per-frame problems never surface here; the only error is an
    /// unregistered `kind`.
    pub fn feed(&mut self, kind: ExerciseKind, input: &PoseResult) -> Result<FeedOutcome, SessionError> {
        let slot = self
            .exercises
            .get_mut(&kind)
            .ok_or(SessionError::NotRegistered(kind))?;
        Ok(slot.feed(input))
    }

    /// Feeds the same pose result to every registered exercise.
    pub fn feed_all(&mut self, input: &PoseResult) -> Vec<(ExerciseKind, FeedOutcome)> {
        self.exercises
            .iter_mut()
            .map(|(kind, slot)| (*kind, slot.feed(input)))
            .collect()
    }

    pub fn state(&self, kind: ExerciseKind) -> Result<&RepCounterState, SessionError> {
        self.exercises
            .get(&kind)
            .map(ExerciseSlot::state)
            .ok_or(SessionError::NotRegistered(kind))
    }

    /// Clears count, phase and form for `kind` only.
    pub fn reset(&mut self, kind: ExerciseKind) -> Result<(), SessionError> {
        let slot = self
            .exercises
            .get_mut(&kind)
            .ok_or(SessionError::NotRegistered(kind))?;
        slot.reset();
        info!(exercise = %kind, "exercise reset");
        Ok(())
    }

    /// Hands the registered exercises to a controller that can be fed from
    /// several threads.
    pub fn into_shared(self) -> SharedSession {
        SharedSession::new(self.exercises)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::pose::{BodyPart, Frame, Landmark};
    use crate::tracker::RepPhase;
    use std::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Right leg with the given knee angle, thigh horizontal from the knee
    fn squat_frame(t: u64, knee_deg: f32) -> PoseResult {
        let (kx, ky) = (0.5f32, 0.5f32);
        let rad = knee_deg.to_radians();
        Frame::new(ms(t))
            .with(BodyPart::RightHip, Landmark::new(kx + 0.2, ky))
            .with(BodyPart::RightKnee, Landmark::new(kx, ky))
            .with(BodyPart::RightAnkle, Landmark::new(kx + 0.2 * rad.cos(), ky + 0.2 * rad.sin()))
            .into()
    }

    fn controller_with(kind: ExerciseKind) -> SessionController {
        let mut session = SessionController::new();
        session
            .register_exercise(kind, ExerciseConfig::preset(kind))
            .unwrap();
        session
    }

    #[test]
    fn test_register_returns_handle() {
        let mut session = SessionController::new();
        let handle = session
            .register_exercise(ExerciseKind::Squat, ExerciseConfig::squat())
            .unwrap();
        assert_eq!(handle.kind(), ExerciseKind::Squat);
        assert!(session.is_registered(ExerciseKind::Squat));
        assert!(!session.is_registered(ExerciseKind::PushUp));
    }

    #[test]
    fn test_register_rejects_invalid_config() {
        let mut session = SessionController::new();
        let mut config = ExerciseConfig::squat();
        config.down_threshold = 170.0;
        let err = session
            .register_exercise(ExerciseKind::Squat, config)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Config(ConfigError::InvalidThresholds { .. })
        ));
        assert!(!session.is_registered(ExerciseKind::Squat));
    }

    #[test]
    fn test_register_twice_rejected() {
        let mut session = controller_with(ExerciseKind::Squat);
        assert!(matches!(
            session.register_exercise(ExerciseKind::Squat, ExerciseConfig::squat()),
            Err(SessionError::AlreadyRegistered(ExerciseKind::Squat))
        ));
    }

    #[test]
    fn test_unregistered_kind() {
        let mut session = controller_with(ExerciseKind::Squat);
        let input = squat_frame(0, 170.0);
        assert!(matches!(
            session.feed(ExerciseKind::Crunch, &input),
            Err(SessionError::NotRegistered(ExerciseKind::Crunch))
        ));
        assert!(session.state(ExerciseKind::Crunch).is_err());
        assert!(session.reset(ExerciseKind::Crunch).is_err());
    }

    #[test]
    fn test_squat_through_gate() {
        let mut session = controller_with(ExerciseKind::Squat);
        let frames = [
            (0, 170.0),
            (33, 80.0), // dropped
            (200, 80.0),
            (400, 85.0),
            (500, 165.0), // dropped
            (600, 165.0),
        ];
        let outcomes: Vec<_> = frames
            .iter()
            .map(|&(t, a)| session.feed(ExerciseKind::Squat, &squat_frame(t, a)).unwrap())
            .collect();
        assert_eq!(outcomes[1], FeedOutcome::Dropped);
        assert_eq!(outcomes[4], FeedOutcome::Dropped);
        assert_eq!(outcomes[5].update().unwrap().count_delta, 1.0);

        let state = session.state(ExerciseKind::Squat).unwrap();
        assert_eq!(state.count, 1.0);
        assert_eq!(state.phase, RepPhase::Up);
    }

    #[test]
    fn test_exercises_isolated() {
        let mut session = controller_with(ExerciseKind::Squat);
        session
            .register_exercise(ExerciseKind::PushUp, ExerciseConfig::push_up())
            .unwrap();

        for (t, a) in [(0, 170.0), (200, 80.0), (400, 170.0)] {
            let outcomes = session.feed_all(&squat_frame(t, a));
            assert_eq!(outcomes.len(), 2);
        }
        assert_eq!(session.state(ExerciseKind::Squat).unwrap().count, 1.0);
        // The squat frames carry no arm landmarks
        let push_up = session.state(ExerciseKind::PushUp).unwrap();
        assert_eq!(push_up.count, 0.0);
        assert!(!push_up.form_ok);
        assert_eq!(push_up.feedback, "Fix Form");
    }

    #[test]
    fn test_reset_only_touches_one_kind() {
        let mut session = controller_with(ExerciseKind::Squat);
        session
            .register_exercise(ExerciseKind::Crunch, ExerciseConfig::crunch())
            .unwrap();
        for (t, a) in [(0, 170.0), (200, 80.0), (400, 170.0)] {
            session.feed(ExerciseKind::Squat, &squat_frame(t, a)).unwrap();
        }
        session.feed(ExerciseKind::Crunch, &squat_frame(0, 170.0)).unwrap();

        session.reset(ExerciseKind::Squat).unwrap();
        let squat = session.state(ExerciseKind::Squat).unwrap();
        assert_eq!(squat.count, 0.0);
        assert!(!squat.ready);
        // Gate was cleared too: an earlier timestamp is accepted
        assert!(matches!(
            session.feed(ExerciseKind::Squat, &squat_frame(0, 170.0)).unwrap(),
            FeedOutcome::Evaluated(_)
        ));
        assert_eq!(session.active_kinds().collect::<Vec<_>>(), vec![ExerciseKind::Squat, ExerciseKind::Crunch]);
    }

    #[test]
    fn test_no_detection_keeps_count() {
        let mut session = controller_with(ExerciseKind::Squat);
        for (t, a) in [(0, 170.0), (200, 80.0), (400, 170.0), (600, 80.0)] {
            session.feed(ExerciseKind::Squat, &squat_frame(t, a)).unwrap();
        }
        let before = session.state(ExerciseKind::Squat).unwrap().clone();
        let outcome = session
            .feed(ExerciseKind::Squat, &PoseResult::NoDetection { timestamp: ms(800) })
            .unwrap();
        let update = outcome.update().unwrap();
        assert_eq!(update.count, before.count);
        assert_eq!(update.phase, before.phase);
        assert_eq!(update.feedback, "Fix Form");
    }

    #[test]
    fn test_unregister() {
        let mut session = controller_with(ExerciseKind::Squat);
        for (t, a) in [(0, 170.0), (200, 80.0), (400, 170.0)] {
            session.feed(ExerciseKind::Squat, &squat_frame(t, a)).unwrap();
        }
        let final_state = session.unregister(ExerciseKind::Squat).unwrap();
        assert_eq!(final_state.count, 1.0);
        assert!(!session.is_registered(ExerciseKind::Squat));
        assert!(session.unregister(ExerciseKind::Squat).is_err());
    }
}
