//! Repetition state machine.
//!
//! Turns per-frame joint angles into phase transitions and rep counts. The
//! primary angle is compared against two thresholds with a hysteresis band
//! between them; a transition is decided against the stored phase, so any
//! single frame moves the phase at most once.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{CheckScope, CountOn, ExerciseConfig};
use crate::error::{ConfigError, FrameError};
use crate::pose::PoseResult;
use crate::tracker::exercise::ExerciseKind;
use crate::tracker::one_euro::AngleSmoother;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    /// Primary angle last seen above the up threshold (joint extended)
    Up,
    /// Primary angle last seen below the down threshold
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: RepPhase,
    pub to: RepPhase,
}

/// Where the primary angle sits relative to the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Bottom,
    Band,
    Top,
}

/// Latest counter state of one exercise
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepCounterState {
    pub count: f32,
    pub phase: RepPhase,
    pub form_ok: bool,
    /// Set once good form has been seen at the top of the movement
    pub ready: bool,
    pub feedback: String,
    pub last_transition_at: Option<Duration>,
}

impl RepCounterState {
    fn initial(config: &ExerciseConfig) -> Self {
        Self {
            count: 0.0,
            phase: RepPhase::Up,
            form_ok: false,
            ready: false,
            feedback: config.feedback.not_ready.clone(),
            last_transition_at: None,
        }
    }
}

/// Result of evaluating one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepUpdate {
    pub phase: RepPhase,
    pub form_ok: bool,
    pub feedback: String,
    pub count_delta: f32,
    pub count: f32,
    pub transition: Option<Transition>,
    /// Primary angle after smoothing, if it could be measured
    pub angle: Option<f32>,
    /// Position between the thresholds, 0 (down) ..= 100 (up)
    pub progress: Option<f32>,
}

/// Angles measured from one frame, in configuration order
#[derive(Debug, Clone, PartialEq)]
pub struct JointAngles {
    pub primary: f32,
    /// One per configured form check
    pub checks: Vec<f32>,
}

pub struct RepMachine {
    kind: ExerciseKind,
    config: ExerciseConfig,
    state: RepCounterState,
    smoother: Option<AngleSmoother>,
    zone: Option<Zone>,
}

impl RepMachine {
    pub fn new(kind: ExerciseKind, config: ExerciseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            kind,
            state: RepCounterState::initial(&config),
            smoother: config.smoothing.map(AngleSmoother::new),
            zone: None,
            config,
        })
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn config(&self) -> &ExerciseConfig {
        &self.config
    }

    pub fn state(&self) -> &RepCounterState {
        &self.state
    }

    /// Measures the primary angle and every form-check angle.
    pub fn measure(&self, input: &PoseResult) -> Result<JointAngles, FrameError> {
        let frame = input.frame().ok_or(FrameError::NoDetection)?;
        let visibility = self.config.visibility_threshold;
        let primary = self.config.primary.measure(frame, visibility)?;
        let checks = self
            .config
            .form_checks
            .iter()
            .map(|check| check.joints.measure(frame, visibility))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JointAngles { primary, checks })
    }

    pub fn update(&mut self, input: &PoseResult) -> RepUpdate {
        let angles = self.measure(input);
        self.apply(angles, input.timestamp())
    }

    /// Transition function. Never fails: unusable frames only change
    /// `form_ok` and `feedback`.
    pub fn apply(&mut self, angles: Result<JointAngles, FrameError>, timestamp: Duration) -> RepUpdate {
        let angles = match angles.and_then(|a| self.check_arity(a)) {
            Ok(angles) => angles,
            Err(e) => {
                debug!(exercise = %self.kind, error = %e, "frame not evaluated");
                self.state.form_ok = false;
                self.state.feedback.clone_from(&self.config.feedback.fix_form);
                self.zone = None;
                return self.report(0.0, None, None);
            }
        };

        let primary = match self.smoother.as_mut() {
            Some(smoother) => smoother.filter(angles.primary, timestamp),
            None => angles.primary,
        };
        let zone = self.zone_of(primary);
        let checks_ok = self.checks_pass(&angles.checks, zone);

        if !self.state.ready {
            if zone == Zone::Top && checks_ok {
                self.state.ready = true;
                info!(exercise = %self.kind, angle = primary, "starting position reached");
            } else {
                self.state.form_ok = false;
                self.state.feedback.clone_from(&self.config.feedback.not_ready);
                return self.report(0.0, None, Some(primary));
            }
        }

        self.state.form_ok = checks_ok;
        if !checks_ok {
            self.state.feedback.clone_from(&self.config.feedback.fix_form);
            self.zone = None;
            return self.report(0.0, None, Some(primary));
        }

        let transition = match (self.state.phase, zone) {
            (RepPhase::Up, Zone::Bottom) => Some(Transition {
                from: RepPhase::Up,
                to: RepPhase::Down,
            }),
            (RepPhase::Down, Zone::Top) => Some(Transition {
                from: RepPhase::Down,
                to: RepPhase::Up,
            }),
            _ => None,
        };

        let mut delta = 0.0;
        let feedback = &self.config.feedback;
        match transition {
            Some(t) => {
                self.state.phase = t.to;
                self.state.last_transition_at = Some(timestamp);
                if self.counts(t) {
                    delta = self.config.unit_per_half_cycle;
                    self.state.count += delta;
                }
                let extreme = match t.to {
                    RepPhase::Up => &feedback.top,
                    RepPhase::Down => &feedback.bottom,
                };
                let message = match (&feedback.counted, delta > 0.0) {
                    (Some(counted), true) => counted,
                    _ => extreme,
                };
                self.state.feedback.clone_from(message);
                info!(
                    exercise = %self.kind,
                    from = ?t.from,
                    to = ?t.to,
                    count = self.state.count,
                    angle = primary,
                    "phase transition"
                );
            }
            None if zone == Zone::Band => {
                self.state.feedback.clone_from(&feedback.band);
            }
            // Holding an extreme: keep whatever was shown unless the zone changed
            None if self.zone != Some(zone) => {
                let message = if zone == Zone::Top { &feedback.top } else { &feedback.bottom };
                self.state.feedback.clone_from(message);
            }
            None => {}
        }
        self.zone = Some(zone);

        self.report(delta, transition, Some(primary))
    }

    /// Back to a fresh session
    pub fn reset(&mut self) {
        self.state = RepCounterState::initial(&self.config);
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset();
        }
        self.zone = None;
    }

    fn check_arity(&self, angles: JointAngles) -> Result<JointAngles, FrameError> {
        match self.config.form_checks.get(angles.checks.len()) {
            Some(missing) => Err(FrameError::MissingLandmark(missing.joints.vertex())),
            None => Ok(angles),
        }
    }

    fn zone_of(&self, angle: f32) -> Zone {
        if angle < self.config.down_threshold {
            Zone::Bottom
        } else if angle > self.config.up_threshold {
            Zone::Top
        } else {
            Zone::Band
        }
    }

    fn checks_pass(&self, angles: &[f32], zone: Zone) -> bool {
        self.config
            .form_checks
            .iter()
            .zip(angles)
            .filter(|(check, _)| match check.scope {
                CheckScope::Always => true,
                CheckScope::Top => zone == Zone::Top,
                CheckScope::Bottom => zone == Zone::Bottom,
            })
            .all(|(check, &angle)| check.comparator.holds(angle, check.threshold))
    }

    fn counts(&self, t: Transition) -> bool {
        match self.config.count_on {
            CountOn::Both => true,
            CountOn::Ascent => t.to == RepPhase::Up,
            CountOn::Descent => t.to == RepPhase::Down,
        }
    }

    fn progress(&self, angle: f32) -> f32 {
        let span = self.config.up_threshold - self.config.down_threshold;
        ((angle - self.config.down_threshold) / span * 100.0).clamp(0.0, 100.0)
    }

    fn report(&self, count_delta: f32, transition: Option<Transition>, angle: Option<f32>) -> RepUpdate {
        RepUpdate {
            phase: self.state.phase,
            form_ok: self.state.form_ok,
            feedback: self.state.feedback.clone(),
            count_delta,
            count: self.state.count,
            transition,
            angle,
            progress: angle.map(|a| self.progress(a)),
        }
    }
}
