use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{CheckScope, Comparator, CountOn, ExerciseConfig, FeedbackMessages, FormCheck};
use crate::geometry::JointTriple;
use crate::pose::BodyPart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    PushUp,
    Squat,
    Crunch,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 3] = [Self::PushUp, Self::Squat, Self::Crunch];

    pub fn name(self) -> &'static str {
        match self {
            Self::PushUp => "push_up",
            Self::Squat => "squat",
            Self::Crunch => "crunch",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "push_up" | "pushup" => Ok(Self::PushUp),
            "squat" => Ok(Self::Squat),
            "crunch" => Ok(Self::Crunch),
            other => Err(format!("unknown exercise: {}", other)),
        }
    }
}

impl ExerciseConfig {
    pub fn preset(kind: ExerciseKind) -> Self {
        match kind {
            ExerciseKind::PushUp => Self::push_up(),
            ExerciseKind::Squat => Self::squat(),
            ExerciseKind::Crunch => Self::crunch(),
        }
    }

    /// Left elbow drives the phase; every half-cycle is worth 0.5.
    ///
    /// Shoulder flare is only judged at the top, hip sag everywhere.
    pub fn push_up() -> Self {
        use BodyPart::*;
        Self {
            primary: JointTriple::new(LeftShoulder, LeftElbow, LeftWrist),
            down_threshold: 90.0,
            up_threshold: 160.0,
            form_checks: vec![
                FormCheck {
                    name: "shoulder".to_string(),
                    joints: JointTriple::new(LeftElbow, LeftShoulder, LeftHip),
                    comparator: Comparator::Above,
                    threshold: 40.0,
                    scope: CheckScope::Top,
                },
                FormCheck {
                    name: "hip".to_string(),
                    joints: JointTriple::new(LeftShoulder, LeftHip, LeftKnee),
                    comparator: Comparator::Above,
                    threshold: 160.0,
                    scope: CheckScope::Always,
                },
            ],
            min_frame_interval_ms: 200,
            unit_per_half_cycle: 0.5,
            count_on: CountOn::Both,
            visibility_threshold: 0.5,
            smoothing: None,
            feedback: FeedbackMessages {
                bottom: "Up".to_string(),
                top: "Down".to_string(),
                counted: None,
                band: "Maintain control while moving up/down.".to_string(),
                fix_form: "Fix Form".to_string(),
                not_ready: "Fix Form".to_string(),
            },
        }
    }

    /// Right knee; a rep counts when standing back up.
    pub fn squat() -> Self {
        use BodyPart::*;
        Self {
            primary: JointTriple::new(RightHip, RightKnee, RightAnkle),
            down_threshold: 90.0,
            up_threshold: 160.0,
            form_checks: Vec::new(),
            min_frame_interval_ms: 200,
            unit_per_half_cycle: 1.0,
            count_on: CountOn::Ascent,
            visibility_threshold: 0.5,
            smoothing: None,
            feedback: FeedbackMessages {
                bottom: "Good depth! Hold for a moment.".to_string(),
                top: "Stand tall, then squat down.".to_string(),
                counted: Some("Squat counted! Keep going!".to_string()),
                band: "Maintain control while moving up/down.".to_string(),
                fix_form: "Fix Form".to_string(),
                not_ready: "Stand tall to start.".to_string(),
            },
        }
    }

    /// Hip flexion (shoulder-hip-knee) closes as the torso curls up; the rep
    /// counts on lowering back down. Knees must stay bent.
    pub fn crunch() -> Self {
        use BodyPart::*;
        Self {
            primary: JointTriple::new(LeftShoulder, LeftHip, LeftKnee),
            down_threshold: 70.0,
            up_threshold: 110.0,
            form_checks: vec![FormCheck {
                name: "knee".to_string(),
                joints: JointTriple::new(LeftHip, LeftKnee, LeftAnkle),
                comparator: Comparator::Below,
                threshold: 130.0,
                scope: CheckScope::Always,
            }],
            min_frame_interval_ms: 200,
            unit_per_half_cycle: 1.0,
            count_on: CountOn::Ascent,
            visibility_threshold: 0.5,
            smoothing: None,
            feedback: FeedbackMessages {
                bottom: "Good crunch! Lower back down.".to_string(),
                top: "Curl up.".to_string(),
                counted: Some("Crunch counted! Keep going!".to_string()),
                band: "Maintain control while moving up/down.".to_string(),
                fix_form: "Fix Form".to_string(),
                not_ready: "Lie back with knees bent to start.".to_string(),
            },
        }
    }
}
