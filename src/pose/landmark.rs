use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// BlazePose 33-landmark body parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyPart {
    pub const COUNT: usize = 33;

    pub const ALL: [BodyPart; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Maps the upstream positional index onto a named part.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "NOSE",
            Self::LeftEyeInner => "LEFT_EYE_INNER",
            Self::LeftEye => "LEFT_EYE",
            Self::LeftEyeOuter => "LEFT_EYE_OUTER",
            Self::RightEyeInner => "RIGHT_EYE_INNER",
            Self::RightEye => "RIGHT_EYE",
            Self::RightEyeOuter => "RIGHT_EYE_OUTER",
            Self::LeftEar => "LEFT_EAR",
            Self::RightEar => "RIGHT_EAR",
            Self::MouthLeft => "MOUTH_LEFT",
            Self::MouthRight => "MOUTH_RIGHT",
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftWrist => "LEFT_WRIST",
            Self::RightWrist => "RIGHT_WRIST",
            Self::LeftPinky => "LEFT_PINKY",
            Self::RightPinky => "RIGHT_PINKY",
            Self::LeftIndex => "LEFT_INDEX",
            Self::RightIndex => "RIGHT_INDEX",
            Self::LeftThumb => "LEFT_THUMB",
            Self::RightThumb => "RIGHT_THUMB",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftAnkle => "LEFT_ANKLE",
            Self::RightAnkle => "RIGHT_ANKLE",
            Self::LeftHeel => "LEFT_HEEL",
            Self::RightHeel => "RIGHT_HEEL",
            Self::LeftFootIndex => "LEFT_FOOT_INDEX",
            Self::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BodyPart {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|part| part.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownBodyPart(s.to_string()))
    }
}

/// Single estimated keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Normalised X (0.0..1.0)
    pub x: f32,
    /// Normalised Y (0.0..1.0)
    pub y: f32,
    /// Depth, ignored for angle purposes
    #[serde(default)]
    pub z: Option<f32>,
    /// Confidence score (0.0..1.0); absent means fully visible
    #[serde(default)]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Whether the visibility clears the threshold
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility.map_or(true, |v| v >= threshold)
    }
}

/// One pose estimate with its stream timestamp
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub landmarks: HashMap<BodyPart, Landmark>,
    /// Time since the start of the stream
    pub timestamp: Duration,
}

impl Frame {
    pub fn new(timestamp: Duration) -> Self {
        Self {
            landmarks: HashMap::new(),
            timestamp,
        }
    }

    /// Builds a frame from the estimator's positional landmark array.
    /// Entries past the known body parts are ignored.
    pub fn from_indexed(landmarks: &[Landmark], timestamp: Duration) -> Self {
        let landmarks = landmarks
            .iter()
            .enumerate()
            .filter_map(|(i, lm)| BodyPart::from_index(i).map(|part| (part, *lm)))
            .collect();
        Self {
            landmarks,
            timestamp,
        }
    }

    pub fn with(mut self, part: BodyPart, landmark: Landmark) -> Self {
        self.landmarks.insert(part, landmark);
        self
    }

    pub fn get(&self, part: BodyPart) -> Option<&Landmark> {
        self.landmarks.get(&part)
    }
}

/// What the pose estimator delivers for one processed video frame
#[derive(Debug, Clone)]
pub enum PoseResult {
    Detected(Frame),
    NoDetection { timestamp: Duration },
}

impl PoseResult {
    pub fn timestamp(&self) -> Duration {
        match self {
            Self::Detected(frame) => frame.timestamp,
            Self::NoDetection { timestamp } => *timestamp,
        }
    }

    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Self::Detected(frame) => Some(frame),
            Self::NoDetection { .. } => None,
        }
    }
}

impl From<Frame> for PoseResult {
    fn from(frame: Frame) -> Self {
        Self::Detected(frame)
    }
}
