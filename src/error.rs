//! Error types.
//!
//! Per-frame failures ([`FrameError`]) are absorbed by the rep machine and
//! only show up in `form_ok` / `feedback`. Configuration failures
//! ([`ConfigError`]) are fatal at load or registration time.

use std::path::PathBuf;

use thiserror::Error;

use crate::pose::BodyPart;
use crate::tracker::ExerciseKind;

/// A frame could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// A required body part is absent or below the visibility threshold.
    #[error("missing landmark: {0}")]
    MissingLandmark(BodyPart),

    /// A joint vector has zero length.
    #[error("degenerate geometry: coincident landmarks")]
    DegenerateGeometry,

    /// The pose estimator reported no person in the frame.
    #[error("no pose detected")]
    NoDetection,
}

/// Invalid exercise or application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("down threshold {down}° must be below up threshold {up}°")]
    InvalidThresholds { down: f32, up: f32 },

    #[error("{what} threshold {value}° is outside [0, 180]")]
    ThresholdOutOfRange { what: String, value: f32 },

    #[error("joint triple {0} must name three distinct body parts")]
    DegenerateJointTriple(String),

    #[error("unknown body part: {0:?}")]
    UnknownBodyPart(String),

    #[error("count unit must be positive and finite, got {0}")]
    InvalidUnit(f32),

    #[error("visibility threshold must be within [0, 1], got {0}")]
    InvalidVisibility(f32),

    #[error("invalid smoothing parameters: {0}")]
    InvalidSmoothing(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Session controller errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("exercise {0} is not registered")]
    NotRegistered(ExerciseKind),

    #[error("exercise {0} is already registered")]
    AlreadyRegistered(ExerciseKind),
}
