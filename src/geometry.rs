//! Joint angles from landmark positions.
//!
//! Angles are measured in the image (x, y) plane; depth is ignored.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FrameError};
use crate::pose::{BodyPart, Frame, Landmark};

/// Vectors shorter than this are treated as coincident points
const MIN_VECTOR_LENGTH: f32 = 1e-6;

/// Interior angle at `b` of the triangle `a`-`b`-`c`, in degrees (0..=180).
pub fn angle_at(a: &Landmark, b: &Landmark, c: &Landmark) -> Result<f32, FrameError> {
    let ba = (a.x - b.x, a.y - b.y);
    let bc = (c.x - b.x, c.y - b.y);

    let len_ba = ba.0.hypot(ba.1);
    let len_bc = bc.0.hypot(bc.1);
    let usable = |len: f32| len.is_finite() && len > MIN_VECTOR_LENGTH;
    // NaN and infinite coordinates fail this check too
    if !(usable(len_ba) && usable(len_bc)) {
        return Err(FrameError::DegenerateGeometry);
    }

    // Unit vectors first so the dot product cannot overflow
    let cos = (ba.0 / len_ba) * (bc.0 / len_bc) + (ba.1 / len_ba) * (bc.1 / len_bc);
    Ok(cos.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Three body parts whose angle is measured at the middle one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointTriple(pub BodyPart, pub BodyPart, pub BodyPart);

impl JointTriple {
    pub fn new(a: BodyPart, vertex: BodyPart, c: BodyPart) -> Self {
        Self(a, vertex, c)
    }

    /// Parses three body-part names, e.g. `("LEFT_HIP", "LEFT_KNEE", "LEFT_ANKLE")`.
    pub fn parse(a: &str, vertex: &str, c: &str) -> Result<Self, ConfigError> {
        Ok(Self(a.parse()?, vertex.parse()?, c.parse()?))
    }

    pub fn vertex(&self) -> BodyPart {
        self.1
    }

    pub fn parts(&self) -> [BodyPart; 3] {
        [self.0, self.1, self.2]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.0 == self.1 || self.1 == self.2 || self.0 == self.2 {
            return Err(ConfigError::DegenerateJointTriple(self.to_string()));
        }
        Ok(())
    }

    /// Angle at the vertex for this frame.
    ///
    /// Fails with [`FrameError::MissingLandmark`] when a part is absent or
    /// below `visibility_threshold`.
    pub fn measure(&self, frame: &Frame, visibility_threshold: f32) -> Result<f32, FrameError> {
        let lookup = |part: BodyPart| {
            frame
                .get(part)
                .filter(|lm| lm.is_visible(visibility_threshold))
                .ok_or(FrameError::MissingLandmark(part))
        };
        angle_at(lookup(self.0)?, lookup(self.1)?, lookup(self.2)?)
    }
}

impl fmt::Display for JointTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.0, self.1, self.2)
    }
}
