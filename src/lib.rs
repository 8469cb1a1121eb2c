pub mod config;
pub mod error;
pub mod geometry;
pub mod pose;
pub mod replay;
pub mod session;
pub mod tracker;

pub use config::{Config, ExerciseConfig};
pub use error::{ConfigError, FrameError, SessionError};
pub use pose::{BodyPart, Frame, Landmark, PoseResult};
pub use session::{ExerciseHandle, FeedOutcome, SessionController, SharedSession};
pub use tracker::{ExerciseKind, RepCounterState, RepPhase, RepUpdate};
