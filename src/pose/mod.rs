pub mod landmark;

pub use landmark::{BodyPart, Frame, Landmark, PoseResult};
