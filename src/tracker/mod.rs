pub mod exercise;
pub mod gate;
pub mod one_euro;
pub mod rep;

pub use exercise::ExerciseKind;
pub use gate::FrameGate;
pub use one_euro::AngleSmoother;
pub use rep::{JointAngles, RepCounterState, RepMachine, RepPhase, RepUpdate, Transition};
