pub mod color;
pub mod threshold;

pub use color::{Color, ColorEvent, ColorEventKind, ColorEvents, ColorSequencer};
pub use threshold::{ControlSignal, ThresholdMapper, BOUNCE_DAMPING, PRIMARY_DAMPING};
