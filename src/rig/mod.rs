pub mod document;
pub mod generator;
pub mod keyframe;

pub use document::{PlaybackRange, RigDocument};
pub use generator::{
    apply_color_events, LogProgress, NoProgress, ProgressReporter, RigGenerator, RigLayout,
};
pub use keyframe::{AnimationTarget, Attribute, KeyValue, Keyframe, Tangent, Track, TrackKind};
