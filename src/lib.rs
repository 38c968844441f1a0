//! Speaker rig generation from audio.
//!
//! An audio file is reduced to a per-frame amplitude [`Envelope`](audio::Envelope),
//! mapped through thresholds into control values, and written as keyframe tracks
//! for a speaker rig: speaker cone and body, amplitude curve, point light,
//! particle emitter and a bar-graph grid.

pub mod audio;
pub mod config;
pub mod error;
pub mod mapping;
pub mod rig;

pub use config::RigConfig;
pub use error::{Result, RigError};
