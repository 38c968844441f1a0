//! Error types for rig generation.
//!
//! Every variant is fatal to the current generation attempt. Nothing is retried
//! and no partial rig is produced.

use std::path::PathBuf;
use thiserror::Error;

use crate::audio::SampleError;

#[derive(Error, Debug)]
pub enum RigError {
    #[error("audio source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("audio source unreadable: {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("no audio source specified")]
    NoConfigurationProvided,

    #[error("{name} = {value} is outside [{min}, {max}]")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RigError {
    /// Wrap a sampling failure as an unreadable source.
    pub fn unreadable(path: impl Into<PathBuf>, err: SampleError) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Both "not found" and "unreadable" mean there is no audio to work with.
    pub fn is_missing_audio(&self) -> bool {
        matches!(self, Self::SourceNotFound(_) | Self::SourceUnreadable { .. })
    }
}

pub type Result<T> = std::result::Result<T, RigError>;
