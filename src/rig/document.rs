use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::keyframe::Track;
use crate::audio::{EnvelopeStats, SourceInfo};
use crate::config::RigConfig;
use crate::error::Result;

/// First and last frame the host timeline should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackRange {
    pub start: i64,
    pub end: i64,
}

/// A generated speaker rig, ready to hand to an external 3D tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigDocument {
    pub source: SourceInfo,
    pub config: RigConfig,
    /// `None` when the audio covers no frames
    pub playback: Option<PlaybackRange>,
    pub envelope: EnvelopeStats,
    /// Control points of the amplitude curve, empty unless the curve is enabled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub curve_points: Vec<Vec3>,
    pub tracks: Vec<Track>,
}

impl RigDocument {
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    pub fn total_keys(&self) -> usize {
        self.tracks.iter().map(Track::key_count).sum()
    }

    /// Save as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, output_path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let json = std::fs::read_to_string(input_path)?;
        let document: RigDocument = serde_json::from_str(&json)?;
        Ok(document)
    }
}
