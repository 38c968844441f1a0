use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::envelope::DEFAULT_SAMPLES_PER_FRAME;
use crate::audio::source::DEFAULT_FPS;
use crate::audio::SamplingMode;
use crate::error::{Result, RigError};
use crate::mapping::ThresholdMapper;

pub const MAX_PARTICLE_STRENGTH: f32 = 15.0;

/// Everything that shapes a generated rig.
///
/// Defaults match the speaker-system tool's UI: lights on, curve and bars off,
/// shared smooth colors, particle strength 7.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub audio_path: Option<PathBuf>,

    /// Components
    pub curve: bool,
    pub lights: bool,
    pub bars: bool,

    /// Colors
    pub same_color_for_all_targets: bool,
    pub smooth_color: bool,
    pub color_threshold: f32,

    /// Particles. A strength of 0 disables the particle system.
    pub particle_strength: f32,
    pub emit_threshold: f32,

    /// Analysis
    pub fps: f32,
    pub samples_per_frame: usize,
    pub sampling: SamplingMode,

    /// Seed for color draws; unseeded runs draw from entropy.
    pub seed: Option<u64>,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            audio_path: None,
            curve: false,
            lights: true,
            bars: false,
            same_color_for_all_targets: true,
            smooth_color: true,
            color_threshold: 0.2,
            particle_strength: 7.0,
            emit_threshold: 0.4,
            fps: DEFAULT_FPS,
            samples_per_frame: DEFAULT_SAMPLES_PER_FRAME,
            sampling: SamplingMode::default(),
            seed: None,
        }
    }
}

impl RigConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: RigConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The audio path, or `NoConfigurationProvided` when none was given.
    pub fn require_audio_path(&self) -> Result<&Path> {
        match &self.audio_path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(RigError::NoConfigurationProvided),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_range("particle_strength", self.particle_strength, 0.0, MAX_PARTICLE_STRENGTH)?;
        check_range("emit_threshold", self.emit_threshold, 0.0, 1.0)?;
        check_range("color_threshold", self.color_threshold, 0.0, 1.0)?;
        check_range("fps", self.fps, 1.0, 1000.0)?;
        check_range("samples_per_frame", self.samples_per_frame as f32, 1.0, 1000.0)?;
        Ok(())
    }

    pub fn particles_enabled(&self) -> bool {
        self.particle_strength > 0.0
    }

    pub fn mapper(&self) -> ThresholdMapper {
        ThresholdMapper::new(self.particle_strength, self.emit_threshold, self.color_threshold)
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RigError::InvalidParameter { name, value, min, max })
    }
}
