use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{AudioSignal, SampleError, CENTER_AMPLITUDE};
use crate::error::{Result, RigError};

/// Frame rate used when none is configured (film, 24 fps).
pub const DEFAULT_FPS: f32 = 24.0;

/// Metadata about a decoded audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// File name without directory or extension
    pub name: String,
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_seconds: f32,
    pub fps: f32,
    pub frames: usize,
}

/// A WAV file decoded to mono and addressable by animation frame.
pub struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    fps: f32,
    path: PathBuf,
}

impl DecodedAudio {
    /// Load a `.wav` file and mix it down to mono.
    pub fn open<P: AsRef<Path>>(path: P, fps: f32) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RigError::SourceNotFound(path.to_path_buf()));
        }
        if !has_wav_extension(path) {
            return Err(RigError::SourceUnreadable {
                path: path.to_path_buf(),
                reason: "only .wav files are supported".to_string(),
            });
        }

        let unreadable = |err: hound::Error| RigError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        };

        let reader = hound::WavReader::open(path).map_err(unreadable)?;
        let spec = reader.spec();
        debug!(
            "WAV spec: {} channels, {}Hz, {} bits, {:?}",
            spec.channels, spec.sample_rate, spec.bits_per_sample, spec.sample_format
        );

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(unreadable)?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(unreadable)?
            }
        };

        if interleaved.iter().any(|s| !s.is_finite()) {
            return Err(RigError::SourceUnreadable {
                path: path.to_path_buf(),
                reason: "non-finite sample".to_string(),
            });
        }

        let channels = spec.channels.max(1);

        // Mix to mono
        let samples: Vec<f32> = interleaved
            .chunks_exact(channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect();

        let audio = Self {
            samples,
            sample_rate: spec.sample_rate,
            channels,
            fps,
            path: path.to_path_buf(),
        };

        info!(
            "Loaded audio file: {:?} ({}Hz, {} samples, {} frames at {} fps)",
            path,
            audio.sample_rate,
            audio.samples.len(),
            audio.duration_frames(),
            fps
        );

        Ok(audio)
    }

    /// Wrap already-decoded mono PCM samples in [-1, 1]. Non-finite samples
    /// read as silence.
    pub fn from_samples(mut samples: Vec<f32>, sample_rate: u32, fps: f32) -> Self {
        for s in samples.iter_mut().filter(|s| !s.is_finite()) {
            *s = 0.0;
        }
        Self {
            samples,
            sample_rate,
            channels: 1,
            fps,
            path: PathBuf::new(),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn info(&self) -> SourceInfo {
        SourceInfo {
            name: file_stem(&self.path),
            path: self.path.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            duration_seconds: self.duration_seconds(),
            fps: self.fps,
            frames: self.duration_frames(),
        }
    }

    /// Exact length of the source in (fractional) frames.
    fn duration_exact(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64 * self.fps as f64
    }
}

impl AudioSignal for DecodedAudio {
    fn sample_amplitude(&self, time: f64) -> std::result::Result<f32, SampleError> {
        let duration = self.duration_exact();
        if self.samples.is_empty() || !(0.0..=duration).contains(&time) {
            return Err(SampleError::OutOfRange { time, duration });
        }

        let index = (time / self.fps as f64 * self.sample_rate as f64).floor() as usize;
        let pcm = self.samples[index.min(self.samples.len() - 1)].clamp(-1.0, 1.0);

        Ok(CENTER_AMPLITUDE + CENTER_AMPLITUDE * pcm)
    }

    fn duration_frames(&self) -> usize {
        self.duration_exact().floor() as usize
    }
}

/// Name of an audio file without its directory or extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}
