use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{rectify, AudioSignal, SampleError};

/// Samples averaged into each envelope value.
pub const DEFAULT_SAMPLES_PER_FRAME: usize = 10;

/// Gain applied to the averaged, rectified amplitude.
pub const ENVELOPE_GAIN: f32 = 1.5;

/// Where inside a frame the extractor takes its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Sample `j` of frame `i` is read at `i + (j + 1) / k`, covering the frame's span.
    #[default]
    Spread,
    /// Every sample of frame `i` is read at `i + 1`. Equivalent to a single read
    /// scaled by the gain; kept for parity with rigs generated by earlier tools.
    Repeated,
}

impl SamplingMode {
    fn sample_time(self, frame: usize, sample: usize, samples_per_frame: usize) -> f64 {
        match self {
            Self::Spread => frame as f64 + (sample + 1) as f64 / samples_per_frame as f64,
            Self::Repeated => frame as f64 + 1.0,
        }
    }
}

/// Per-frame loudness of an audio source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    values: Vec<f32>,
}

impl Envelope {
    pub fn from_values(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, frame: usize) -> Option<f32> {
        self.values.get(frame).copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    pub fn stats(&self) -> EnvelopeStats {
        EnvelopeStats::from_envelope(self)
    }
}

/// Summary of an envelope, used for logging and reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeStats {
    pub frames: usize,
    pub peak: f32,
    pub peak_frame: usize,
    pub mean: f32,
    /// Frames whose value is at or below a small silence floor
    pub silent_frames: usize,
}

impl EnvelopeStats {
    const SILENCE_FLOOR: f32 = 1e-4;

    fn from_envelope(envelope: &Envelope) -> Self {
        if envelope.is_empty() {
            return Self::default();
        }

        let (peak_frame, peak) = envelope
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, v)| if v > best.1 { (i, v) } else { best });

        Self {
            frames: envelope.len(),
            peak,
            peak_frame,
            mean: envelope.iter().sum::<f32>() / envelope.len() as f32,
            silent_frames: envelope.iter().filter(|&v| v <= Self::SILENCE_FLOOR).count(),
        }
    }

    /// Frames strictly above `threshold`.
    pub fn frames_above(envelope: &Envelope, threshold: f32) -> usize {
        envelope.iter().filter(|&v| v > threshold).count()
    }
}

/// Averages rectified amplitude into one envelope value per frame.
#[derive(Debug, Clone)]
pub struct EnvelopeExtractor {
    samples_per_frame: usize,
    gain: f32,
    mode: SamplingMode,
}

impl Default for EnvelopeExtractor {
    fn default() -> Self {
        Self {
            samples_per_frame: DEFAULT_SAMPLES_PER_FRAME,
            gain: ENVELOPE_GAIN,
            mode: SamplingMode::default(),
        }
    }
}

impl EnvelopeExtractor {
    pub fn new(samples_per_frame: usize, mode: SamplingMode) -> Self {
        Self {
            samples_per_frame: samples_per_frame.max(1),
            gain: ENVELOPE_GAIN,
            mode,
        }
    }

    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Extract an envelope covering the whole source.
    pub fn extract_all<S: AudioSignal + ?Sized>(&self, signal: &S) -> Result<Envelope, SampleError> {
        self.extract(signal, signal.duration_frames())
    }

    /// Extract exactly `frame_count` envelope values.
    ///
    /// Either every frame is produced or the first out-of-range sample is returned
    /// as the error.
    pub fn extract<S: AudioSignal + ?Sized>(
        &self,
        signal: &S,
        frame_count: usize,
    ) -> Result<Envelope, SampleError> {
        let mut values = Vec::with_capacity(frame_count);

        for frame in 0..frame_count {
            let mut total = 0.0f32;
            for sample in 0..self.samples_per_frame {
                let time = self.mode.sample_time(frame, sample, self.samples_per_frame);
                total += rectify(signal.sample_amplitude(time)?);
            }
            values.push(self.gain * (total / self.samples_per_frame as f32));

            if (frame + 1) % 1000 == 0 {
                debug!("Extracted {} of {} envelope frames", frame + 1, frame_count);
            }
        }

        info!(
            "Envelope extracted: {} frames, {} samples per frame ({:?})",
            values.len(),
            self.samples_per_frame,
            self.mode
        );

        Ok(Envelope { values })
    }
}
