pub mod envelope;
pub mod source;

pub use envelope::{Envelope, EnvelopeExtractor, EnvelopeStats, SamplingMode};
pub use source::{DecodedAudio, SourceInfo};

use thiserror::Error;

/// Amplitude value of silence. Raw amplitude is encoded centered on this value.
pub const CENTER_AMPLITUDE: f32 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("sample time {time:.3} is outside the source range [0, {duration:.3}]")]
    OutOfRange { time: f64, duration: f64 },
}

/// Read-only source of amplitude samples addressable by time in frames.
///
/// Implementations return raw amplitude centered at [`CENTER_AMPLITUDE`]:
/// silence reads as 0.5, full-scale excursions as 0.0 or 1.0.
pub trait AudioSignal {
    /// Raw amplitude at `time`, measured in frames from the start of the source.
    fn sample_amplitude(&self, time: f64) -> Result<f32, SampleError>;

    /// Whole frames covered by the source.
    fn duration_frames(&self) -> usize;
}

impl<T: AudioSignal + ?Sized> AudioSignal for &T {
    fn sample_amplitude(&self, time: f64) -> Result<f32, SampleError> {
        (**self).sample_amplitude(time)
    }

    fn duration_frames(&self) -> usize {
        (**self).duration_frames()
    }
}

/// Heard loudness of a raw centered sample.
#[inline]
pub fn rectify(raw: f32) -> f32 {
    (CENTER_AMPLITUDE - raw).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectify_is_distance_from_center() {
        assert_eq!(rectify(0.5), 0.0);
        assert_eq!(rectify(1.0), 0.5);
        assert_eq!(rectify(0.0), 0.5);
        assert!((rectify(0.3) - 0.2).abs() < 1e-6);
    }
}
