use serde::{Deserialize, Serialize};

use crate::audio::Envelope;

/// Damping for the speaker cone's own scale.
pub const PRIMARY_DAMPING: f32 = 1.0;

/// Damping for the whole speaker body, which should only bounce slightly.
pub const BOUNCE_DAMPING: f32 = 20.0;

const EMIT_RATE_FACTOR: f32 = 30.0;
const EMIT_SPEED_FACTOR: f32 = 550.0;

/// Control values for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSignal {
    pub frame: usize,
    pub scale_factor: f32,
    pub emit_rate: f32,
    pub emit_speed: f32,
    pub color_trigger: bool,
}

/// Maps envelope values to control values through thresholds and gains.
///
/// Every method is a pure function of its inputs; frames never interact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdMapper {
    pub strength_gain: f32,
    pub emit_threshold: f32,
    pub color_threshold: f32,
}

impl Default for ThresholdMapper {
    fn default() -> Self {
        Self {
            strength_gain: 7.0,
            emit_threshold: 0.4,
            color_threshold: 0.2,
        }
    }
}

impl ThresholdMapper {
    pub fn new(strength_gain: f32, emit_threshold: f32, color_threshold: f32) -> Self {
        Self {
            strength_gain,
            emit_threshold,
            color_threshold,
        }
    }

    pub fn scale_factor(value: f32, damping: f32) -> f32 {
        damping + value * 2.0
    }

    /// Emission `(rate, speed)`. Squared so loud frames stand out; zero below the
    /// threshold so silence emits nothing.
    pub fn emission(&self, value: f32) -> (f32, f32) {
        if value < self.emit_threshold {
            return (0.0, 0.0);
        }
        let rate = (EMIT_RATE_FACTOR * value * self.strength_gain).powi(2);
        let speed = EMIT_SPEED_FACTOR * value.powi(2);
        (rate, speed)
    }

    pub fn color_trigger(&self, value: f32) -> bool {
        value > self.color_threshold
    }

    /// Control signal for `frame`, or `None` past the end of the envelope.
    pub fn map(&self, envelope: &Envelope, frame: usize, damping: f32) -> Option<ControlSignal> {
        let value = envelope.get(frame)?;
        let (emit_rate, emit_speed) = self.emission(value);
        Some(ControlSignal {
            frame,
            scale_factor: Self::scale_factor(value, damping),
            emit_rate,
            emit_speed,
            color_trigger: self.color_trigger(value),
        })
    }

    /// Control signals for every frame of the envelope, in order.
    pub fn signals<'a>(
        &'a self,
        envelope: &'a Envelope,
        damping: f32,
    ) -> impl Iterator<Item = ControlSignal> + 'a {
        (0..envelope.len()).filter_map(move |frame| self.map(envelope, frame, damping))
    }
}
