use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::audio::Envelope;
use crate::rig::keyframe::Tangent;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Three independent uniform draws in `[0, 1)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let r = rng.gen::<f32>();
        let g = rng.gen::<f32>();
        let b = rng.gen::<f32>();
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorEventKind {
    /// Start of a new color
    Transition,
    /// Previous color held flat up to the next transition
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorEvent {
    /// May be -1 when a stepped change is triggered on frame 0
    pub frame: i64,
    pub color: Color,
    pub kind: ColorEventKind,
    pub in_tangent: Tangent,
    pub out_tangent: Tangent,
}

/// Decides on which frames a new random color begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSequencer {
    pub threshold: f32,
    pub smooth: bool,
    /// Color in effect before the first change
    pub initial: Color,
}

impl ColorSequencer {
    pub fn new(threshold: f32, smooth: bool) -> Self {
        Self {
            threshold,
            smooth,
            initial: Color::BLACK,
        }
    }

    pub fn with_initial(mut self, initial: Color) -> Self {
        self.initial = initial;
        self
    }

    /// Lazily produce the color events for `envelope`.
    ///
    /// The sequence has no side effects; running it again with an identically
    /// seeded generator yields the same events.
    pub fn events<'a, R: Rng>(&self, envelope: &'a Envelope, rng: R) -> ColorEvents<'a, R> {
        ColorEvents {
            envelope,
            sequencer: *self,
            rng,
            frame: 0,
            previous: self.initial,
            pending: None,
        }
    }
}

pub struct ColorEvents<'a, R> {
    envelope: &'a Envelope,
    sequencer: ColorSequencer,
    rng: R,
    frame: usize,
    previous: Color,
    pending: Option<ColorEvent>,
}

impl<R: Rng> Iterator for ColorEvents<'_, R> {
    type Item = ColorEvent;

    fn next(&mut self) -> Option<ColorEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }

        while let Some(value) = self.envelope.get(self.frame) {
            let frame = self.frame;
            self.frame += 1;

            if value <= self.sequencer.threshold {
                continue;
            }

            let color = Color::random(&mut self.rng);
            let previous = std::mem::replace(&mut self.previous, color);

            if self.sequencer.smooth {
                return Some(ColorEvent {
                    frame: frame as i64,
                    color,
                    kind: ColorEventKind::Transition,
                    in_tangent: Tangent::Linear,
                    out_tangent: Tangent::Linear,
                });
            }

            self.pending = Some(ColorEvent {
                frame: frame as i64,
                color,
                kind: ColorEventKind::Transition,
                in_tangent: Tangent::Linear,
                out_tangent: Tangent::Flat,
            });
            return Some(ColorEvent {
                frame: frame as i64 - 1,
                color: previous,
                kind: ColorEventKind::Hold,
                in_tangent: Tangent::Flat,
                out_tangent: Tangent::Linear,
            });
        }

        None
    }
}
