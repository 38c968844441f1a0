//! Outbound animation interface.
//!
//! The generator never talks to a scene graph. It hands frame/value pairs to an
//! [`AnimationTarget`], which an engine integration implements for its own
//! objects. [`Track`] is the in-memory implementation serialized into rig
//! documents.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mapping::{Color, ColorEvent};

/// Animatable attributes of rig objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Uniform scale on all three axes
    Scale,
    ScaleY,
    TranslateX,
    /// Particle emission rate
    Rate,
    /// Particle emission speed
    Speed,
    Color,
    Intensity,
    DecayRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tangent {
    #[default]
    Auto,
    Linear,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Scalar(f32),
    Color(Color),
}

impl From<f32> for KeyValue {
    fn from(value: f32) -> Self {
        Self::Scalar(value)
    }
}

impl From<Color> for KeyValue {
    fn from(color: Color) -> Self {
        Self::Color(color)
    }
}

impl KeyValue {
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            Self::Scalar(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: i64,
    pub value: KeyValue,
    #[serde(default)]
    pub in_tangent: Tangent,
    #[serde(default)]
    pub out_tangent: Tangent,
}

impl Keyframe {
    pub fn new(frame: i64, value: impl Into<KeyValue>) -> Self {
        Self {
            frame,
            value: value.into(),
            in_tangent: Tangent::Auto,
            out_tangent: Tangent::Auto,
        }
    }

    pub fn with_tangents(mut self, in_tangent: Tangent, out_tangent: Tangent) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }
}

impl From<ColorEvent> for Keyframe {
    fn from(event: ColorEvent) -> Self {
        Keyframe::new(event.frame, event.color).with_tangents(event.in_tangent, event.out_tangent)
    }
}

/// Something whose attributes can be keyed over time.
pub trait AnimationTarget {
    /// Set a key, replacing any existing key on the same attribute and frame.
    fn set_keyframe(&mut self, attribute: Attribute, key: Keyframe);

    fn set_value(&mut self, attribute: Attribute, frame: i64, value: impl Into<KeyValue>)
    where
        Self: Sized,
    {
        self.set_keyframe(attribute, Keyframe::new(frame, value));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Mesh,
    Group,
    Curve,
    PointLight,
    Emitter,
    Shader,
}

/// Keys of one attribute, ordered by frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationCurve {
    pub attribute: Attribute,
    pub keys: Vec<Keyframe>,
}

/// Unanimated attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticValue {
    pub attribute: Attribute,
    pub value: f32,
}

/// A named rig object and its animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub kind: TrackKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statics: Vec<StaticValue>,
    #[serde(default)]
    pub curves: Vec<AnimationCurve>,
}

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            name: name.into(),
            kind,
            position: None,
            statics: Vec::new(),
            curves: Vec::new(),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_static(mut self, attribute: Attribute, value: f32) -> Self {
        self.set_static(attribute, value);
        self
    }

    pub fn set_static(&mut self, attribute: Attribute, value: f32) {
        match self.statics.iter_mut().find(|s| s.attribute == attribute) {
            Some(existing) => existing.value = value,
            None => self.statics.push(StaticValue { attribute, value }),
        }
    }

    pub fn static_value(&self, attribute: Attribute) -> Option<f32> {
        self.statics
            .iter()
            .find(|s| s.attribute == attribute)
            .map(|s| s.value)
    }

    pub fn keys(&self, attribute: Attribute) -> &[Keyframe] {
        self.curves
            .iter()
            .find(|c| c.attribute == attribute)
            .map(|c| c.keys.as_slice())
            .unwrap_or(&[])
    }

    /// Scalar key value at exactly `frame`, if keyed.
    pub fn scalar_at(&self, attribute: Attribute, frame: i64) -> Option<f32> {
        let keys = self.keys(attribute);
        keys.binary_search_by_key(&frame, |k| k.frame)
            .ok()
            .and_then(|i| keys[i].value.as_scalar())
    }

    pub fn key_count(&self) -> usize {
        self.curves.iter().map(|c| c.keys.len()).sum()
    }

    fn curve_mut(&mut self, attribute: Attribute) -> &mut AnimationCurve {
        let index = match self.curves.iter().position(|c| c.attribute == attribute) {
            Some(index) => index,
            None => {
                self.curves.push(AnimationCurve {
                    attribute,
                    keys: Vec::new(),
                });
                self.curves.len() - 1
            }
        };
        &mut self.curves[index]
    }
}

impl AnimationTarget for Track {
    fn set_keyframe(&mut self, attribute: Attribute, key: Keyframe) {
        let keys = &mut self.curve_mut(attribute).keys;
        match keys.binary_search_by_key(&key.frame, |k| k.frame) {
            Ok(i) => keys[i] = key,
            Err(i) => keys.insert(i, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_stay_sorted_and_replace() {
        let mut track = Track::new("speaker", TrackKind::Mesh);
        track.set_value(Attribute::Scale, 5, 1.0);
        track.set_value(Attribute::Scale, 1, 2.0);
        track.set_value(Attribute::Scale, 3, 3.0);
        track.set_value(Attribute::Scale, 3, 4.0);

        let frames: Vec<i64> = track.keys(Attribute::Scale).iter().map(|k| k.frame).collect();
        assert_eq!(frames, vec![1, 3, 5]);
        assert_eq!(track.scalar_at(Attribute::Scale, 3), Some(4.0));
        assert_eq!(track.scalar_at(Attribute::Scale, 2), None);
        assert_eq!(track.key_count(), 3);
    }

    #[test]
    fn test_attributes_are_independent() {
        let mut track = Track::new("emitter", TrackKind::Emitter);
        track.set_value(Attribute::Rate, 0, 10.0);
        track.set_value(Attribute::Speed, 0, 20.0);

        assert_eq!(track.keys(Attribute::Rate).len(), 1);
        assert_eq!(track.keys(Attribute::Speed).len(), 1);
        assert!(track.keys(Attribute::Color).is_empty());
    }

    #[test]
    fn test_statics() {
        let track = Track::new("light", TrackKind::PointLight)
            .with_static(Attribute::Intensity, 1500.0)
            .with_static(Attribute::DecayRate, 2.0)
            .with_static(Attribute::Intensity, 900.0);

        assert_eq!(track.static_value(Attribute::Intensity), Some(900.0));
        assert_eq!(track.static_value(Attribute::DecayRate), Some(2.0));
        assert_eq!(track.statics.len(), 2);
    }

    #[test]
    fn test_track_json_shape() {
        let mut track = Track::new("shader", TrackKind::Shader);
        track.set_keyframe(
            Attribute::Color,
            Keyframe::new(-1, Color::new(0.25, 0.5, 0.75))
                .with_tangents(Tangent::Flat, Tangent::Linear),
        );

        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["kind"], "shader");
        assert_eq!(json["curves"][0]["attribute"], "color");
        assert_eq!(json["curves"][0]["keys"][0]["frame"], -1);
        assert_eq!(json["curves"][0]["keys"][0]["value"]["g"], 0.5);
        assert_eq!(json["curves"][0]["keys"][0]["in_tangent"], "flat");

        let back: Track = serde_json::from_value(json).unwrap();
        assert_eq!(back, track);
    }
}
