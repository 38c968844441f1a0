use glam::Vec3;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::document::{PlaybackRange, RigDocument};
use super::keyframe::{AnimationTarget, Attribute, Keyframe, Tangent, Track, TrackKind};
use crate::audio::{
    rectify, AudioSignal, DecodedAudio, Envelope, EnvelopeExtractor, EnvelopeStats, SourceInfo,
};
use crate::config::RigConfig;
use crate::error::{Result, RigError};
use crate::mapping::{
    Color, ColorEvent, ColorEventKind, ColorSequencer, ThresholdMapper, BOUNCE_DAMPING,
    PRIMARY_DAMPING,
};

pub const SPEAKER_CONE: &str = "speaker_cone";
pub const SPEAKER_BODY: &str = "speaker_body";
pub const AMPLITUDE_CURVE: &str = "amplitude_curve";
pub const SPEAKER_LIGHT: &str = "speaker_light";
pub const BAR_LIGHT: &str = "bar_light";
pub const PARTICLE_EMITTER: &str = "particle_emitter";
pub const PARTICLE_SHADER: &str = "particle_shader";

const LIGHT_INTENSITY: f32 = 1500.0;
/// Quadratic falloff
const LIGHT_DECAY_RATE: f32 = 2.0;
const LIGHT_COLOR: Color = Color::new(1.0, 1.0, 1.0);
/// Color of a freshly created lambert shader
const SHADER_COLOR: Color = Color::new(0.5, 0.5, 0.5);
const CURVE_HEIGHT_GAIN: f32 = 20.0;
const CURVE_DROP: f32 = 2.0;
/// Fixed steps besides the optional components: start, audio loaded, speaker built
const BASE_STEPS: usize = 3;

pub fn bar_name(row: usize, column: usize) -> String {
    format!("bar_{row}_{column}")
}

/// Receives coarse progress while a rig is generated.
pub trait ProgressReporter {
    fn start(&mut self, total_steps: usize);
    fn step(&mut self, label: &str);
}

/// Reports progress through the `log` facade.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: usize,
    done: usize,
}

impl ProgressReporter for LogProgress {
    fn start(&mut self, total_steps: usize) {
        self.total = total_steps;
        self.done = 0;
    }

    fn step(&mut self, label: &str) {
        self.done += 1;
        debug!("[{}/{}] {}", self.done, self.total, label);
    }
}

/// Discards progress.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&mut self, _total_steps: usize) {}
    fn step(&mut self, _label: &str) {}
}

/// Placement of the rig's objects in world space.
#[derive(Debug, Clone)]
pub struct RigLayout {
    /// Center of the speaker cone
    pub speaker_position: Vec3,
    pub light_offset: Vec3,
    pub bar_rows: usize,
    pub bar_columns: usize,
    pub bar_spacing: f32,
    pub bar_height: f32,
    /// Where the bar grid's first bar is moved to
    pub bar_origin: Vec3,
    /// Offset of the bar light above the speaker light
    pub bar_light_offset: Vec3,
}

impl Default for RigLayout {
    fn default() -> Self {
        Self {
            speaker_position: Vec3::ZERO,
            light_offset: Vec3::new(-1.5, 0.0, 0.0),
            bar_rows: 10,
            bar_columns: 10,
            bar_spacing: 3.0,
            bar_height: 20.0,
            bar_origin: Vec3::new(-13.175, 23.0, -13.5),
            bar_light_offset: Vec3::new(0.0, 47.0, 0.0),
        }
    }
}

/// Builds a speaker rig from an audio source.
pub struct RigGenerator<'a> {
    config: &'a RigConfig,
    layout: RigLayout,
}

impl<'a> RigGenerator<'a> {
    pub fn new(config: &'a RigConfig) -> Self {
        Self {
            config,
            layout: RigLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: RigLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Progress steps a full generation reports.
    pub fn total_steps(&self) -> usize {
        let config = self.config;
        let bars = if config.bars {
            self.layout.bar_rows * self.layout.bar_columns
        } else {
            0
        };
        usize::from(config.curve)
            + usize::from(config.lights)
            + bars
            + usize::from(config.same_color_for_all_targets)
            + usize::from(config.particles_enabled())
            + BASE_STEPS
    }

    /// Validate the configuration, load the configured audio file and generate.
    pub fn generate_from_config(&self, progress: &mut dyn ProgressReporter) -> Result<RigDocument> {
        let path = self.config.require_audio_path()?;
        self.config.validate()?;

        progress.start(self.total_steps());
        progress.step("configuration accepted");

        let audio = DecodedAudio::open(path, self.config.fps)?;
        self.generate_with(&audio, audio.info(), progress)
    }

    /// Generate from any audio signal.
    pub fn generate<S: AudioSignal + ?Sized>(
        &self,
        audio: &S,
        source: SourceInfo,
        progress: &mut dyn ProgressReporter,
    ) -> Result<RigDocument> {
        self.config.validate()?;
        progress.start(self.total_steps());
        progress.step("configuration accepted");
        self.generate_with(audio, source, progress)
    }

    fn generate_with<S: AudioSignal + ?Sized>(
        &self,
        audio: &S,
        source: SourceInfo,
        progress: &mut dyn ProgressReporter,
    ) -> Result<RigDocument> {
        let config = self.config;

        let extractor = EnvelopeExtractor::new(config.samples_per_frame, config.sampling);
        let envelope = extractor
            .extract_all(audio)
            .map_err(|e| RigError::unreadable(&source.path, e))?;
        progress.step("envelope extracted");

        let stats = envelope.stats();
        let mut document = RigDocument {
            source,
            config: config.clone(),
            playback: None,
            envelope: stats.clone(),
            curve_points: Vec::new(),
            tracks: Vec::new(),
        };

        if envelope.is_empty() {
            warn!("Audio covers no frames; nothing to animate");
            return Ok(document);
        }

        info!(
            "Envelope: {} frames, peak {:.4} at frame {}, mean {:.4}, {} above color threshold",
            stats.frames,
            stats.peak,
            stats.peak_frame,
            stats.mean,
            EnvelopeStats::frames_above(&envelope, config.color_threshold)
        );

        let mapper = config.mapper();
        let frames = envelope.len() as i64;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (cone, body) = self.speaker_tracks(&mapper, &envelope);
        document.tracks.push(cone);
        document.tracks.push(body);
        progress.step("speaker");

        if config.curve {
            let (curve, points) = self.curve_track(&envelope);
            document.curve_points = points;
            document.tracks.push(curve);
            progress.step("amplitude curve");
        }

        let mut light = None;
        if config.lights {
            light = Some(
                Track::new(SPEAKER_LIGHT, TrackKind::PointLight)
                    .at(self.layout.speaker_position + self.layout.light_offset)
                    .with_static(Attribute::Intensity, LIGHT_INTENSITY)
                    .with_static(Attribute::DecayRate, LIGHT_DECAY_RATE),
            );
        }

        let mut particles = None;
        if config.particles_enabled() {
            particles = Some(self.particle_tracks(&mapper, &envelope));
        }

        let sequencer = ColorSequencer::new(config.color_threshold, config.smooth_color);
        if config.same_color_for_all_targets {
            let events: Vec<ColorEvent> = sequencer.events(&envelope, &mut rng).collect();
            if let Some(light) = light.as_mut() {
                apply_color_events(light, events.iter().copied(), LIGHT_COLOR);
            }
            if let Some((_, shader)) = particles.as_mut() {
                apply_color_events(shader, events.iter().copied(), SHADER_COLOR);
            }
        } else {
            if let Some(light) = light.as_mut() {
                apply_color_events(light, sequencer.events(&envelope, &mut rng), LIGHT_COLOR);
            }
            if let Some((_, shader)) = particles.as_mut() {
                apply_color_events(shader, sequencer.events(&envelope, &mut rng), SHADER_COLOR);
            }
        }

        if let Some(light) = light.as_ref() {
            document.tracks.push(light.clone());
            progress.step("speaker light");
        }
        if let Some((emitter, shader)) = particles {
            document.tracks.push(emitter);
            document.tracks.push(shader);
            progress.step("particles");
        }
        if config.same_color_for_all_targets {
            progress.step("shared colors");
        }

        if config.bars {
            let bars = self.bar_tracks(audio, frames, &document.source, progress)?;
            document.tracks.extend(bars);

            if let Some(light) = light {
                let mut bar_light = light;
                bar_light.name = BAR_LIGHT.to_string();
                bar_light.position = bar_light
                    .position
                    .map(|p| p + self.layout.bar_light_offset);
                document.tracks.push(bar_light);
            }
        }

        document.playback = Some(PlaybackRange { start: 1, end: frames });

        info!(
            "Rig generated: {} tracks, {} keys over {} frames",
            document.tracks.len(),
            document.total_keys(),
            frames
        );

        Ok(document)
    }

    /// Cone scales fully with the music; the body around it only bounces.
    fn speaker_tracks(&self, mapper: &ThresholdMapper, envelope: &Envelope) -> (Track, Track) {
        let mut cone = Track::new(SPEAKER_CONE, TrackKind::Mesh).at(self.layout.speaker_position);
        let mut body = Track::new(SPEAKER_BODY, TrackKind::Group);

        for signal in mapper.signals(envelope, PRIMARY_DAMPING) {
            cone.set_keyframe(
                Attribute::Scale,
                Keyframe::new(signal.frame as i64, signal.scale_factor),
            );
        }
        for signal in mapper.signals(envelope, BOUNCE_DAMPING) {
            body.set_keyframe(
                Attribute::Scale,
                Keyframe::new(signal.frame as i64, signal.scale_factor),
            );
        }

        (cone, body)
    }

    /// A curve tracing the envelope, scrolled through the speaker over the track.
    fn curve_track(&self, envelope: &Envelope) -> (Track, Vec<Vec3>) {
        let origin = self.layout.speaker_position;
        let points = envelope
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Vec3::new(
                    origin.x + i as f32,
                    origin.y + v * CURVE_HEIGHT_GAIN - CURVE_DROP,
                    origin.z,
                )
            })
            .collect();

        let frames = envelope.len() as i64;
        let mut curve = Track::new(AMPLITUDE_CURVE, TrackKind::Curve);
        curve.set_keyframe(
            Attribute::TranslateX,
            Keyframe::new(1, 0.0).with_tangents(Tangent::Auto, Tangent::Linear),
        );
        curve.set_keyframe(
            Attribute::TranslateX,
            Keyframe::new(frames, -(frames as f32)).with_tangents(Tangent::Linear, Tangent::Auto),
        );

        (curve, points)
    }

    fn particle_tracks(&self, mapper: &ThresholdMapper, envelope: &Envelope) -> (Track, Track) {
        let mut emitter =
            Track::new(PARTICLE_EMITTER, TrackKind::Emitter).at(self.layout.speaker_position);

        for signal in mapper.signals(envelope, PRIMARY_DAMPING) {
            let frame = signal.frame as i64;
            emitter.set_keyframe(Attribute::Speed, Keyframe::new(frame, signal.emit_speed));
            emitter.set_keyframe(Attribute::Rate, Keyframe::new(frame, signal.emit_rate));
        }

        (emitter, Track::new(PARTICLE_SHADER, TrackKind::Shader))
    }

    /// A grid of bars, each reading the audio directly with a per-row and
    /// per-column time offset so the grid ripples.
    fn bar_tracks<S: AudioSignal + ?Sized>(
        &self,
        audio: &S,
        frames: i64,
        source: &SourceInfo,
        progress: &mut dyn ProgressReporter,
    ) -> Result<Vec<Track>> {
        let layout = &self.layout;
        let mut bars = Vec::with_capacity(layout.bar_rows * layout.bar_columns);

        for row in 0..layout.bar_rows {
            for column in 0..layout.bar_columns {
                let local = Vec3::new(
                    column as f32 * layout.bar_spacing,
                    layout.bar_height / 2.0,
                    row as f32 * layout.bar_spacing,
                );
                let mut bar = Track::new(bar_name(row, column), TrackKind::Mesh)
                    .at(layout.bar_origin + local);

                bar.set_keyframe(Attribute::ScaleY, Keyframe::new(0, 0.0));

                let lag = column as i64;
                let row_offset = row as f64 / layout.bar_rows as f64;
                for frame in lag..frames {
                    let time = (frame - lag) as f64 + row_offset;
                    let raw = audio
                        .sample_amplitude(time)
                        .map_err(|e| RigError::unreadable(&source.path, e))?;
                    bar.set_keyframe(Attribute::ScaleY, Keyframe::new(frame, rectify(raw) * 2.0));
                }

                bars.push(bar);
                progress.step("bar");
            }
        }

        Ok(bars)
    }
}

/// Key color events onto a target whose color before the first change is
/// `initial`. Hold keys carry the target's own previous color, so one drawn
/// sequence can be shared by targets with different starting colors.
pub fn apply_color_events<T, I>(target: &mut T, events: I, initial: Color)
where
    T: AnimationTarget + ?Sized,
    I: IntoIterator<Item = ColorEvent>,
{
    let mut previous = initial;
    for mut event in events {
        match event.kind {
            ColorEventKind::Hold => event.color = previous,
            ColorEventKind::Transition => previous = event.color,
        }
        target.set_keyframe(Attribute::Color, Keyframe::from(event));
    }
}
