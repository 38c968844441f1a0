use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use speaker_rig::audio::SamplingMode;
use speaker_rig::rig::{LogProgress, RigGenerator};
use speaker_rig::RigConfig;

#[derive(Parser)]
#[command(name = "speaker-rig")]
#[command(about = "Generate speaker rig keyframes from the amplitude of an audio track")]
struct Args {
    /// Audio file to drive the rig (.wav)
    #[arg()]
    input_file: Option<PathBuf>,

    /// Output file for the rig document (JSON)
    #[arg(short, long, default_value = "speaker_rig.json")]
    output: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Add an amplitude curve scrolling through the speaker (--curve=false to drop it)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    curve: Option<bool>,

    /// Key the speaker light
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    lights: Option<bool>,

    /// Add the 10x10 bar-graph grid
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    bars: Option<bool>,

    /// Share one color sequence between the light and the particles
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    same_colors: Option<bool>,

    /// Blend into each new color; --smooth-colors=false snaps instead
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    smooth_colors: Option<bool>,

    /// Particle emission strength, 0 disables particles [0-15]
    #[arg(long)]
    particle_strength: Option<f32>,

    /// Minimum envelope value that emits particles [0-1]
    #[arg(long)]
    emit_threshold: Option<f32>,

    /// Envelope value above which a new color starts [0-1]
    #[arg(long)]
    color_threshold: Option<f32>,

    /// Animation frames per second
    #[arg(long)]
    fps: Option<f32>,

    /// Samples averaged per frame
    #[arg(long)]
    samples_per_frame: Option<usize>,

    /// Sampling inside a frame: 'spread' or 'repeated'
    #[arg(long)]
    sampling: Option<String>,

    /// Seed for color draws
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<(RigConfig, PathBuf)> {
        let mut config = match &self.config {
            Some(path) => RigConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RigConfig::default(),
        };

        if let Some(path) = self.input_file {
            config.audio_path = Some(path);
        }
        if let Some(v) = self.curve {
            config.curve = v;
        }
        if let Some(v) = self.lights {
            config.lights = v;
        }
        if let Some(v) = self.bars {
            config.bars = v;
        }
        if let Some(v) = self.same_colors {
            config.same_color_for_all_targets = v;
        }
        if let Some(v) = self.smooth_colors {
            config.smooth_color = v;
        }
        if let Some(v) = self.particle_strength {
            config.particle_strength = v;
        }
        if let Some(v) = self.emit_threshold {
            config.emit_threshold = v;
        }
        if let Some(v) = self.color_threshold {
            config.color_threshold = v;
        }
        if let Some(v) = self.fps {
            config.fps = v;
        }
        if let Some(v) = self.samples_per_frame {
            config.samples_per_frame = v;
        }
        if let Some(mode) = self.sampling.as_deref() {
            config.sampling = parse_sampling(mode)?;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        Ok((config, self.output))
    }
}

fn parse_sampling(mode: &str) -> Result<SamplingMode> {
    match mode.to_lowercase().as_str() {
        "spread" => Ok(SamplingMode::Spread),
        "repeated" => Ok(SamplingMode::Repeated),
        other => anyhow::bail!("Unknown sampling mode '{}' (expected 'spread' or 'repeated')", other),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let (config, output) = Args::parse().into_config()?;

    info!("Speaker Rig Generator");
    if let Some(path) = &config.audio_path {
        info!("Input file: {}", path.display());
    }
    info!("Output file: {}", output.display());
    info!(
        "Components: curve={} lights={} bars={} particles={}",
        config.curve,
        config.lights,
        config.bars,
        config.particles_enabled()
    );
    info!(
        "Particle strength: {}, emit threshold: {}, color threshold: {}",
        config.particle_strength, config.emit_threshold, config.color_threshold
    );

    let mut progress = LogProgress::default();
    let document = RigGenerator::new(&config).generate_from_config(&mut progress)?;

    info!("\n=== RIG ===");
    info!("Source: {} ({:.2}s)", document.source.name, document.source.duration_seconds);
    info!("Frames: {}", document.envelope.frames);
    info!("Peak envelope: {:.4} at frame {}", document.envelope.peak, document.envelope.peak_frame);
    match document.playback {
        Some(range) => info!("Playback range: {} - {}", range.start, range.end),
        None => info!("Playback range: none (no frames)"),
    }
    for track in &document.tracks {
        log::debug!("{}: {:?}, {} keys", track.name, track.kind, track.key_count());
    }
    info!("Tracks: {}, keys: {}", document.tracks.len(), document.total_keys());

    document
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    let file_size = std::fs::metadata(&output)?.len();
    info!("Rig document saved ({:.1} KB)", file_size as f64 / 1024.0);

    Ok(())
}
