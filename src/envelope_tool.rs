use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

use speaker_rig::audio::source::DEFAULT_FPS;
use speaker_rig::audio::{
    AudioSignal, DecodedAudio, Envelope, EnvelopeExtractor, EnvelopeStats, SamplingMode,
    SourceInfo,
};
use speaker_rig::mapping::{ControlSignal, PRIMARY_DAMPING};
use speaker_rig::RigConfig;

#[derive(Parser)]
#[command(name = "envelope-tool")]
#[command(about = "Extract the per-frame amplitude envelope of an audio file")]
struct Args {
    /// Audio file to analyze (.wav)
    #[arg()]
    input_file: PathBuf,

    /// Output file for the envelope report (JSON)
    #[arg(short, long, default_value = "envelope.json")]
    output: PathBuf,

    /// Animation frames per second
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: f32,

    /// Samples averaged per frame
    #[arg(long, default_value = "10")]
    samples_per_frame: usize,

    /// Read every sample at the frame end instead of spreading them over the frame
    #[arg(long)]
    repeated: bool,

    /// Also write per-frame control signals using these mapper settings
    #[arg(long)]
    controls: bool,

    #[arg(long, default_value = "7")]
    particle_strength: f32,

    #[arg(long, default_value = "0.4")]
    emit_threshold: f32,

    #[arg(long, default_value = "0.2")]
    color_threshold: f32,
}

#[derive(Serialize)]
struct EnvelopeReport {
    source: SourceInfo,
    sampling: SamplingMode,
    samples_per_frame: usize,
    statistics: EnvelopeStats,
    envelope: Envelope,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    controls: Vec<ControlSignal>,
}

impl Args {
    /// Extraction and mapping settings, checked with the same ranges as a rig.
    fn settings(&self) -> RigConfig {
        RigConfig {
            fps: self.fps,
            samples_per_frame: self.samples_per_frame,
            sampling: if self.repeated {
                SamplingMode::Repeated
            } else {
                SamplingMode::Spread
            },
            particle_strength: self.particle_strength,
            emit_threshold: self.emit_threshold,
            color_threshold: self.color_threshold,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Envelope Tool");
    info!("Input file: {}", args.input_file.display());
    info!("Output file: {}", args.output.display());

    let settings = args.settings();
    settings.validate()?;

    let audio = DecodedAudio::open(&args.input_file, args.fps)?;
    let extractor = EnvelopeExtractor::new(settings.samples_per_frame, settings.sampling);
    let envelope = extractor
        .extract_all(&audio)
        .with_context(|| format!("No audio available in {}", args.input_file.display()))?;

    let statistics = envelope.stats();
    if audio.duration_frames() == 0 {
        warn!("Audio is shorter than one frame at {} fps", args.fps);
    }

    let mapper = settings.mapper();
    let controls: Vec<ControlSignal> = if args.controls {
        mapper.signals(&envelope, PRIMARY_DAMPING).collect()
    } else {
        Vec::new()
    };

    info!("\n=== ENVELOPE ===");
    info!("Duration: {:.2} seconds", audio.duration_seconds());
    info!("Frames: {}", statistics.frames);
    info!("Peak: {:.6} at frame {}", statistics.peak, statistics.peak_frame);
    info!("Mean: {:.6}", statistics.mean);
    info!("Silent frames: {}", statistics.silent_frames);
    info!(
        "Frames emitting particles: {}",
        envelope.iter().filter(|&v| mapper.emission(v).0 > 0.0).count()
    );
    info!(
        "Color changes: {}",
        EnvelopeStats::frames_above(&envelope, args.color_threshold)
    );

    let report = EnvelopeReport {
        source: audio.info(),
        sampling: settings.sampling,
        samples_per_frame: extractor.samples_per_frame(),
        statistics,
        envelope,
        controls,
    };

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    let file_size = std::fs::metadata(&args.output)?.len();
    info!("Envelope report saved ({:.1} KB)", file_size as f64 / 1024.0);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use speaker_rig::RigError;

    fn settings_for(args: &[&str]) -> RigConfig {
        Args::try_parse_from(["envelope-tool", "in.wav"].iter().chain(args).copied())
            .unwrap()
            .settings()
    }

    #[test]
    fn test_defaults_validate() {
        let settings = settings_for(&[]);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.sampling, SamplingMode::Spread);
    }

    #[test]
    fn test_out_of_range_arguments_rejected() {
        for args in [
            &["--samples-per-frame", "0"][..],
            &["--fps", "0"],
            &["--emit-threshold", "1.5"],
            &["--color-threshold", "1.2"],
            &["--particle-strength", "20"],
        ] {
            assert!(
                matches!(
                    settings_for(args).validate(),
                    Err(RigError::InvalidParameter { .. })
                ),
                "{args:?} should be rejected"
            );
        }
    }
}
