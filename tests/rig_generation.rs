use approx::assert_relative_eq;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use speaker_rig::audio::{AudioSignal, DecodedAudio, EnvelopeExtractor, SamplingMode};
use speaker_rig::mapping::{ColorSequencer, ThresholdMapper, PRIMARY_DAMPING};
use speaker_rig::rig::generator::{bar_name, PARTICLE_EMITTER, SPEAKER_CONE, SPEAKER_LIGHT};
use speaker_rig::rig::{Attribute, NoProgress, RigDocument, RigGenerator};
use speaker_rig::{RigConfig, RigError};

const SAMPLE_RATE: u32 = 4800;
const FPS: f32 = 24.0;

/// Write a 16-bit WAV where each frame is either a full-scale tone or silence.
fn write_pattern_wav(path: &Path, loud_frames: &[bool], channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let per_frame = (SAMPLE_RATE as f32 / FPS) as usize;

    for &loud in loud_frames {
        for n in 0..per_frame {
            // square wave keeps |sample| constant within loud frames
            let value = if loud {
                if (n / 10) % 2 == 0 { i16::MAX } else { -i16::MAX }
            } else {
                0
            };
            for _ in 0..channels {
                writer.write_sample(value).unwrap();
            }
        }
    }
    writer.finalize().unwrap();
}

fn config_for(path: PathBuf) -> RigConfig {
    RigConfig {
        audio_path: Some(path),
        fps: FPS,
        seed: Some(1),
        ..Default::default()
    }
}

#[test]
fn test_wav_duration_in_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pattern.wav");
    write_pattern_wav(&path, &[true; 48], 2);

    let audio = DecodedAudio::open(&path, FPS).unwrap();
    assert_eq!(audio.duration_frames(), 48);
    assert_relative_eq!(audio.duration_seconds(), 2.0, max_relative = 1e-6);
    assert_eq!(audio.info().name, "pattern");
    assert_eq!(audio.info().channels, 2);
}

#[test]
fn test_envelope_follows_loud_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("steps.wav");
    // the extractor reads inside (i, i + 1], so frame i mostly hears audio frame i
    let pattern = [false, true, true, false, true, false, false, true];
    write_pattern_wav(&path, &pattern, 1);

    let audio = DecodedAudio::open(&path, FPS).unwrap();
    let envelope = EnvelopeExtractor::default().extract_all(&audio).unwrap();
    assert_eq!(envelope.len(), pattern.len());

    for (frame, &loud) in pattern.iter().enumerate().take(pattern.len() - 1) {
        let v = envelope.get(frame).unwrap();
        if loud {
            assert!(v > 0.5, "frame {frame} should be loud, got {v}");
        } else {
            assert!(v < 0.25, "frame {frame} should be quiet, got {v}");
        }
    }
}

#[test]
fn test_repeated_sampling_matches_single_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sine.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for n in 0..SAMPLE_RATE {
        writer
            .write_sample((2.0 * PI * 3.0 * n as f32 / SAMPLE_RATE as f32).sin() * 0.8)
            .unwrap();
    }
    writer.finalize().unwrap();

    let audio = DecodedAudio::open(&path, FPS).unwrap();
    let envelope = EnvelopeExtractor::new(10, SamplingMode::Repeated)
        .extract_all(&audio)
        .unwrap();

    for (frame, v) in envelope.iter().enumerate() {
        let raw = audio.sample_amplitude(frame as f64 + 1.0).unwrap();
        assert_relative_eq!(v, 1.5 * (0.5 - raw).abs(), max_relative = 1e-4, epsilon = 1e-6);
    }
}

#[test]
fn test_generate_and_round_trip_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.wav");
    let pattern: Vec<bool> = (0..24).map(|i| i % 3 == 0).collect();
    write_pattern_wav(&path, &pattern, 1);

    let config = RigConfig {
        bars: true,
        curve: true,
        ..config_for(path)
    };
    let document = RigGenerator::new(&config)
        .generate_from_config(&mut NoProgress)
        .unwrap();

    assert_eq!(document.source.name, "song");
    assert_eq!(document.envelope.frames, 24);
    assert_eq!(document.curve_points.len(), 24);
    assert_eq!(
        document.track(SPEAKER_CONE).unwrap().keys(Attribute::Scale).len(),
        24
    );
    assert!(document.track(&bar_name(9, 9)).is_some());
    let playback = document.playback.unwrap();
    assert_eq!((playback.start, playback.end), (1, 24));

    let out = dir.path().join("rig.json");
    document.save(&out).unwrap();
    let loaded = RigDocument::load(&out).unwrap();
    assert_eq!(loaded.tracks.len(), document.tracks.len());
    assert_eq!(loaded.total_keys(), document.total_keys());
    assert_eq!(loaded.config, document.config);
}

#[test]
fn test_emission_matches_mapper() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("emit.wav");
    write_pattern_wav(&path, &[true, false, true, true, false, false], 1);

    let config = config_for(path.clone());
    let document = RigGenerator::new(&config)
        .generate_from_config(&mut NoProgress)
        .unwrap();

    let audio = DecodedAudio::open(&path, FPS).unwrap();
    let envelope = EnvelopeExtractor::default().extract_all(&audio).unwrap();
    let emitter = document.track(PARTICLE_EMITTER).unwrap();

    for signal in config.mapper().signals(&envelope, PRIMARY_DAMPING) {
        let frame = signal.frame as i64;
        assert_eq!(emitter.scalar_at(Attribute::Rate, frame), Some(signal.emit_rate));
        assert_eq!(emitter.scalar_at(Attribute::Speed, frame), Some(signal.emit_speed));
    }
}

#[test]
fn test_stepped_colors_double_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colors.wav");
    // isolated loud frames so hold keys never land on a transition key
    write_pattern_wav(&path, &[false, true, false, false, true, false, false], 1);

    let smooth = config_for(path.clone());
    let stepped = RigConfig {
        smooth_color: false,
        ..config_for(path)
    };

    let count = |config: &RigConfig| {
        RigGenerator::new(config)
            .generate_from_config(&mut NoProgress)
            .unwrap()
            .track(SPEAKER_LIGHT)
            .unwrap()
            .keys(Attribute::Color)
            .len()
    };

    let smooth_keys = count(&smooth);
    assert!(smooth_keys > 0);
    assert_eq!(count(&stepped), 2 * smooth_keys);
}

#[test]
fn test_missing_file_is_source_not_found() {
    let config = config_for(PathBuf::from("/no/such/dir/track.wav"));
    let err = RigGenerator::new(&config)
        .generate_from_config(&mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, RigError::SourceNotFound(_)));
    assert!(err.is_missing_audio());
}

#[test]
fn test_corrupt_file_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"RIFF but not really").unwrap();

    let err = RigGenerator::new(&config_for(path))
        .generate_from_config(&mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, RigError::SourceUnreadable { .. }));
    assert!(err.is_missing_audio());
}

#[test]
fn test_nan_sample_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nan.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 240,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for n in 0..240 {
        let value = if n == 15 { f32::NAN } else { 0.25 };
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();

    let err = RigGenerator::new(&config_for(path))
        .generate_from_config(&mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, RigError::SourceUnreadable { .. }));
}

#[test]
fn test_no_path_is_no_configuration() {
    let err = RigGenerator::new(&RigConfig::default())
        .generate_from_config(&mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, RigError::NoConfigurationProvided));
}

#[test]
fn test_sequencer_scenario_from_public_api() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use speaker_rig::audio::Envelope;

    let envelope = Envelope::from_values(vec![0.0, 0.3]);
    let events: Vec<_> = ColorSequencer::new(0.2, true)
        .events(&envelope, StdRng::seed_from_u64(9))
        .collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].frame, 1);

    let mapper = ThresholdMapper::new(7.0, 0.4, 0.2);
    assert_eq!(mapper.signals(&Envelope::default(), PRIMARY_DAMPING).count(), 0);
}
