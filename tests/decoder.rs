use std::f32::consts::PI;
use std::path::Path;

use approx::assert_abs_diff_eq;
use hound::{SampleFormat, WavSpec, WavWriter};
use pronunciation_scorer::audio::decoder::{decode_audio, load_for_analysis};
use tempfile::tempdir;

fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: &[Vec<f32>]) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for frame in frames {
        for &sample in frame {
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .unwrap();
        }
    }
    writer.finalize().unwrap();
}

#[test]
fn mono_wav_decodes_with_metadata() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let frames: Vec<Vec<f32>> = (0..22_050)
        .map(|i| vec![0.5 * (2.0 * PI * 220.0 * i as f32 / 22_050.0).sin()])
        .collect();
    write_wav(&path, 1, 22_050, &frames);

    let decoded = decode_audio(&path).unwrap();
    let info = decoded.info();
    assert_eq!(info.sample_rate, 22_050);
    assert_eq!(info.channels, 1);
    assert_eq!(info.samples, 22_050);
    assert_abs_diff_eq!(info.duration, 1.0, epsilon = 1e-4);
    let peak = decoded
        .buffer
        .samples
        .iter()
        .fold(0.0_f32, |peak, sample| peak.max(sample.abs()));
    assert_abs_diff_eq!(peak, 0.5, epsilon = 0.01);
}

#[test]
fn stereo_is_mixed_down() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let frames: Vec<Vec<f32>> = (0..1_000).map(|_| vec![0.5, -0.1]).collect();
    write_wav(&path, 2, 16_000, &frames);

    let decoded = decode_audio(&path).unwrap();
    assert_eq!(decoded.channels, 2);
    assert_eq!(decoded.buffer.len(), 1_000);
    assert!(decoded
        .buffer
        .samples
        .iter()
        .all(|&sample| (sample - 0.2).abs() < 1e-3));
}

#[test]
fn analysis_loading_resamples_to_the_engine_rate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hi.wav");
    let frames: Vec<Vec<f32>> = (0..44_100).map(|_| vec![0.25]).collect();
    write_wav(&path, 1, 44_100, &frames);

    let buffer = load_for_analysis(&path, 22_050).unwrap();
    assert_eq!(buffer.sample_rate, 22_050);
    assert_abs_diff_eq!(buffer.duration_secs(), 1.0, epsilon = 1e-3);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(decode_audio(dir.path().join("absent.wav")).is_err());
}
