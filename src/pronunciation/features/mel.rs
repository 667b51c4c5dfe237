use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::Array2;

use crate::config::ExtractionConfig;

const MEL_FLOOR: f64 = 1e-10;

/// Per-frame spectra; the outer index is the frame.
pub(crate) struct SpectrogramBundle {
    pub magnitude: Vec<Vec<f64>>,
    pub power: Vec<Vec<f64>>,
    pub mel: Vec<Vec<f64>>,
    /// Centre frequency of every spectrum bin.
    pub freqs: Vec<f64>,
}

pub(crate) fn compute_spectrograms(
    samples: &[f32],
    config: &ExtractionConfig,
) -> SpectrogramBundle {
    let mut audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    if audio.len() < config.frame_size {
        audio.resize(config.frame_size, 0.0);
    }

    let stft = spectrum::rstft(&audio, config.frame_size, config.hop_size, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(config.frame_size, config.sample_rate);
    let mel_max = config
        .mel_max_hz
        .unwrap_or(config.sample_rate as f64 / 2.0);
    let filterbank = MelFilterbank::new(config.mel_min_hz, mel_max, config.mel_bands, &freqs, true);
    let mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);

    SpectrogramBundle {
        magnitude,
        power,
        mel,
        freqs,
    }
}

/// Cepstral coefficients of every frame, laid out coefficients x frames.
///
/// Mel energies are floored before the log so silent frames stay finite.
pub(crate) fn cepstral_matrix(mel: &[Vec<f64>], coefficients: usize) -> Array2<f32> {
    if mel.first().map_or(true, Vec::is_empty) {
        return Array2::zeros((coefficients, 0));
    }
    let floored: Vec<Vec<f64>> = mel
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&energy| {
                    let energy = if energy.is_finite() { energy.max(0.0) } else { 0.0 };
                    energy + MEL_FLOOR
                })
                .collect()
        })
        .collect();
    let mfcc = analysis::mel::mfcc_spectrogram(&floored, coefficients, None);
    Array2::from_shape_fn((coefficients, mfcc.len()), |(k, frame)| {
        mfcc[frame].get(k).copied().unwrap_or(0.0) as f32
    })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{E, PI};

    use super::cepstral_matrix;

    #[test]
    fn flat_spectrum_only_excites_first_coefficient() {
        let mel = vec![vec![E; 40]; 3];
        let mfcc = cepstral_matrix(&mel, 13);
        assert_eq!(mfcc.dim(), (13, 3));
        for frame in 0..3 {
            let scale = mfcc[[0, frame]].abs().max(1.0);
            for k in 1..13 {
                assert!(mfcc[[k, frame]].abs() < 1e-4 * scale, "c{k} = {}", mfcc[[k, frame]]);
            }
        }
    }

    #[test]
    fn cosine_log_spectrum_lands_in_its_own_coefficient() {
        let bands = 40;
        for target in [1_usize, 3, 7] {
            let frame: Vec<f64> = (0..bands)
                .map(|b| (PI * target as f64 * (b as f64 + 0.5) / bands as f64).cos().exp())
                .collect();
            let mfcc = cepstral_matrix(&[frame], 13);
            let own = mfcc[[target, 0]].abs();
            assert!(own > 0.1, "c{target} = {own}");
            for k in (0..13).filter(|&k| k != target) {
                assert!(
                    mfcc[[k, 0]].abs() < 1e-3 * own,
                    "basis {target} leaked into c{k}: {}",
                    mfcc[[k, 0]]
                );
            }
        }
    }

    #[test]
    fn silent_frames_stay_finite() {
        let mel = vec![vec![0.0; 40]; 2];
        let mfcc = cepstral_matrix(&mel, 13);
        assert!(mfcc.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_input_has_no_frames() {
        let mfcc = cepstral_matrix(&[], 13);
        assert_eq!(mfcc.dim(), (13, 0));
    }
}
