mod mel;
mod pitch;
mod statistics;

use ndarray::Axis;
use tracing::debug;

use mel::{cepstral_matrix, compute_spectrograms};
use statistics::{frame_statistics, mean_std, spectral_centroids};

use crate::audio::resample;
use crate::config::ExtractionConfig;
use crate::pronunciation::{FeatureSet, PronunciationError, Result};
use crate::types::AudioBuffer;

/// Turns a decoded buffer into a [`FeatureSet`].
///
/// Extraction is a pure function of the buffer and the configuration:
/// the same input always yields the same features.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractionConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn extract(&self, buffer: &AudioBuffer) -> Result<FeatureSet> {
        validate_buffer(buffer)?;
        let analysed = resample::to_rate(buffer, self.config.sample_rate)
            .map_err(|err| PronunciationError::InvalidAudio(err.to_string()))?;
        let samples = &analysed.samples[..];

        let spectrograms = compute_spectrograms(samples, &self.config);
        if spectrograms.mel.is_empty() {
            return Err(PronunciationError::InvalidAudio(
                "buffer produced no analysis frames".to_string(),
            ));
        }

        let mfcc = cepstral_matrix(&spectrograms.mel, self.config.coefficient_count);
        let mfcc_mean = mfcc.mean_axis(Axis(1)).ok_or_else(|| {
            PronunciationError::InvalidAudio("cepstral matrix has no frames".to_string())
        })?;
        let mfcc_std = mfcc.std_axis(Axis(1), 0.0);

        let pitches =
            pitch::track_pitch(&spectrograms.magnitude, &spectrograms.freqs, &self.config);
        let (pitch_mean, pitch_std) = mean_std(&pitches);

        let centroids = spectral_centroids(&spectrograms.power, &spectrograms.freqs);
        let (spectral_centroid_mean, spectral_centroid_std) = mean_std(&centroids);

        let frames = frame_statistics(samples, self.config.frame_size, self.config.hop_size);
        let (zero_crossing_rate_mean, _) = mean_std(&frames.zero_crossing_rate);
        let (rms_mean, rms_std) = mean_std(&frames.rms);

        debug!(
            frames = mfcc.ncols(),
            voiced_frames = pitches.len(),
            pitch_mean,
            rms_mean,
            duration = buffer.duration_secs(),
            "extracted features"
        );

        Ok(FeatureSet {
            mfcc,
            mfcc_mean,
            mfcc_std,
            pitch_mean,
            pitch_std,
            spectral_centroid_mean,
            spectral_centroid_std,
            zero_crossing_rate_mean,
            rms_mean,
            rms_std,
            duration: buffer.duration_secs(),
        })
    }
}

fn validate_buffer(buffer: &AudioBuffer) -> Result<()> {
    if buffer.sample_rate == 0 {
        return Err(PronunciationError::InvalidAudio(
            "sample rate must be positive".to_string(),
        ));
    }
    if buffer.is_empty() {
        return Err(PronunciationError::InvalidAudio(
            "audio buffer is empty".to_string(),
        ));
    }
    if let Some(index) = buffer.samples.iter().position(|s| !s.is_finite()) {
        return Err(PronunciationError::InvalidAudio(format!(
            "non-finite sample at index {index}"
        )));
    }
    Ok(())
}
