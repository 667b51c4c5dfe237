pub mod alignment;
pub mod cli;
pub mod engine;
pub mod features;
pub mod feedback;
pub mod metrics;
pub mod worker;

use ndarray::{Array1, Array2};
use serde::Serialize;
use thiserror::Error;

use crate::types::Level;

pub use engine::PronunciationEngine;

/// Convenient alias for results returned by pronunciation modules.
pub type Result<T> = std::result::Result<T, PronunciationError>;

/// Failures raised inside the scoring engine. None of them are transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PronunciationError {
    /// Empty, corrupt or non-finite audio, or mismatched sample rates.
    #[error("invalid audio: {0}")]
    InvalidAudio(String),
    /// A feature sequence could not be aligned (e.g. zero frames).
    #[error("alignment failed: {0}")]
    Alignment(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("scoring worker failed: {0}")]
    Worker(String),
}

/// Spectral and prosodic features of one buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSet {
    /// Cepstral matrix, coefficients x frames.
    pub mfcc: Array2<f32>,
    pub mfcc_mean: Array1<f32>,
    pub mfcc_std: Array1<f32>,
    /// Mean fundamental over voiced frames; 0 when nothing was voiced.
    pub pitch_mean: f32,
    pub pitch_std: f32,
    pub spectral_centroid_mean: f32,
    pub spectral_centroid_std: f32,
    pub zero_crossing_rate_mean: f32,
    pub rms_mean: f32,
    pub rms_std: f32,
    /// Seconds.
    pub duration: f32,
}

impl FeatureSet {
    pub fn frame_count(&self) -> usize {
        self.mfcc.ncols()
    }

    pub fn summary(&self) -> FeatureSummary {
        FeatureSummary {
            duration: self.duration,
            pitch_mean: self.pitch_mean,
            pitch_std: self.pitch_std,
            spectral_centroid_mean: self.spectral_centroid_mean,
            zero_crossing_rate_mean: self.zero_crossing_rate_mean,
            rms_mean: self.rms_mean,
            rms_std: self.rms_std,
            frame_count: self.frame_count(),
        }
    }
}

/// Scalar view of a [`FeatureSet`] for reports and telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub duration: f32,
    pub pitch_mean: f32,
    pub pitch_std: f32,
    pub spectral_centroid_mean: f32,
    pub zero_crossing_rate_mean: f32,
    pub rms_mean: f32,
    pub rms_std: f32,
    pub frame_count: usize,
}

/// How the final score was assembled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub distance: f32,
    pub base_score: f32,
    pub pitch_penalty: f32,
    pub duration_penalty: f32,
    pub volume_penalty: f32,
    /// Set when the learner recording was too quiet to score.
    pub silence_detected: bool,
    pub final_score: f32,
}

impl ScoreBreakdown {
    pub fn total_penalty(&self) -> f32 {
        self.pitch_penalty + self.duration_penalty + self.volume_penalty
    }
}

/// Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
    Fail,
}

impl Rating {
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::NeedsImprovement => "Needs Improvement",
            Rating::Fail => "Fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Pitch,
    Timing,
    Volume,
}

impl Aspect {
    pub fn label(&self) -> &'static str {
        match self {
            Aspect::Pitch => "Pitch",
            Aspect::Timing => "Timing",
            Aspect::Volume => "Volume",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectFeedback {
    pub aspect: Aspect,
    pub comment: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub rating: Rating,
    pub overall: String,
    pub details: Vec<AspectFeedback>,
    pub tip: String,
}

/// Everything a caller needs from one learner/reference comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub level: Level,
    pub score: ScoreBreakdown,
    pub feedback: Feedback,
    pub user: FeatureSummary,
    pub reference: FeatureSummary,
}

impl Comparison {
    pub fn final_score(&self) -> f32 {
        self.score.final_score
    }
}

/// `|user - reference| / reference * 100`, or 0 when the reference is 0.
pub fn percent_deviation(user: f32, reference: f32) -> f32 {
    if reference == 0.0 {
        return 0.0;
    }
    (user - reference).abs() / reference.abs() * 100.0
}

#[cfg(test)]
mod tests {
    use super::{percent_deviation, Rating};

    #[test]
    fn percent_deviation_is_relative_to_reference() {
        assert!((percent_deviation(3.0, 1.5) - 100.0).abs() < 1e-4);
        assert!((percent_deviation(75.0, 150.0) - 50.0).abs() < 1e-4);
        assert_eq!(percent_deviation(5.0, 0.0), 0.0);
    }

    #[test]
    fn ratings_order_best_first() {
        assert!(Rating::Excellent < Rating::Good);
        assert!(Rating::NeedsImprovement < Rating::Fail);
    }
}
