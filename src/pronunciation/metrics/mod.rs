use tracing::{debug, info};

use crate::config::{CalibrationPoint, PenaltyRule, ScoringConfig};
use crate::pronunciation::{percent_deviation, FeatureSet, ScoreBreakdown};

const MAX_SCORE: f32 = 100.0;

/// Maps an alignment distance and feature deviations onto a 0-100 score.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(
        &self,
        distance: f32,
        user: &FeatureSet,
        reference: &FeatureSet,
    ) -> ScoreBreakdown {
        let base_score = self.base_score(distance);
        let pitch_penalty = penalty(
            &self.config.pitch_penalty,
            percent_deviation(user.pitch_mean, reference.pitch_mean),
        );
        let duration_penalty = penalty(
            &self.config.duration_penalty,
            percent_deviation(user.duration, reference.duration),
        );
        let volume_penalty = penalty(
            &self.config.volume_penalty,
            percent_deviation(user.rms_mean, reference.rms_mean),
        );

        let silence_detected = user.rms_mean < self.config.silence_threshold;
        let final_score = if silence_detected {
            info!(
                rms_mean = user.rms_mean,
                threshold = self.config.silence_threshold,
                "learner recording is near-silent; forcing score to zero"
            );
            0.0
        } else {
            (base_score - pitch_penalty - duration_penalty - volume_penalty).clamp(0.0, MAX_SCORE)
        };

        debug!(
            distance,
            base_score,
            pitch_penalty,
            duration_penalty,
            volume_penalty,
            final_score,
            "scored comparison"
        );

        ScoreBreakdown {
            distance,
            base_score,
            pitch_penalty,
            duration_penalty,
            volume_penalty,
            silence_detected,
            final_score,
        }
    }

    /// Piecewise-linear interpolation through the calibration table.
    pub fn base_score(&self, distance: f32) -> f32 {
        interpolate(&self.config.calibration, distance.max(0.0)).clamp(0.0, MAX_SCORE)
    }
}

fn interpolate(table: &[CalibrationPoint], distance: f32) -> f32 {
    let (Some(first), Some(last)) = (table.first(), table.last()) else {
        return 0.0;
    };
    if distance <= first.distance {
        return first.score;
    }
    if distance >= last.distance {
        return last.score;
    }
    table
        .windows(2)
        .find(|pair| distance <= pair[1].distance)
        .map(|pair| {
            let (lower, upper) = (pair[0], pair[1]);
            let t = (distance - lower.distance) / (upper.distance - lower.distance);
            lower.score + (upper.score - lower.score) * t
        })
        .unwrap_or(last.score)
}

fn penalty(rule: &PenaltyRule, deviation_percent: f32) -> f32 {
    (deviation_percent / rule.scale).min(rule.cap)
}
