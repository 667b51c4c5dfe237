//! Engine configuration.
//!
//! Every calibration constant the engine uses lives here so it can be
//! overridden from a JSON file. The defaults assume 22.05 kHz speech analysed
//! with 512-sample frames and need re-tuning for other analysis settings.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pronunciation::PronunciationError;
use crate::types::Level;

/// Cepstral analysis always keeps this many coefficients.
pub const MFCC_COUNT: usize = 13;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub extraction: ExtractionConfig,
    pub alignment: AlignmentConfig,
    pub scoring: ScoringConfig,
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Analysis rate; buffers at any other rate are resampled first.
    pub sample_rate: u32,
    pub frame_size: usize,
    pub hop_size: usize,
    pub mel_bands: usize,
    pub coefficient_count: usize,
    pub mel_min_hz: f64,
    /// Upper edge of the filterbank; `None` means Nyquist.
    pub mel_max_hz: Option<f64>,
    pub pitch_min_hz: f64,
    pub pitch_max_hz: f64,
    /// Peaks below this fraction of the frame maximum are not pitch candidates.
    pub pitch_threshold: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            frame_size: 512,
            hop_size: 256,
            mel_bands: 40,
            coefficient_count: MFCC_COUNT,
            mel_min_hz: 20.0,
            mel_max_hz: None,
            pitch_min_hz: 150.0,
            pitch_max_hz: 4_000.0,
            pitch_threshold: 0.1,
        }
    }
}

/// Time-warp search settings.
///
/// With `radius: Some(r)` the aligner coarsens both sequences by halves,
/// aligns the coarse pair and only refines inside `r` cells of the projected
/// path. The result is never below the exact distance. `None` runs the
/// exact quadratic alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub radius: Option<usize>,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self { radius: Some(1) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub distance: f32,
    pub score: f32,
}

impl CalibrationPoint {
    pub const fn new(distance: f32, score: f32) -> Self {
        Self { distance, score }
    }
}

/// `penalty = min(percent_deviation / scale, cap)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRule {
    pub scale: f32,
    pub cap: f32,
}

impl PenaltyRule {
    pub const fn new(scale: f32, cap: f32) -> Self {
        Self { scale, cap }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Distance breakpoints must increase strictly; scores must not increase.
    pub calibration: Vec<CalibrationPoint>,
    pub pitch_penalty: PenaltyRule,
    pub duration_penalty: PenaltyRule,
    pub volume_penalty: PenaltyRule,
    /// Learner mean RMS below this forces a zero score.
    pub silence_threshold: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            calibration: vec![
                CalibrationPoint::new(0.0, 100.0),
                CalibrationPoint::new(250.0, 90.0),
                CalibrationPoint::new(600.0, 75.0),
                CalibrationPoint::new(1_200.0, 55.0),
                CalibrationPoint::new(2_400.0, 30.0),
                CalibrationPoint::new(4_800.0, 0.0),
            ],
            pitch_penalty: PenaltyRule::new(2.0, 30.0),
            duration_penalty: PenaltyRule::new(5.0, 20.0),
            volume_penalty: PenaltyRule::new(5.0, 20.0),
            silence_threshold: 0.001,
        }
    }
}

/// Minimum scores for each rating band; anything below `pass` fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingThresholds {
    pub excellent: f32,
    pub good: f32,
    pub fair: f32,
    pub pass: f32,
}

impl RatingThresholds {
    pub const fn new(excellent: f32, good: f32, fair: f32, pass: f32) -> Self {
        Self {
            excellent,
            good,
            fair,
            pass,
        }
    }
}

/// Aspect scores are capped at `cap` while the overall score is below `below`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectCap {
    pub below: f32,
    pub cap: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub beginner: RatingThresholds,
    pub intermediate: RatingThresholds,
    pub advanced: RatingThresholds,
    pub aspect_caps: Vec<AspectCap>,
    /// Aspect scores at or above this get the positive comment.
    pub good_aspect: f32,
    /// Aspect scores at or above this (and below `good_aspect`) get the mild comment.
    pub borderline_aspect: f32,
}

impl FeedbackConfig {
    pub fn thresholds(&self, level: Level) -> &RatingThresholds {
        match level {
            Level::Beginner => &self.beginner,
            Level::Intermediate => &self.intermediate,
            Level::Advanced => &self.advanced,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            beginner: RatingThresholds::new(75.0, 60.0, 45.0, 25.0),
            intermediate: RatingThresholds::new(85.0, 70.0, 55.0, 30.0),
            advanced: RatingThresholds::new(90.0, 80.0, 65.0, 35.0),
            aspect_caps: vec![
                AspectCap {
                    below: 30.0,
                    cap: 29.0,
                },
                AspectCap {
                    below: 50.0,
                    cap: 49.0,
                },
            ],
            good_aspect: 80.0,
            borderline_aspect: 60.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> crate::pronunciation::Result<()> {
        self.extraction.validate()?;
        self.alignment.validate()?;
        self.scoring.validate()?;
        self.feedback.validate()
    }
}

impl ExtractionConfig {
    fn validate(&self) -> crate::pronunciation::Result<()> {
        ensure(self.sample_rate > 0, "sample_rate must be positive")?;
        ensure(self.frame_size >= 4, "frame_size must be at least 4 samples")?;
        ensure(
            self.hop_size > 0 && self.hop_size <= self.frame_size,
            "hop_size must be positive and no larger than frame_size",
        )?;
        ensure(
            self.coefficient_count == MFCC_COUNT,
            format!("coefficient_count must be {MFCC_COUNT}"),
        )?;
        ensure(
            self.mel_bands >= self.coefficient_count,
            "mel_bands must be at least coefficient_count",
        )?;
        let nyquist = self.sample_rate as f64 / 2.0;
        let mel_max = self.mel_max_hz.unwrap_or(nyquist);
        ensure(
            self.mel_min_hz >= 0.0 && mel_max > self.mel_min_hz && mel_max <= nyquist,
            "mel range must be increasing and within Nyquist",
        )?;
        ensure(
            self.pitch_min_hz > 0.0 && self.pitch_max_hz > self.pitch_min_hz,
            "pitch range must be positive and increasing",
        )?;
        ensure(
            (0.0..1.0).contains(&self.pitch_threshold),
            "pitch_threshold must lie in [0, 1)",
        )
    }
}

impl AlignmentConfig {
    fn validate(&self) -> crate::pronunciation::Result<()> {
        ensure(
            self.radius != Some(0),
            "alignment radius must be at least 1 (use null for exact alignment)",
        )
    }
}

impl ScoringConfig {
    fn validate(&self) -> crate::pronunciation::Result<()> {
        ensure(
            !self.calibration.is_empty(),
            "calibration table must not be empty",
        )?;
        for point in &self.calibration {
            ensure(
                point.distance.is_finite() && point.distance >= 0.0,
                "calibration distances must be finite and non-negative",
            )?;
            ensure(
                (0.0..=100.0).contains(&point.score),
                "calibration scores must lie in [0, 100]",
            )?;
        }
        for pair in self.calibration.windows(2) {
            ensure(
                pair[1].distance > pair[0].distance,
                "calibration distances must increase strictly",
            )?;
            ensure(
                pair[1].score <= pair[0].score,
                "calibration scores must not increase with distance",
            )?;
        }
        for (label, rule) in [
            ("pitch", &self.pitch_penalty),
            ("duration", &self.duration_penalty),
            ("volume", &self.volume_penalty),
        ] {
            ensure(
                rule.scale > 0.0 && rule.cap >= 0.0,
                format!("{label} penalty needs a positive scale and non-negative cap"),
            )?;
        }
        ensure(
            self.silence_threshold >= 0.0,
            "silence_threshold must be non-negative",
        )
    }
}

impl FeedbackConfig {
    fn validate(&self) -> crate::pronunciation::Result<()> {
        for level in Level::ALL {
            let t = self.thresholds(level);
            ensure(
                t.excellent >= t.good && t.good >= t.fair && t.fair >= t.pass,
                format!("rating thresholds for {level} must be ordered"),
            )?;
        }
        ensure(
            self.good_aspect >= self.borderline_aspect,
            "good_aspect must not be below borderline_aspect",
        )
    }
}

fn ensure(condition: bool, message: impl Into<String>) -> crate::pronunciation::Result<()> {
    if condition {
        Ok(())
    } else {
        Err(PronunciationError::InvalidConfig(message.into()))
    }
}

/// Loads an engine configuration from a JSON file, or the defaults when no
/// path is given. Missing fields take their default values.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read engine config {:?}", path))?;
            serde_json::from_str::<EngineConfig>(&raw)
                .with_context(|| format!("failed to parse engine config {:?}", path))?
        }
        None => EngineConfig::default(),
    };
    config.validate().context("engine config validation failed")?;
    Ok(config)
}
