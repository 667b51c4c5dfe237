//! Core types shared by the decoder, the scoring engine and the CLI

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Decoded mono audio (f32 samples) at a fixed sample rate.
///
/// Samples are shared so a buffer can be handed to worker threads without
/// copying.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Audio samples, normalized to [-1.0, 1.0] by the decoder
    pub samples: Arc<[f32]>,
    /// Sample rate in Hz (e.g., 22050)
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::from(samples),
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds; zero when the sample rate is unknown.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Basic facts about a decoded file, before any analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub duration: f32,
    pub samples: usize,
    pub channels: usize,
}

/// Learner proficiency, used to pick rating thresholds and closing tips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    /// Parses a level coming from a request, falling back to beginner for
    /// anything unrecognised.
    pub fn from_request(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            warn!(level = raw, "unknown proficiency level; using beginner");
            Level::Beginner
        })
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(format!("unknown proficiency level '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioBuffer, Level};

    #[test]
    fn duration_follows_sample_rate() {
        let buffer = AudioBuffer::new(vec![0.0; 33_075], 22_050);
        assert!((buffer.duration_secs() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!("Advanced".parse::<Level>().unwrap(), Level::Advanced);
        assert_eq!(" intermediate ".parse::<Level>().unwrap(), Level::Intermediate);
        assert!("expert".parse::<Level>().is_err());
    }

    #[test]
    fn request_levels_fall_back_to_beginner() {
        assert_eq!(Level::from_request("expert"), Level::Beginner);
        assert_eq!(Level::from_request("advanced"), Level::Advanced);
    }
}
