pub mod dtw;

use ndarray::Array2;
use tracing::debug;

use crate::config::AlignmentConfig;
use crate::pronunciation::{PronunciationError, Result};

/// Measures how far apart two cepstral matrices are after time warping.
#[derive(Debug, Clone, Default)]
pub struct Aligner {
    config: AlignmentConfig,
}

impl Aligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    /// Raw cumulative path cost between two `coefficients x frames`
    /// matrices. Not normalised by path length.
    pub fn align(&self, mfcc_a: &Array2<f32>, mfcc_b: &Array2<f32>) -> Result<f32> {
        ensure_frames(mfcc_a, "first")?;
        ensure_frames(mfcc_b, "second")?;
        if mfcc_a.nrows() != mfcc_b.nrows() {
            return Err(PronunciationError::Alignment(format!(
                "coefficient counts differ: {} vs {}",
                mfcc_a.nrows(),
                mfcc_b.nrows()
            )));
        }

        // Frame-major: one row per analysis frame.
        let (a, b) = (mfcc_a.t(), mfcc_b.t());
        let result = match self.config.radius {
            Some(radius) => dtw::approximate(a, b, radius),
            None => dtw::exact(a, b),
        };
        if !result.distance.is_finite() {
            return Err(PronunciationError::Alignment(
                "warping produced a non-finite distance".to_string(),
            ));
        }
        debug!(
            frames_a = a.nrows(),
            frames_b = b.nrows(),
            path_len = result.path.len(),
            distance = result.distance,
            radius = ?self.config.radius,
            "aligned cepstral sequences"
        );
        Ok(result.distance as f32)
    }
}

fn ensure_frames(mfcc: &Array2<f32>, label: &str) -> Result<()> {
    if mfcc.ncols() == 0 || mfcc.nrows() == 0 {
        return Err(PronunciationError::Alignment(format!(
            "{label} feature sequence has no frames"
        )));
    }
    Ok(())
}
