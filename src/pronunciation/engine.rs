use tracing::{debug, info};

use super::alignment::Aligner;
use super::features::FeatureExtractor;
use super::feedback::FeedbackGenerator;
use super::metrics::Scorer;
use super::{Comparison, FeatureSet, PronunciationError, Result};
use crate::config::EngineConfig;
use crate::types::{AudioBuffer, Level};

/// Stateless scoring pipeline: extract, align, score, explain.
///
/// Holds only configuration, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct PronunciationEngine {
    config: EngineConfig,
    extractor: FeatureExtractor,
    aligner: Aligner,
    scorer: Scorer,
    feedback: FeedbackGenerator,
}

impl PronunciationEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(config.extraction.clone()),
            aligner: Aligner::new(config.alignment.clone()),
            scorer: Scorer::new(config.scoring.clone()),
            feedback: FeedbackGenerator::new(config.feedback.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyze(&self, buffer: &AudioBuffer) -> Result<FeatureSet> {
        self.extractor.extract(buffer)
    }

    pub fn compare(
        &self,
        user: &AudioBuffer,
        reference: &AudioBuffer,
        level: Level,
    ) -> Result<Comparison> {
        ensure_same_rate(user, reference)?;
        let user_features = self.extractor.extract(user)?;
        let reference_features = self.extractor.extract(reference)?;
        self.compare_features(&user_features, &reference_features, level)
    }

    /// Scores already-extracted features, e.g. a cached reference.
    pub fn compare_features(
        &self,
        user: &FeatureSet,
        reference: &FeatureSet,
        level: Level,
    ) -> Result<Comparison> {
        let distance = self.aligner.align(&user.mfcc, &reference.mfcc)?;
        let score = self.scorer.score(distance, user, reference);
        let feedback = self
            .feedback
            .generate(score.final_score, user, reference, level);
        debug!(
            rating = ?feedback.rating,
            aspects = feedback.details.len(),
            "generated feedback"
        );
        info!(
            %level,
            distance,
            final_score = score.final_score,
            "pronunciation compared"
        );
        Ok(Comparison {
            level,
            score,
            feedback,
            user: user.summary(),
            reference: reference.summary(),
        })
    }
}

/// Both buffers of one comparison must share a sample rate.
pub(crate) fn ensure_same_rate(user: &AudioBuffer, reference: &AudioBuffer) -> Result<()> {
    if user.sample_rate != reference.sample_rate {
        return Err(PronunciationError::InvalidAudio(format!(
            "sample rates differ: learner {} Hz, reference {} Hz",
            user.sample_rate, reference.sample_rate
        )));
    }
    Ok(())
}
