//! Turns a score and the raw feature deviations into learner-facing advice.

use crate::config::FeedbackConfig;
use crate::pronunciation::{
    percent_deviation, Aspect, AspectFeedback, FeatureSet, Feedback, Rating,
};
use crate::types::Level;

/// Which side of the reference the learner landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Above,
    Below,
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Good,
    Borderline,
    Poor,
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackGenerator {
    config: FeedbackConfig,
}

impl FeedbackGenerator {
    pub fn new(config: FeedbackConfig) -> Self {
        Self { config }
    }

    pub fn generate(
        &self,
        score: f32,
        user: &FeatureSet,
        reference: &FeatureSet,
        level: Level,
    ) -> Feedback {
        let rating = self.rating(score, level);
        let details = [
            (Aspect::Pitch, user.pitch_mean, reference.pitch_mean),
            (Aspect::Timing, user.duration, reference.duration),
            (Aspect::Volume, user.rms_mean, reference.rms_mean),
        ]
        .into_iter()
        .map(|(aspect, user_value, reference_value)| {
            self.aspect_feedback(aspect, score, user_value, reference_value)
        })
        .collect();

        Feedback {
            rating,
            overall: overall_message(rating).to_string(),
            details,
            tip: closing_tip(level).to_string(),
        }
    }

    pub fn rating(&self, score: f32, level: Level) -> Rating {
        let thresholds = self.config.thresholds(level);
        if score >= thresholds.excellent {
            Rating::Excellent
        } else if score >= thresholds.good {
            Rating::Good
        } else if score >= thresholds.fair {
            Rating::Fair
        } else if score >= thresholds.pass {
            Rating::NeedsImprovement
        } else {
            Rating::Fail
        }
    }

    /// `100 - percent deviation`, clamped, then capped while the overall
    /// score sits in a low band.
    pub fn aspect_score(&self, overall: f32, user: f32, reference: f32) -> f32 {
        let raw = (100.0 - percent_deviation(user, reference)).clamp(0.0, 100.0);
        self.config
            .aspect_caps
            .iter()
            .filter(|cap| overall < cap.below)
            .fold(raw, |score, cap| score.min(cap.cap))
    }

    fn aspect_feedback(
        &self,
        aspect: Aspect,
        overall: f32,
        user: f32,
        reference: f32,
    ) -> AspectFeedback {
        let score = self.aspect_score(overall, user, reference);
        let tier = if score >= self.config.good_aspect {
            Tier::Good
        } else if score >= self.config.borderline_aspect {
            Tier::Borderline
        } else {
            Tier::Poor
        };
        let direction = if user > reference {
            Direction::Above
        } else if user < reference {
            Direction::Below
        } else {
            Direction::Matched
        };
        AspectFeedback {
            aspect,
            comment: comment(aspect, tier, direction).to_string(),
            score,
        }
    }
}

fn overall_message(rating: Rating) -> &'static str {
    match rating {
        Rating::Excellent => "Great job! Your pronunciation is very close to native.",
        Rating::Good => "Good pronunciation! Keep practicing to improve further.",
        Rating::Fair => "Fair pronunciation. Focus on the specific sounds mentioned below.",
        Rating::NeedsImprovement => "Keep practicing! Pay attention to the feedback below.",
        Rating::Fail => {
            "We could not match your recording to the reference. Listen again and repeat the word clearly."
        }
    }
}

fn closing_tip(level: Level) -> &'static str {
    match level {
        Level::Beginner => "Focus on listening to native speakers and repeating after them.",
        Level::Intermediate => "Pay attention to subtle sound differences and intonation patterns.",
        Level::Advanced => "Work on perfecting the nuances and natural flow of speech.",
    }
}

fn comment(aspect: Aspect, tier: Tier, direction: Direction) -> &'static str {
    use Aspect::*;
    use Direction::*;
    use Tier::*;

    match (aspect, tier, direction) {
        (Pitch, Good, _) => "Your pitch is good!",
        (Timing, Good, _) => "Your timing is excellent!",
        (Volume, Good, _) => "Your volume is just right.",

        // A matched value can only land here through the low-score cap.
        (Pitch, _, Matched) => {
            "Your pitch matches the reference, but the word itself needs more work."
        }
        (Timing, _, Matched) => {
            "Your pace matches the reference, but the word itself needs more work."
        }
        (Volume, _, Matched) => {
            "Your volume matches the reference, but the word itself needs more work."
        }

        (Pitch, Borderline, Above) => {
            "Your pitch is slightly higher than the reference. Try speaking a bit lower."
        }
        (Pitch, Borderline, Below) => {
            "Your pitch is slightly lower than the reference. Try speaking a bit higher."
        }
        (Pitch, Poor, Above) => "Your pitch is much too high. Listen again and lower your voice.",
        (Pitch, Poor, Below) => "Your pitch is much too low. Listen again and raise your voice.",

        (Timing, Borderline, Above) => {
            "You're speaking a bit slowly. Try to match the native speaker's pace."
        }
        (Timing, Borderline, Below) => "You're speaking a bit quickly. Try to slow down slightly.",
        (Timing, Poor, Above) => {
            "You're speaking far too slowly. Say the word in one smooth breath."
        }
        (Timing, Poor, Below) => "You're speaking far too fast. Give each sound its full length.",

        (Volume, Borderline, Above) => "Try speaking a bit softer to match the reference.",
        (Volume, Borderline, Below) => "Try speaking a bit louder for clearer pronunciation.",
        (Volume, Poor, Above) => {
            "You're much too loud. Step back from the microphone or speak softer."
        }
        (Volume, Poor, Below) => {
            "You're much too soft. Move closer to the microphone and speak up."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{comment, Direction, FeedbackGenerator, Tier};
    use crate::config::FeedbackConfig;
    use crate::pronunciation::{Aspect, Rating};
    use crate::types::Level;

    #[test]
    fn stricter_levels_rate_lower() {
        let generator = FeedbackGenerator::new(FeedbackConfig::default());
        assert_eq!(generator.rating(80.0, Level::Beginner), Rating::Excellent);
        assert_eq!(generator.rating(80.0, Level::Intermediate), Rating::Good);
        assert_eq!(generator.rating(80.0, Level::Advanced), Rating::Good);
        assert_eq!(generator.rating(60.0, Level::Advanced), Rating::NeedsImprovement);
        assert_eq!(generator.rating(0.0, Level::Beginner), Rating::Fail);
    }

    #[test]
    fn low_overall_caps_aspect_scores() {
        let generator = FeedbackGenerator::new(FeedbackConfig::default());
        assert_eq!(generator.aspect_score(95.0, 150.0, 150.0), 100.0);
        assert_eq!(generator.aspect_score(40.0, 150.0, 150.0), 49.0);
        assert_eq!(generator.aspect_score(10.0, 150.0, 150.0), 29.0);
        assert_eq!(generator.aspect_score(95.0, 450.0, 150.0), 0.0);
    }

    #[test]
    fn direction_follows_raw_difference() {
        assert!(comment(Aspect::Timing, Tier::Borderline, Direction::Above).contains("slowly"));
        assert!(comment(Aspect::Timing, Tier::Poor, Direction::Below).contains("fast"));
        assert!(comment(Aspect::Volume, Tier::Borderline, Direction::Below).contains("louder"));
    }
}
