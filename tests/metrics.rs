use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2};
use pronunciation_scorer::config::{CalibrationPoint, ScoringConfig};
use pronunciation_scorer::pronunciation::feedback::FeedbackGenerator;
use pronunciation_scorer::pronunciation::metrics::Scorer;
use pronunciation_scorer::pronunciation::{FeatureSet, Rating};
use pronunciation_scorer::types::Level;

fn features(duration: f32, pitch_mean: f32, rms_mean: f32) -> FeatureSet {
    FeatureSet {
        mfcc: Array2::zeros((13, 20)),
        mfcc_mean: Array1::zeros(13),
        mfcc_std: Array1::zeros(13),
        pitch_mean,
        pitch_std: 0.0,
        spectral_centroid_mean: 1_200.0,
        spectral_centroid_std: 0.0,
        zero_crossing_rate_mean: 0.05,
        rms_mean,
        rms_std: 0.0,
        duration,
    }
}

#[test]
fn identical_features_at_zero_distance_score_full_marks() {
    let reference = features(1.5, 150.0, 0.05);
    let breakdown = Scorer::default().score(0.0, &reference, &reference);
    assert_eq!(breakdown.base_score, 100.0);
    assert_eq!(breakdown.total_penalty(), 0.0);
    assert_eq!(breakdown.final_score, 100.0);
    assert!(!breakdown.silence_detected);
}

#[test]
fn base_score_never_rises_with_distance() {
    let scorer = Scorer::default();
    let mut previous = scorer.base_score(0.0);
    for step in 1..=600 {
        let current = scorer.base_score(step as f32 * 10.0);
        assert!(current <= previous, "score rose at distance {}", step * 10);
        assert!((0.0..=100.0).contains(&current));
        previous = current;
    }
    assert_eq!(scorer.base_score(1.0e9), 0.0);
}

#[test]
fn doubled_duration_costs_the_full_duration_penalty() {
    let reference = features(1.5, 150.0, 0.05);
    let user = features(3.0, 150.0, 0.05);
    let scorer = Scorer::default();
    let distance = 400.0;
    let breakdown = scorer.score(distance, &user, &reference);
    assert_abs_diff_eq!(breakdown.duration_penalty, 20.0, epsilon = 1e-4);
    assert_eq!(breakdown.pitch_penalty, 0.0);
    assert_eq!(breakdown.volume_penalty, 0.0);
    let expected = (scorer.base_score(distance) - 20.0).clamp(0.0, 100.0);
    assert_abs_diff_eq!(breakdown.final_score, expected, epsilon = 1e-4);
}

#[test]
fn penalties_are_capped() {
    let reference = features(1.0, 150.0, 0.05);
    let user = features(10.0, 900.0, 0.5);
    let breakdown = Scorer::default().score(0.0, &user, &reference);
    assert_abs_diff_eq!(breakdown.pitch_penalty, 30.0, epsilon = 1e-4);
    assert_abs_diff_eq!(breakdown.duration_penalty, 20.0, epsilon = 1e-4);
    assert_abs_diff_eq!(breakdown.volume_penalty, 20.0, epsilon = 1e-4);
    assert_abs_diff_eq!(breakdown.final_score, 30.0, epsilon = 1e-4);
}

#[test]
fn unvoiced_reference_adds_no_pitch_penalty() {
    let reference = features(1.0, 0.0, 0.05);
    let user = features(1.0, 220.0, 0.05);
    let breakdown = Scorer::default().score(0.0, &user, &reference);
    assert_eq!(breakdown.pitch_penalty, 0.0);
}

#[test]
fn near_silent_learner_scores_zero_and_fails() {
    let reference = features(1.5, 150.0, 0.05);
    let user = features(1.5, 150.0, 0.0001);
    let breakdown = Scorer::default().score(0.0, &user, &reference);
    assert!(breakdown.silence_detected);
    assert_eq!(breakdown.final_score, 0.0);

    let feedback = FeedbackGenerator::default().generate(
        breakdown.final_score,
        &user,
        &reference,
        Level::Beginner,
    );
    assert_eq!(feedback.rating, Rating::Fail);
    assert!(feedback.details.iter().all(|detail| detail.score <= 29.0));
}

#[test]
fn custom_calibration_is_honoured() {
    let config = ScoringConfig {
        calibration: vec![
            CalibrationPoint::new(0.0, 100.0),
            CalibrationPoint::new(100.0, 0.0),
        ],
        ..ScoringConfig::default()
    };
    let scorer = Scorer::new(config);
    assert_abs_diff_eq!(scorer.base_score(25.0), 75.0, epsilon = 1e-4);
    assert_eq!(scorer.base_score(150.0), 0.0);
}
