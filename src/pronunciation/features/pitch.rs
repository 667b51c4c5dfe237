use crate::config::ExtractionConfig;

/// Picks one fundamental estimate per frame from parabolic-interpolated
/// spectral peaks, keeping the candidate with the largest magnitude.
///
/// Frames without a candidate inside the pitch range are unvoiced and left
/// out, so the result may be shorter than the frame count (or empty).
pub(super) fn track_pitch(
    magnitude: &[Vec<f64>],
    freqs: &[f64],
    config: &ExtractionConfig,
) -> Vec<f32> {
    let bin_width = config.sample_rate as f64 / config.frame_size as f64;
    magnitude
        .iter()
        .filter_map(|frame| strongest_candidate(frame, freqs, bin_width, config))
        .map(|hz| hz as f32)
        .collect()
}

fn strongest_candidate(
    frame: &[f64],
    freqs: &[f64],
    bin_width: f64,
    config: &ExtractionConfig,
) -> Option<f64> {
    let bins = frame.len().min(freqs.len());
    if bins < 3 {
        return None;
    }
    let peak = frame[..bins].iter().copied().fold(0.0_f64, f64::max);
    if peak <= 0.0 {
        return None;
    }
    let floor = config.pitch_threshold * peak;

    let mut best: Option<(f64, f64)> = None;
    for bin in 1..bins - 1 {
        let freq = freqs[bin];
        if freq < config.pitch_min_hz || freq >= config.pitch_max_hz {
            continue;
        }
        let (left, centre, right) = (frame[bin - 1], frame[bin], frame[bin + 1]);
        if !(centre > left && centre >= right && centre > floor) {
            continue;
        }
        let avg = 0.5 * (right - left);
        let curvature = 2.0 * centre - left - right;
        let shift = if curvature.abs() > f64::EPSILON {
            avg / curvature
        } else {
            0.0
        };
        let candidate_hz = freq + shift * bin_width;
        let candidate_mag = centre + 0.5 * avg * shift;
        if best.map_or(true, |(mag, _)| candidate_mag > mag) {
            best = Some((candidate_mag, candidate_hz));
        }
    }
    best.map(|(_, hz)| hz).filter(|hz| *hz > 0.0)
}
