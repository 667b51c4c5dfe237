use anyhow::{ensure, Result};
use tracing::debug;

use crate::types::AudioBuffer;

/// Output length that spans the same time at `target_rate`, never zero.
fn resampled_len(input_len: usize, source_rate: u32, target_rate: u32) -> usize {
    let scaled = input_len as u64 * u64::from(target_rate);
    scaled.div_ceil(u64::from(source_rate)).max(1) as usize
}

/// Interpolates `samples` onto a `target_rate` grid. Positions past the last
/// input sample hold its value.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    ensure!(
        source_rate > 0 && target_rate > 0,
        "sample rates must be positive (got {source_rate} Hz -> {target_rate} Hz)"
    );
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let step = f64::from(source_rate) / f64::from(target_rate);
    let last = samples.len() - 1;
    let resampled = (0..resampled_len(samples.len(), source_rate, target_rate))
        .map(|n| {
            let position = n as f64 * step;
            let index = (position as usize).min(last);
            let frac = (position - index as f64).clamp(0.0, 1.0) as f32;
            let (here, next) = (samples[index], samples[(index + 1).min(last)]);
            here + (next - here) * frac
        })
        .collect();
    Ok(resampled)
}

/// Returns `buffer` at `target_rate`. A buffer already at that rate shares
/// its samples instead of copying them.
pub fn to_rate(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    if buffer.sample_rate == target_rate {
        return Ok(buffer.clone());
    }
    let samples = linear_resample(&buffer.samples, buffer.sample_rate, target_rate)?;
    debug!(
        from = buffer.sample_rate,
        to = target_rate,
        input = buffer.len(),
        output = samples.len(),
        "resampled buffer"
    );
    Ok(AudioBuffer::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{linear_resample, to_rate};
    use crate::types::AudioBuffer;

    #[test]
    fn preserves_constant_signal_after_resample() {
        let input = vec![0.5; 441];
        let resampled = linear_resample(&input, 44_100, 22_050).unwrap();
        assert_eq!(resampled.len(), 221);
        assert!(resampled.iter().all(|&sample| (sample - 0.5).abs() < 1e-6));
    }

    #[test]
    fn upsampling_interpolates_between_neighbours() {
        let resampled = linear_resample(&[0.0, 1.0, 0.0], 1, 2).unwrap();
        assert_eq!(resampled.len(), 6);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0, 0.0];
        for (got, want) in resampled.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{resampled:?}");
        }
    }

    #[test]
    fn duration_survives_rate_change() {
        let buffer = AudioBuffer::new(vec![0.1; 16_000], 16_000);
        let converted = to_rate(&buffer, 22_050).unwrap();
        assert_eq!(converted.sample_rate, 22_050);
        assert!((converted.duration_secs() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn matching_rate_shares_samples() {
        let buffer = AudioBuffer::new(vec![0.2; 64], 22_050);
        let same = to_rate(&buffer, 22_050).unwrap();
        assert!(Arc::ptr_eq(&buffer.samples, &same.samples));
    }

    #[test]
    fn rejects_zero_rate() {
        assert!(linear_resample(&[0.0; 4], 0, 22_050).is_err());
        assert!(linear_resample(&[0.0; 4], 22_050, 0).is_err());
    }
}
