use ndarray::ArrayView1;

/// Time-domain measurements for each analysis frame.
pub(crate) struct FrameStatistics {
    pub rms: Vec<f32>,
    pub zero_crossing_rate: Vec<f32>,
}

pub(crate) fn frame_statistics(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> FrameStatistics {
    let frames = frame_slices(samples, frame_size, hop_size);
    FrameStatistics {
        rms: frames.iter().map(|frame| rms(frame)).collect(),
        zero_crossing_rate: frames.iter().map(|frame| zero_crossing_rate(frame)).collect(),
    }
}

/// Power-weighted mean frequency of every frame; 0 for frames with no energy.
pub(crate) fn spectral_centroids(power: &[Vec<f64>], freqs: &[f64]) -> Vec<f32> {
    power
        .iter()
        .map(|frame| {
            let (weighted, total) = frame
                .iter()
                .zip(freqs.iter())
                .fold((0.0, 0.0), |(weighted, total), (p, f)| {
                    (weighted + p * f, total + p)
                });
            if total > 0.0 {
                (weighted / total) as f32
            } else {
                0.0
            }
        })
        .collect()
}

/// Population mean and standard deviation; `(0, 0)` for an empty slice.
pub(crate) fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let view = ArrayView1::from(values);
    (view.mean().unwrap_or(0.0), view.std(0.0))
}

fn frame_slices(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<&[f32]> {
    if samples.len() <= frame_size {
        return vec![samples];
    }
    (0..=samples.len() - frame_size)
        .step_by(hop_size.max(1))
        .map(|start| &samples[start..start + frame_size])
        .collect()
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let energy: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (energy / frame.len() as f64).sqrt() as f32
}

fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f32 / frame.len() as f32
}
