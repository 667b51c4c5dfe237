//! Dynamic time warping over frame-major feature sequences.
//!
//! Both sequences are `frames x dims`. Paths are anchored at the first and
//! last frame of each side and move by one step right, down or diagonally,
//! so any frame may match one or more frames on the other side.

use ndarray::{Array2, ArrayView1, ArrayView2};

/// Cumulative cost of the best warping path and the path itself.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpResult {
    pub distance: f64,
    pub path: Vec<(usize, usize)>,
}

/// Inclusive column band allowed in each row of the cost matrix.
#[derive(Debug, Clone, PartialEq)]
struct Window {
    bands: Vec<(usize, usize)>,
}

impl Window {
    fn full(rows: usize, cols: usize) -> Self {
        Self {
            bands: vec![(0, cols - 1); rows],
        }
    }

    /// Projects a path found on half-resolution sequences onto the full
    /// resolution grid, widened by `radius` coarse cells on every side.
    fn project(path: &[(usize, usize)], rows: usize, cols: usize, radius: usize) -> Self {
        let mut bands: Vec<Option<(usize, usize)>> = vec![None; rows];
        let radius = radius as isize;
        for &(i, j) in path {
            for di in -radius..=radius {
                for dj in -radius..=radius {
                    let (ci, cj) = (i as isize + di, j as isize + dj);
                    if ci < 0 || cj < 0 {
                        continue;
                    }
                    let (ci, cj) = (ci as usize, cj as usize);
                    let lo = 2 * cj;
                    if lo >= cols {
                        continue;
                    }
                    let hi = (2 * cj + 1).min(cols - 1);
                    for row in [2 * ci, 2 * ci + 1] {
                        if let Some(band) = bands.get_mut(row) {
                            *band = Some(match *band {
                                Some((l, h)) => (l.min(lo), h.max(hi)),
                                None => (lo, hi),
                            });
                        }
                    }
                }
            }
        }

        // Rows are widened until each one is reachable from the row above.
        // `previous` holds the first reachable column and the last column.
        let mut connected: Vec<(usize, usize)> = Vec::with_capacity(rows);
        let mut previous: Option<(usize, usize)> = None;
        for band in bands {
            let (mut lo, mut hi) = band.or(connected.last().copied()).unwrap_or((0, 0));
            let reach = match previous {
                None => {
                    lo = 0;
                    0
                }
                Some((reach, prev_hi)) => {
                    hi = hi.max(reach);
                    lo = lo.min(prev_hi + 1);
                    reach.max(lo)
                }
            };
            connected.push((lo, hi));
            previous = Some((reach, hi));
        }
        if let Some(last) = connected.last_mut() {
            last.1 = cols - 1;
        }
        Self { bands: connected }
    }

    #[cfg(test)]
    fn cell_count(&self) -> usize {
        self.bands.iter().map(|(lo, hi)| hi - lo + 1).sum()
    }
}

/// Exact alignment over the whole cost matrix. Quadratic in length.
///
/// Both sequences must contain at least one frame.
pub fn exact(a: ArrayView2<f32>, b: ArrayView2<f32>) -> WarpResult {
    let window = Window::full(a.nrows(), b.nrows());
    constrained(a, b, &window)
}

/// Coarsen-then-refine alignment: halve both sequences, align the halves
/// recursively, then search only within `radius` cells of the projected
/// path. Cost grows linearly with length for a fixed radius. The distance
/// is never smaller than the exact one and matches it once the radius
/// covers the whole matrix.
///
/// Both sequences must contain at least one frame.
pub fn approximate(a: ArrayView2<f32>, b: ArrayView2<f32>, radius: usize) -> WarpResult {
    let min_len = radius + 2;
    if a.nrows() < min_len || b.nrows() < min_len {
        return exact(a, b);
    }
    let coarse_a = coarsen(a);
    let coarse_b = coarsen(b);
    let coarse = approximate(coarse_a.view(), coarse_b.view(), radius);
    let window = Window::project(&coarse.path, a.nrows(), b.nrows(), radius);
    constrained(a, b, &window)
}

/// Averages consecutive frame pairs; a trailing odd frame is dropped.
fn coarsen(x: ArrayView2<f32>) -> Array2<f32> {
    Array2::from_shape_fn((x.nrows() / 2, x.ncols()), |(i, d)| {
        (x[[2 * i, d]] + x[[2 * i + 1, d]]) / 2.0
    })
}

fn constrained(a: ArrayView2<f32>, b: ArrayView2<f32>, window: &Window) -> WarpResult {
    let rows = a.nrows();
    let cols = b.nrows();
    let mut cost: Vec<Vec<f64>> = Vec::with_capacity(rows);

    for i in 0..rows {
        let (lo, hi) = window.bands[i];
        let mut row = vec![f64::INFINITY; hi - lo + 1];
        for j in lo..=hi {
            let step = if i == 0 && j == 0 {
                0.0
            } else {
                let left = if j > lo { row[j - 1 - lo] } else { f64::INFINITY };
                let (up, diagonal) = if i > 0 {
                    let above = (&cost[i - 1], window.bands[i - 1]);
                    let diagonal = if j > 0 {
                        lookup(above, j - 1)
                    } else {
                        f64::INFINITY
                    };
                    (lookup(above, j), diagonal)
                } else {
                    (f64::INFINITY, f64::INFINITY)
                };
                left.min(up).min(diagonal)
            };
            row[j - lo] = euclidean(a.row(i), b.row(j)) + step;
        }
        cost.push(row);
    }

    let distance = lookup((&cost[rows - 1], window.bands[rows - 1]), cols - 1);
    let path = backtrack(&cost, window, rows, cols);
    WarpResult { distance, path }
}

fn lookup((row, (lo, hi)): (&Vec<f64>, (usize, usize)), j: usize) -> f64 {
    if j < lo || j > hi {
        f64::INFINITY
    } else {
        row[j - lo]
    }
}

fn backtrack(cost: &[Vec<f64>], window: &Window, rows: usize, cols: usize) -> Vec<(usize, usize)> {
    let at = |i: usize, j: usize| lookup((&cost[i], window.bands[i]), j);
    let mut path = vec![(rows - 1, cols - 1)];
    let (mut i, mut j) = (rows - 1, cols - 1);
    while i > 0 || j > 0 {
        let mut candidates = Vec::with_capacity(3);
        if i > 0 && j > 0 {
            candidates.push((at(i - 1, j - 1), i - 1, j - 1));
        }
        if i > 0 {
            candidates.push((at(i - 1, j), i - 1, j));
        }
        if j > 0 {
            candidates.push((at(i, j - 1), i, j - 1));
        }
        // Diagonal wins ties because it is listed first.
        let Some(&(best, next_i, next_j)) = candidates
            .iter()
            .fold(None, |best: Option<&(f64, usize, usize)>, candidate| match best {
                Some(current) if current.0 <= candidate.0 => Some(current),
                _ => Some(candidate),
            })
        else {
            break;
        };
        if !best.is_finite() {
            break;
        }
        i = next_i;
        j = next_j;
        path.push((i, j));
    }
    path.reverse();
    path
}

fn euclidean(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = (*x - *y) as f64;
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    use super::{approximate, coarsen, exact, Window};

    fn ramp(len: usize, slope: f32) -> Array2<f32> {
        Array2::from_shape_fn((len, 2), |(i, d)| i as f32 * slope + d as f32)
    }

    #[test]
    fn single_frames_cost_their_distance() {
        let a = array![[0.0_f32, 0.0]];
        let b = array![[3.0_f32, 4.0]];
        let result = exact(a.view(), b.view());
        assert_abs_diff_eq!(result.distance, 5.0, epsilon = 1e-9);
        assert_eq!(result.path, vec![(0, 0)]);
    }

    #[test]
    fn repeated_frame_warps_for_free() {
        let a = array![[0.0_f32], [1.0], [2.0]];
        let b = array![[0.0_f32], [1.0], [1.0], [2.0]];
        let result = exact(a.view(), b.view());
        assert_abs_diff_eq!(result.distance, 0.0, epsilon = 1e-9);
        assert_eq!(result.path.first(), Some(&(0, 0)));
        assert_eq!(result.path.last(), Some(&(2, 3)));
    }

    #[test]
    fn path_is_monotonic_and_anchored() {
        let a = ramp(9, 1.0);
        let b = ramp(14, 0.6);
        let result = exact(a.view(), b.view());
        assert_eq!(result.path.first(), Some(&(0, 0)));
        assert_eq!(result.path.last(), Some(&(8, 13)));
        for pair in result.path.windows(2) {
            let (di, dj) = (pair[1].0 - pair[0].0, pair[1].1 - pair[0].1);
            assert!(di <= 1 && dj <= 1 && di + dj >= 1);
        }
    }

    #[test]
    fn coarsen_averages_pairs() {
        let x = array![[0.0_f32], [2.0], [4.0], [6.0], [8.0]];
        let coarse = coarsen(x.view());
        assert_eq!(coarse, array![[1.0_f32], [5.0]]);
    }

    #[test]
    fn projected_window_covers_both_corners() {
        let window = Window::project(&[(0, 0), (1, 1), (2, 2)], 7, 6, 1);
        assert_eq!(window.bands.len(), 7);
        assert_eq!(window.bands[0].0, 0);
        assert_eq!(window.bands[6].1, 5);
        assert!(window.cell_count() <= 7 * 6);
    }

    #[test]
    fn approximate_matches_exact_on_short_input() {
        let a = ramp(2, 1.0);
        let b = ramp(5, 0.5);
        let fast = approximate(a.view(), b.view(), 1);
        let slow = exact(a.view(), b.view());
        assert_abs_diff_eq!(fast.distance, slow.distance, epsilon = 1e-9);
    }
}
