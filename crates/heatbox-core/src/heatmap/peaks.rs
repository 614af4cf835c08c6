//! Local maximum detection on a heat grid.
//!
//! A cell is a peak when it equals the maximum of its `(2d+1)×(2d+1)`
//! neighbourhood (clipped at the grid border, border cells included) and its
//! value is strictly above `max(min(grid), rel_threshold × max(grid))`.
//! Peaks are reported strongest first. On plateaus only the first cell in
//! that order survives: later candidates within Chebyshev distance `d` of an
//! accepted peak are dropped.

use ndarray::Array2;

/// A local maximum in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub row: usize,
    pub col: usize,
    pub value: f32,
}

/// Find local maxima above `rel_threshold × max(grid)`.
///
/// `min_distance` is the neighbourhood radius `d`; values below 1 are treated
/// as 1.
pub fn find_peaks(grid: &Array2<f32>, rel_threshold: f32, min_distance: usize) -> Vec<Peak> {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return Vec::new();
    }
    let d = min_distance.max(1);

    let (lo, hi) = grid
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let threshold = lo.max(rel_threshold * hi);

    let mut candidates: Vec<Peak> = Vec::new();
    for ((r, c), &value) in grid.indexed_iter() {
        if value > threshold && is_neighbourhood_max(grid, r, c, d) {
            candidates.push(Peak {
                row: r,
                col: c,
                value,
            });
        }
    }

    // Stable: equal values keep row-major order.
    candidates.sort_by(|a, b| b.value.total_cmp(&a.value));

    let mut peaks: Vec<Peak> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let crowded = peaks.iter().any(|p| {
            p.row.abs_diff(candidate.row) <= d && p.col.abs_diff(candidate.col) <= d
        });
        if !crowded {
            peaks.push(candidate);
        }
    }
    peaks
}

fn is_neighbourhood_max(grid: &Array2<f32>, row: usize, col: usize, d: usize) -> bool {
    let (rows, cols) = grid.dim();
    let value = grid[[row, col]];
    let r_end = (row + d).min(rows - 1);
    let c_end = (col + d).min(cols - 1);
    for r in row.saturating_sub(d)..=r_end {
        for c in col.saturating_sub(d)..=c_end {
            if grid[[r, c]] > value {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_all_zero_grid_has_no_peaks() {
        let grid = Array2::<f32>::zeros((6, 6));
        assert!(find_peaks(&grid, 0.6, 1).is_empty());
    }

    #[test]
    fn test_single_maximum() {
        let mut grid = Array2::<f32>::zeros((4, 4));
        grid[[1, 1]] = 1.0;
        let peaks = find_peaks(&grid, 0.6, 1);
        assert_eq!(
            peaks,
            vec![Peak {
                row: 1,
                col: 1,
                value: 1.0
            }]
        );
    }

    #[test]
    fn test_relative_threshold_filters_weak_peaks() {
        let grid = array![
            [1.0, 0.0, 0.0, 0.0, 0.5],
            [0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.7, 0.0, 0.0],
        ];
        let peaks = find_peaks(&grid, 0.6, 1);
        assert_eq!(peaks.len(), 2);
        assert_eq!((peaks[0].row, peaks[0].col), (0, 0));
        assert_eq!((peaks[1].row, peaks[1].col), (2, 2));
    }

    #[test]
    fn test_border_cells_are_eligible() {
        let grid = array![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let peaks = find_peaks(&grid, 0.6, 1);
        assert_eq!(peaks.len(), 1);
        assert_eq!((peaks[0].row, peaks[0].col), (2, 2));
    }

    #[test]
    fn test_plateau_keeps_first_cell() {
        let grid = array![[0.0, 0.0, 0.0, 0.0], [0.0, 1.0, 1.0, 0.0], [0.0, 0.0, 0.0, 0.0]];
        let peaks = find_peaks(&grid, 0.6, 1);
        assert_eq!(peaks.len(), 1);
        assert_eq!((peaks[0].row, peaks[0].col), (1, 1));
    }

    #[test]
    fn test_peaks_sorted_strongest_first() {
        let grid = array![[0.8, 0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 0.0, 0.0]];
        let peaks = find_peaks(&grid, 0.6, 1);
        assert_eq!(peaks[0].value, 1.0);
        assert_eq!(peaks[1].value, 0.8);
    }
}
