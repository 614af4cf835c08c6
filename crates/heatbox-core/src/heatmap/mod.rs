//! Similarity heatmaps and their conversion into bounding boxes.
//!
//! - **similarity**: region/phrase features → one [`HeatGrid`] per phrase
//! - **peaks**: local maxima above a relative threshold
//! - **resize**: bilinear upsampling of a grid to frame resolution
//! - **extract**: peaks → region growing → ranked, de-duplicated boxes

pub mod extract;
pub mod peaks;
pub mod resize;
pub mod similarity;

pub use extract::BoxExtractor;
pub use peaks::{find_peaks, Peak};
pub use similarity::SimilarityMapBuilder;

use ndarray::Array2;

/// Spatial alignment scores between one image and one phrase, shape (rows, cols).
///
/// Higher values mean stronger alignment under the builder's polarity
/// convention. A grid is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatGrid {
    values: Array2<f32>,
}

impl HeatGrid {
    pub fn new(values: Array2<f32>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    /// Smallest and largest value in the grid, or `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        ))
    }

    /// Rescale values to [0, 1].
    ///
    /// A constant grid becomes all zeros instead of dividing by zero.
    pub fn min_max_normalized(&self) -> Array2<f32> {
        let Some((lo, hi)) = self.min_max() else {
            return self.values.clone();
        };
        let range = hi - lo;
        if range > 0.0 {
            self.values.mapv(|v| (v - lo) / range)
        } else {
            Array2::zeros(self.values.raw_dim())
        }
    }
}
