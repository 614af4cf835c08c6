//! Cosine-similarity heat grids from region and phrase features.
//!
//! Region features arrive as a flat row-major sequence of `rows × cols` spatial
//! cells. Each cell and each phrase vector is L2-normalized, so the dot product
//! is the cosine similarity. The raw similarity grid is then flipped as
//! `max(raw) - raw`, the polarity the box extractor has always been tuned on.

use ndarray::{Array2, ArrayView2, ArrayView3, Axis};

use crate::error::PipelineError;
use crate::math::l2_normalize_rows;

use super::HeatGrid;

/// Builds [`HeatGrid`]s for a fixed spatial grid shape.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMapBuilder {
    rows: usize,
    cols: usize,
}

impl SimilarityMapBuilder {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// One heat grid per phrase for a single image.
    ///
    /// `regions` is (rows·cols, dim) in row-major cell order; `phrases` is
    /// (n_phrases, dim).
    pub fn build(
        &self,
        regions: ArrayView2<f32>,
        phrases: ArrayView2<f32>,
    ) -> Result<Vec<HeatGrid>, PipelineError> {
        self.check_shapes(regions.nrows(), regions.ncols(), phrases.ncols())?;

        let mut regions = regions.to_owned();
        let mut phrases = phrases.to_owned();
        l2_normalize_rows(&mut regions);
        l2_normalize_rows(&mut phrases);

        // (cells, dim) · (dim, n_phrases) → (cells, n_phrases)
        let similarity = regions.dot(&phrases.t());

        similarity
            .axis_iter(Axis(1))
            .map(|column| self.to_heat(column.to_vec()))
            .collect()
    }

    /// Pair image `i` with phrase `i` across a batch.
    ///
    /// `regions` is (batch, rows·cols, dim); `phrases` is (batch, dim).
    pub fn build_paired(
        &self,
        regions: ArrayView3<f32>,
        phrases: ArrayView2<f32>,
    ) -> Result<Vec<HeatGrid>, PipelineError> {
        if regions.len_of(Axis(0)) != phrases.nrows() {
            return Err(PipelineError::Model {
                message: format!(
                    "Batch mismatch: {} images vs {} phrases",
                    regions.len_of(Axis(0)),
                    phrases.nrows()
                ),
            });
        }

        regions
            .axis_iter(Axis(0))
            .zip(phrases.axis_iter(Axis(0)))
            .map(|(image, phrase)| {
                let phrase = phrase.insert_axis(Axis(0));
                let mut grids = self.build(image, phrase)?;
                grids.pop().ok_or_else(|| PipelineError::Model {
                    message: "Similarity builder produced no grid".to_string(),
                })
            })
            .collect()
    }

    fn check_shapes(
        &self,
        regions: usize,
        image_dim: usize,
        text_dim: usize,
    ) -> Result<(), PipelineError> {
        if regions != self.rows * self.cols {
            return Err(PipelineError::GridShape {
                regions,
                rows: self.rows,
                cols: self.cols,
            });
        }
        if image_dim != text_dim {
            return Err(PipelineError::FeatureDim {
                image_dim,
                text_dim,
            });
        }
        Ok(())
    }

    fn to_heat(&self, cells: Vec<f32>) -> Result<HeatGrid, PipelineError> {
        let regions = cells.len();
        let raw = Array2::from_shape_vec((self.rows, self.cols), cells).map_err(|_| {
            PipelineError::GridShape {
                regions,
                rows: self.rows,
                cols: self.cols,
            }
        })?;
        let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Ok(HeatGrid::new(raw.mapv(|v| max - v)))
    }
}
