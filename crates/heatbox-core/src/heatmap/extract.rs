//! Heat grid → bounding boxes.
//!
//! 1. Min-max normalize the grid.
//! 2. Find local peaks above `rel_peak_thr` of the maximum.
//! 3. Upsample the grid to frame resolution and map each peak to its pixel.
//! 4. Grow each peak into the 4-connected region above `score × rel_rel_thr`
//!    and take the region's tight box.
//! 5. Rank by score, keep `topk_boxes`, then drop boxes whose own area is
//!    mostly covered by another kept box (IoA above `ioa_thr`).

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use ndarray::Array2;

use crate::config::ExtractionConfig;
use crate::scoring::ioa;
use crate::types::{BoundingBox, ScoredBox};

use super::peaks::find_peaks;
use super::resize::{map_to_pixel, resize_bilinear};
use super::HeatGrid;

/// Converts heat grids into ranked, de-duplicated boxes.
#[derive(Debug, Clone)]
pub struct BoxExtractor {
    config: ExtractionConfig,
}

impl BoxExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract boxes in the pixel space of a `height × width` frame.
    ///
    /// Returns an empty list when the grid has no peak.
    pub fn extract(&self, heat: &HeatGrid, height: usize, width: usize) -> Vec<ScoredBox> {
        let normalized = heat.min_max_normalized();
        let peaks = find_peaks(
            &normalized,
            self.config.rel_peak_thr,
            self.config.min_peak_distance,
        );
        if peaks.is_empty() || height == 0 || width == 0 {
            tracing::trace!("No peaks above {:.2}", self.config.rel_peak_thr);
            return Vec::new();
        }

        let (rows, cols) = normalized.dim();
        let resized = resize_bilinear(&normalized, height, width);

        let mut candidates: Vec<(BoundingBox, f32)> = peaks
            .iter()
            .map(|peak| {
                let y = map_to_pixel(peak.row, rows, height);
                let x = map_to_pixel(peak.col, cols, width);
                let threshold = peak.value * self.config.rel_rel_thr;
                (grow_region(&resized, y, x, threshold), peak.value)
            })
            .collect();

        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(self.config.topk_boxes);

        let boxes: Vec<BoundingBox> = candidates.iter().map(|(b, _)| *b).collect();
        let removed = suppress_redundant(&boxes, self.config.ioa_thr);

        let (w, h) = (width as f32, height as f32);
        let kept: Vec<ScoredBox> = candidates
            .into_iter()
            .zip(removed)
            .filter(|(_, removed)| !removed)
            .map(|((bbox, score), _)| ScoredBox {
                bbox,
                score,
                bbox_normalized: bbox.normalized(w, h),
            })
            .collect();

        tracing::trace!(
            "{} peak(s) → {} box(es) after suppression",
            peaks.len(),
            kept.len()
        );
        kept
    }
}

/// Tight box of the 4-connected region containing `(y, x)` where values
/// exceed `threshold`.
///
/// If the seed pixel itself is not above the threshold the region is just the
/// seed, giving a zero-area box.
fn grow_region(values: &Array2<f32>, y: usize, x: usize, threshold: f32) -> BoundingBox {
    if values[[y, x]] <= threshold {
        return pixel_box(x, y, x, y);
    }

    let (height, width) = values.dim();
    let mask = GrayImage::from_fn(width as u32, height as u32, |px, py| {
        Luma([u8::from(values[[py as usize, px as usize]] > threshold)])
    });
    let labels = connected_components(&mask, Connectivity::Four, Luma([0u8]));
    let seed = labels.get_pixel(x as u32, y as u32)[0];

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
    for (px, py, label) in labels.enumerate_pixels() {
        if label[0] == seed {
            let (px, py) = (px as usize, py as usize);
            min_x = min_x.min(px);
            max_x = max_x.max(px);
            min_y = min_y.min(py);
            max_y = max_y.max(py);
        }
    }

    pixel_box(min_x, min_y, max_x, max_y)
}

fn pixel_box(min_x: usize, min_y: usize, max_x: usize, max_y: usize) -> BoundingBox {
    BoundingBox::new(min_x as f32, min_y as f32, max_x as f32, max_y as f32)
}

/// Mark boxes that are redundant with a higher-ranked box.
///
/// `boxes` must be in rank order. For each pair `(i, j)` with `j < i` and `j`
/// still kept, the box whose own area is covered more (IoA above `ioa_thr`)
/// is removed; equal coverage removes the lower-ranked `i`. Degenerate boxes
/// produce NaN coverage and therefore never take part in suppression.
pub fn suppress_redundant(boxes: &[BoundingBox], ioa_thr: f32) -> Vec<bool> {
    let mut removed = vec![false; boxes.len()];
    for i in 0..boxes.len() {
        for j in 0..i {
            if removed[j] {
                continue;
            }
            let ioa_i = ioa(&boxes[i], &boxes[j]);
            let ioa_j = ioa(&boxes[j], &boxes[i]);
            if ioa_i > ioa_thr && ioa_i >= ioa_j {
                removed[i] = true;
            } else if ioa_j > ioa_thr && ioa_j >= ioa_i {
                removed[j] = true;
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> BoxExtractor {
        BoxExtractor::new(ExtractionConfig::default())
    }

    #[test]
    fn test_all_zero_grid_yields_no_boxes() {
        let heat = HeatGrid::new(Array2::zeros((22, 40)));
        assert!(extractor().extract(&heat, 720, 1280).is_empty());
    }

    #[test]
    fn test_single_cell_scenario() {
        let mut grid = Array2::<f32>::zeros((4, 4));
        grid[[1, 1]] = 1.0;
        let boxes = extractor().extract(&HeatGrid::new(grid), 8, 8);

        assert_eq!(boxes.len(), 1);
        assert!((boxes[0].score - 1.0).abs() < 1e-6);
        assert_eq!(boxes[0].bbox, BoundingBox::new(2.0, 2.0, 3.0, 3.0));
        assert_eq!(
            boxes[0].bbox_normalized,
            BoundingBox::new(0.25, 0.25, 0.375, 0.375)
        );
    }

    #[test]
    fn test_box_contains_strict_maximum() {
        let mut grid = Array2::<f32>::from_elem((22, 40), 0.1);
        grid[[15, 7]] = 0.9;
        grid[[14, 7]] = 0.5;
        let boxes = extractor().extract(&HeatGrid::new(grid), 720, 1280);

        let y = map_to_pixel(15, 22, 720) as f32;
        let x = map_to_pixel(7, 40, 1280) as f32;
        assert!(!boxes.is_empty());
        assert!(boxes.iter().any(|b| b.bbox.contains(x, y)));
    }

    #[test]
    fn test_topk_limits_boxes() {
        let mut grid = Array2::<f32>::zeros((10, 10));
        grid[[1, 1]] = 1.0;
        grid[[1, 8]] = 0.95;
        grid[[8, 1]] = 0.9;
        grid[[8, 8]] = 0.85;
        let config = ExtractionConfig {
            topk_boxes: 2,
            ..ExtractionConfig::default()
        };
        let boxes = BoxExtractor::new(config).extract(&HeatGrid::new(grid), 100, 100);
        assert_eq!(boxes.len(), 2);
        assert!((boxes[0].score - 1.0).abs() < 1e-6);
        assert!((boxes[1].score - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_equal_overlapping_boxes_keep_one() {
        let b = BoundingBox::new(10.0, 10.0, 50.0, 40.0);
        let removed = suppress_redundant(&[b, b], 0.6);
        assert_eq!(removed, vec![false, true]);
    }

    #[test]
    fn test_contained_box_is_removed_even_if_higher_ranked() {
        let small = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        let large = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        // small ranks first but is fully covered by large
        let removed = suppress_redundant(&[small, large], 0.6);
        assert_eq!(removed, vec![true, false]);
    }

    #[test]
    fn test_disjoint_boxes_both_kept() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(suppress_redundant(&[a, b], 0.6), vec![false, false]);
    }

    #[test]
    fn test_degenerate_boxes_never_suppressed() {
        let point = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
        let removed = suppress_redundant(&[point, point], 0.6);
        assert_eq!(removed, vec![false, false]);
    }

    #[test]
    fn test_grow_region_is_four_connected() {
        let values = ndarray::array![
            [1.0f32, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
        ];
        // diagonal neighbour is not connected
        assert_eq!(
            grow_region(&values, 1, 1, 0.5),
            BoundingBox::new(1.0, 1.0, 1.0, 1.0)
        );
    }

    #[test]
    fn test_grow_region_takes_seed_component_only() {
        let values = ndarray::array![
            [0.9f32, 0.9, 0.0, 0.0, 0.0],
            [0.0, 0.9, 0.0, 0.8, 0.8],
            [0.0, 0.9, 0.9, 0.0, 0.8],
            [0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        assert_eq!(
            grow_region(&values, 2, 2, 0.5),
            BoundingBox::new(0.0, 0.0, 2.0, 2.0)
        );
        assert_eq!(
            grow_region(&values, 1, 4, 0.5),
            BoundingBox::new(3.0, 1.0, 4.0, 2.0)
        );
    }

    #[test]
    fn test_grow_region_below_threshold_is_seed_pixel() {
        let values = Array2::<f32>::from_elem((3, 3), 0.1);
        assert_eq!(
            grow_region(&values, 2, 0, 0.5),
            BoundingBox::new(0.0, 2.0, 0.0, 2.0)
        );
    }
}
