//! Overlap scoring of predicted boxes against a ground-truth box.
//!
//! Two metrics are produced:
//! - **IoU**: intersection / union
//! - **Modified IoU**: intersection / predicted area, i.e. how much of the
//!   prediction lands on the object regardless of how large the prediction is
//!
//! With several predictions the default [`UnionMode::AreaSum`] accumulates
//! areas and intersections box by box without correcting for overlap between
//! the predictions themselves. [`UnionMode::Exact`] measures the true
//! geometric union instead.
//!
//! Zero denominators follow IEEE semantics (NaN or infinity) and never panic.

use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, OverlapScores};

/// How multiple predicted boxes are combined into a single region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionMode {
    /// Sum areas and intersections across predictions (approximate union)
    #[default]
    AreaSum,
    /// Exact area of the predictions' geometric union, via coordinate compression
    Exact,
}

/// Intersection area of two axis-aligned boxes (zero when disjoint).
pub fn intersection(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let w = (a.max_x.min(b.max_x) - a.min_x.max(b.min_x)).max(0.0);
    let h = (a.max_y.min(b.max_y) - a.min_y.max(b.min_y)).max(0.0);
    w * h
}

/// Intersection over union of two boxes.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let isec = intersection(a, b);
    isec / (a.area() + b.area() - isec)
}

/// Intersection divided by the area of `own`.
pub fn ioa(own: &BoundingBox, other: &BoundingBox) -> f32 {
    intersection(own, other) / own.area()
}

/// Scores one ground-truth box against a set of predictions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapScorer {
    mode: UnionMode,
}

impl OverlapScorer {
    pub fn new(mode: UnionMode) -> Self {
        Self { mode }
    }

    /// Compute IoU and modified IoU of `predictions` against `ground_truth`.
    ///
    /// Returns `None` when there are no predictions to score.
    pub fn score(
        &self,
        ground_truth: &BoundingBox,
        predictions: &[BoundingBox],
    ) -> Option<OverlapScores> {
        if predictions.is_empty() {
            return None;
        }

        let (isec, pred_area) = match self.mode {
            UnionMode::AreaSum => predictions.iter().fold((0.0f32, 0.0f32), |(i, a), p| {
                (i + intersection(ground_truth, p), a + p.area())
            }),
            UnionMode::Exact => {
                let clipped: Vec<BoundingBox> = predictions
                    .iter()
                    .filter_map(|p| clip(p, ground_truth))
                    .collect();
                (union_area(&clipped), union_area(predictions))
            }
        };

        let union = ground_truth.area() + pred_area - isec;
        Some(OverlapScores {
            intersection: isec,
            iou: isec / union,
            mod_iou: isec / pred_area,
        })
    }
}

/// The intersection rectangle of two boxes, if they overlap with positive area.
fn clip(a: &BoundingBox, b: &BoundingBox) -> Option<BoundingBox> {
    let clipped = BoundingBox::new(
        a.min_x.max(b.min_x),
        a.min_y.max(b.min_y),
        a.max_x.min(b.max_x),
        a.max_y.min(b.max_y),
    );
    (clipped.width() > 0.0 && clipped.height() > 0.0).then_some(clipped)
}

/// Exact area covered by the union of `boxes`, via coordinate compression.
pub fn union_area(boxes: &[BoundingBox]) -> f32 {
    let boxes: Vec<&BoundingBox> = boxes.iter().filter(|b| !b.is_degenerate()).collect();
    if boxes.is_empty() {
        return 0.0;
    }

    let mut xs: Vec<f32> = boxes.iter().flat_map(|b| [b.min_x, b.max_x]).collect();
    let mut ys: Vec<f32> = boxes.iter().flat_map(|b| [b.min_y, b.max_y]).collect();
    xs.sort_by(f32::total_cmp);
    xs.dedup();
    ys.sort_by(f32::total_cmp);
    ys.dedup();

    let mut area = 0.0f32;
    for xw in xs.windows(2) {
        for yw in ys.windows(2) {
            let (cx, cy) = ((xw[0] + xw[1]) * 0.5, (yw[0] + yw[1]) * 0.5);
            if boxes.iter().any(|b| b.contains(cx, cy)) {
                area += (xw[1] - xw[0]) * (yw[1] - yw[0]);
            }
        }
    }
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x0: f32, y0: f32, x1: f32, y1: f32) -> BoundingBox {
        BoundingBox::new(x0, y0, x1, y1)
    }

    #[test]
    fn test_intersection_is_symmetric() {
        let pairs = [
            (b(0.0, 0.0, 10.0, 10.0), b(5.0, 5.0, 15.0, 15.0)),
            (b(0.0, 0.0, 10.0, 10.0), b(20.0, 20.0, 30.0, 30.0)),
            (b(2.0, 1.0, 4.0, 9.0), b(0.0, 3.0, 8.0, 5.0)),
            (b(3.0, 3.0, 3.0, 3.0), b(0.0, 0.0, 6.0, 6.0)),
        ];
        for (x, y) in pairs {
            assert_eq!(intersection(&x, &y), intersection(&y, &x));
        }
    }

    #[test]
    fn test_ioa_uses_own_area() {
        let small = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        let large = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(ioa(&small, &large), 1.0);
        assert!((ioa(&large, &small) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_partial_overlap_scores() {
        let gt = b(0.0, 0.0, 10.0, 10.0);
        let scores = OverlapScorer::default()
            .score(&gt, &[b(5.0, 5.0, 15.0, 15.0)])
            .unwrap();
        assert_eq!(scores.intersection, 25.0);
        assert!((scores.iou - 25.0 / 175.0).abs() < 1e-6);
        assert!((scores.iou - 0.1429).abs() < 1e-4);
        assert!((scores.mod_iou - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_disjoint_boxes_score_zero() {
        let gt = b(0.0, 0.0, 10.0, 10.0);
        let scores = OverlapScorer::default()
            .score(&gt, &[b(20.0, 20.0, 30.0, 30.0)])
            .unwrap();
        assert_eq!(scores.iou, 0.0);
        assert_eq!(scores.mod_iou, 0.0);
    }

    #[test]
    fn test_iou_identity_and_range() {
        let a = b(1.0, 2.0, 7.0, 9.0);
        assert_eq!(iou(&a, &a), 1.0);

        let others = [
            b(0.0, 0.0, 3.0, 3.0),
            b(4.0, 4.0, 20.0, 20.0),
            b(1.5, 2.5, 6.5, 8.5),
            b(100.0, 100.0, 101.0, 101.0),
        ];
        for o in &others {
            let v = iou(&a, o);
            assert!((0.0..=1.0).contains(&v), "iou {v} out of range");
        }
    }

    #[test]
    fn test_mod_iou_is_one_when_prediction_inside_ground_truth() {
        let gt = b(0.0, 0.0, 100.0, 50.0);
        let inner = b(10.0, 10.0, 30.0, 20.0);
        for mode in [UnionMode::AreaSum, UnionMode::Exact] {
            let scores = OverlapScorer::new(mode).score(&gt, &[inner]).unwrap();
            assert_eq!(scores.mod_iou, 1.0);
        }
    }

    #[test]
    fn test_degenerate_prediction_yields_nan_not_panic() {
        let gt = b(0.0, 0.0, 10.0, 10.0);
        let scores = OverlapScorer::default()
            .score(&gt, &[b(3.0, 3.0, 3.0, 3.0)])
            .unwrap();
        assert_eq!(scores.iou, 0.0);
        assert!(scores.mod_iou.is_nan());
    }

    #[test]
    fn test_empty_predictions_have_no_score() {
        let gt = b(0.0, 0.0, 10.0, 10.0);
        assert!(OverlapScorer::default().score(&gt, &[]).is_none());
    }

    #[test]
    fn test_area_sum_double_counts_overlapping_predictions() {
        let gt = b(0.0, 0.0, 10.0, 10.0);
        let preds = [b(0.0, 0.0, 10.0, 10.0), b(0.0, 0.0, 10.0, 10.0)];

        let approx = OverlapScorer::new(UnionMode::AreaSum)
            .score(&gt, &preds)
            .unwrap();
        // 200 / (100 + 200 - 200)
        assert_eq!(approx.iou, 2.0);

        let exact = OverlapScorer::new(UnionMode::Exact)
            .score(&gt, &preds)
            .unwrap();
        assert_eq!(exact.iou, 1.0);
        assert_eq!(exact.mod_iou, 1.0);
    }

    #[test]
    fn test_union_area_of_overlapping_boxes() {
        let boxes = [b(0.0, 0.0, 10.0, 10.0), b(5.0, 5.0, 15.0, 15.0)];
        assert_eq!(union_area(&boxes), 175.0);
        assert_eq!(union_area(&[]), 0.0);
    }

    #[test]
    fn test_exact_mode_partial_overlap_matches_single_box_iou() {
        let gt = b(0.0, 0.0, 10.0, 10.0);
        let pred = b(5.0, 5.0, 15.0, 15.0);
        let exact = OverlapScorer::new(UnionMode::Exact)
            .score(&gt, &[pred])
            .unwrap();
        assert!((exact.iou - iou(&gt, &pred)).abs() < 1e-6);
    }

    #[test]
    fn test_union_mode_deserializes_snake_case() {
        let mode: UnionMode = serde_json::from_str("\"area_sum\"").unwrap();
        assert_eq!(mode, UnionMode::AreaSum);
        let mode: UnionMode = serde_json::from_str("\"exact\"").unwrap();
        assert_eq!(mode, UnionMode::Exact);
    }
}
