//! Core data types for the Heatbox evaluation pipeline.
//!
//! Boxes carry named corner fields everywhere inside the crate. The positional
//! `[min_x, min_y, max_x, max_y]` form only exists on the JSON boundary.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in either pixel or normalized coordinates.
///
/// Invariant: `min_x <= max_x` and `min_y <= max_y`. Zero width or height is
/// a valid (degenerate) box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    /// Create a box from its corners.
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True when the box has zero width or zero height.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Whether the point lies inside the box (edges inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Divide x coordinates by `width` and y coordinates by `height`.
    pub fn normalized(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.min_x / width,
            self.min_y / height,
            self.max_x / width,
            self.max_y / height,
        )
    }

    /// Multiply x coordinates by `width` and y coordinates by `height`.
    pub fn scaled(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.min_x * width,
            self.min_y * height,
            self.max_x * width,
            self.max_y * height,
        )
    }

    /// Drop the fractional part of every coordinate (integer pixel conversion).
    pub fn truncated(&self) -> Self {
        Self::new(
            self.min_x.trunc(),
            self.min_y.trunc(),
            self.max_x.trunc(),
            self.max_y.trunc(),
        )
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

/// A box produced by the extractor, ranked by its peak strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredBox {
    /// Box in pixel indices of the resized heat grid
    pub bbox: BoundingBox,

    /// Normalized peak value the box was grown from
    pub score: f32,

    /// `bbox` divided by the resized grid's width and height
    pub bbox_normalized: BoundingBox,
}

/// Overlap between a ground-truth box and a set of predicted boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapScores {
    /// Intersection area summed (or unioned) across predictions
    pub intersection: f32,

    /// Intersection over union
    pub iou: f32,

    /// Intersection over predicted area
    pub mod_iou: f32,
}
