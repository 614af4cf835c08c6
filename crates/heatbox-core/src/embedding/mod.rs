//! Dual-encoder feature extraction.
//!
//! The image tower returns one feature vector per spatial region plus a
//! leading global token; the text tower returns one vector per token sequence.
//! Both sit behind [`FeatureEncoder`] so the evaluation driver does not care
//! whether features come from ONNX Runtime or a test double.
//!
//! # Usage
//!
//! ```rust,ignore
//! use heatbox_core::embedding::{ClipOnnxEncoder, FeatureEncoder};
//!
//! let encoder = ClipOnnxEncoder::load(&config.model_dir())?;
//! let encoded = encoder.encode_images(&tensor)?;   // [batch, 1 + regions, dim]
//! let regions = heatbox_core::embedding::drop_global_token(encoded.view());
//! ```

pub(crate) mod clip;
pub mod preprocess;

use std::path::Path;

use ndarray::{s, Array2, Array3, Array4, ArrayView3};

use crate::error::PipelineError;

pub use self::clip::ClipOnnxEncoder;
pub use self::preprocess::preprocess;

/// The image tower ONNX model filename.
pub const VISUAL_MODEL_FILENAME: &str = "visual.onnx";

/// The text tower ONNX model filename.
pub const TEXTUAL_MODEL_FILENAME: &str = "textual.onnx";

/// A dual encoder producing per-region image features and per-phrase text features.
pub trait FeatureEncoder {
    /// Encode a `[batch, 3, H, W]` image tensor.
    ///
    /// Returns `[batch, 1 + regions, dim]`; index 0 along the second axis is
    /// the global token.
    fn encode_images(&self, images: &Array4<f32>) -> Result<Array3<f32>, PipelineError>;

    /// Encode `[batch, context_length]` token ids into `[batch, dim]` features.
    fn encode_text(&self, tokens: &Array2<i64>) -> Result<Array2<f32>, PipelineError>;
}

/// Discard the leading global token, keeping only spatial regions.
pub fn drop_global_token(encoded: ArrayView3<f32>) -> ArrayView3<f32> {
    encoded.slice_move(s![.., 1.., ..])
}

/// Check whether both tower models exist in `model_dir`.
pub fn model_exists(model_dir: &Path) -> bool {
    model_dir.join(VISUAL_MODEL_FILENAME).exists()
        && model_dir.join(TEXTUAL_MODEL_FILENAME).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_global_token() {
        let encoded = Array3::<f32>::from_shape_fn((2, 5, 3), |(b, r, _)| (b * 10 + r) as f32);
        let regions = drop_global_token(encoded.view());
        assert_eq!(regions.shape(), &[2, 4, 3]);
        assert_eq!(regions[[0, 0, 0]], 1.0);
        assert_eq!(regions[[1, 3, 2]], 14.0);
    }

    #[test]
    fn test_model_exists_requires_both_towers() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!model_exists(dir.path()));
        std::fs::write(dir.path().join(VISUAL_MODEL_FILENAME), b"").unwrap();
        assert!(!model_exists(dir.path()));
        std::fs::write(dir.path().join(TEXTUAL_MODEL_FILENAME), b"").unwrap();
        assert!(model_exists(dir.path()));
    }
}
