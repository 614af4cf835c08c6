//! Frame preprocessing for the dual-encoder image tower.
//!
//! - Input size: `input_height × input_width` (non-square, no crop)
//! - Resampling: bicubic (Catmull-Rom)
//! - Normalization: `(pixel/255 - mean[c]) / std[c]` per RGB channel
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::DynamicImage;
use ndarray::Array4;

use crate::config::EmbeddingConfig;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// Preprocess a frame for image-tower inference.
///
/// Resizes to the configured input resolution, converts to RGB, normalizes
/// per channel, and returns a `[1, 3, H, W]` tensor.
pub fn preprocess(image: &DynamicImage, config: &EmbeddingConfig) -> Array4<f32> {
    let resized = image.resize_exact(
        config.input_width,
        config.input_height,
        image::imageops::FilterType::CatmullRom,
    );
    let rgb = resized.to_rgb8();

    let height = config.input_height as usize;
    let width = config.input_width as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, height, width));

    for (i, pixel) in rgb.as_raw().chunks_exact(CHANNELS).enumerate() {
        let y = i / width;
        let x = i % width;
        for (c, &val) in pixel.iter().enumerate() {
            tensor[[0, c, y, x]] = (val as f32 / 255.0 - config.mean[c]) / config.std[c];
        }
    }

    tensor
}
