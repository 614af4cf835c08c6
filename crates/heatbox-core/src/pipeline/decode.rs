//! Frame decoding on a blocking thread, bounded by a timeout.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

use super::validate::Validator;

/// Validates and decodes frame images.
pub struct FrameDecoder {
    validator: Validator,
    timeout_ms: u64,
}

impl FrameDecoder {
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            timeout_ms: limits.decode_timeout_ms,
            validator: Validator::new(limits),
        }
    }

    /// Validate, read, and decode a frame.
    ///
    /// Format is detected from content, so a PNG saved as `.jpg` still decodes.
    pub async fn decode(&self, path: &Path) -> Result<DynamicImage, PipelineError> {
        self.validator.validate(path)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {}", e),
            })?;

        let owned = path.to_path_buf();
        let task = tokio::task::spawn_blocking(move || decode_bytes(bytes, &owned));

        match timeout(Duration::from_millis(self.timeout_ms), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "decode".to_string(),
                timeout_ms: self.timeout_ms,
            }),
        }
    }
}

fn decode_bytes(bytes: Vec<u8>, path: &Path) -> Result<DynamicImage, PipelineError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;
    let format = reader.format().or_else(|| ImageFormat::from_path(path).ok());

    let image = reader.decode().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let (width, height) = image.dimensions();
    tracing::trace!("Decoded {:?} ({:?}, {}x{})", path, format, width, height);
    Ok(image)
}
