//! ONNX Runtime sessions for the CLIP-style image and text towers.
//!
//! The image tower is an export without the final attention pool, so it
//! returns every spatial token rather than one pooled vector.

use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array2, Array3, Array4};
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

use super::{FeatureEncoder, TEXTUAL_MODEL_FILENAME, VISUAL_MODEL_FILENAME};

/// One ONNX session plus the tensor names it was exported with.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
struct Tower {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl Tower {
    fn load(model_path: &Path, default_input: &str) -> Result<Self, PipelineError> {
        if !model_path.exists() {
            return Err(PipelineError::Model {
                message: format!("Model not found at {:?}", model_path),
            });
        }

        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load ONNX model {:?}: {e}", model_path),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| default_input.to_string());
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| PipelineError::Model {
                message: format!("Model {:?} declares no outputs", model_path),
            })?;

        tracing::debug!(
            "Loaded {:?} (input: {:?}, output: {:?})",
            model_path,
            input_name,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Run the session and return the first output's shape and data.
    fn run(&self, input: Value) -> Result<(Vec<usize>, Vec<f32>), PipelineError> {
        let mut session = self.session.lock().map_err(|e| PipelineError::Model {
            message: format!("Session lock poisoned: {e}"),
        })?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| PipelineError::Model {
                message: format!("ONNX inference failed: {e}"),
            })?;

        let output = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name)
            .ok_or_else(|| PipelineError::Model {
                message: format!("Model did not produce {}", self.output_name),
            })?;

        let (shape, data) =
            output
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Model {
                    message: format!("Failed to extract {} tensor: {e}", self.output_name),
                })?;

        let shape = shape.iter().map(|&d| d as usize).collect();
        Ok((shape, data.to_vec()))
    }
}

/// Dual-encoder backed by two ONNX models in one directory.
pub struct ClipOnnxEncoder {
    visual: Tower,
    textual: Tower,
}

impl ClipOnnxEncoder {
    /// Load `visual.onnx` and `textual.onnx` from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, PipelineError> {
        tracing::info!("Loading dual encoder from {:?}", model_dir);
        let visual = Tower::load(&model_dir.join(VISUAL_MODEL_FILENAME), "image")?;
        let textual = Tower::load(&model_dir.join(TEXTUAL_MODEL_FILENAME), "input_ids")?;
        tracing::info!("Dual encoder loaded successfully");
        Ok(Self { visual, textual })
    }
}

impl FeatureEncoder for ClipOnnxEncoder {
    fn encode_images(&self, images: &Array4<f32>) -> Result<Array3<f32>, PipelineError> {
        let shape: Vec<i64> = images.shape().iter().map(|&d| d as i64).collect();
        let flat: Vec<f32> = images.iter().copied().collect();
        let input = Value::from_array((shape, flat)).map_err(|e| PipelineError::Model {
            message: format!("Failed to create image tensor: {e}"),
        })?;

        let (shape, data) = self.visual.run(input.into_dyn())?;
        match shape.as_slice() {
            &[batch, tokens, dim] => Array3::from_shape_vec((batch, tokens, dim), data)
                .map_err(|e| PipelineError::Model {
                    message: format!("Bad image feature layout: {e}"),
                }),
            other => Err(PipelineError::Model {
                message: format!("Unexpected image feature shape: {:?}", other),
            }),
        }
    }

    fn encode_text(&self, tokens: &Array2<i64>) -> Result<Array2<f32>, PipelineError> {
        let shape: Vec<i64> = tokens.shape().iter().map(|&d| d as i64).collect();
        let flat: Vec<i64> = tokens.iter().copied().collect();
        let input = Value::from_array((shape, flat)).map_err(|e| PipelineError::Model {
            message: format!("Failed to create token tensor: {e}"),
        })?;

        let (shape, data) = self.textual.run(input.into_dyn())?;
        match shape.as_slice() {
            &[batch, dim] => {
                Array2::from_shape_vec((batch, dim), data).map_err(|e| PipelineError::Model {
                    message: format!("Bad text feature layout: {e}"),
                })
            }
            other => Err(PipelineError::Model {
                message: format!("Unexpected text feature shape: {:?}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_model_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClipOnnxEncoder::load(dir.path()).err().unwrap();
        assert!(err.to_string().contains("visual.onnx"));
    }
}
