//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

fn unit_interval(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be between 0.0 and 1.0"
        )));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("extraction.rel_peak_thr", self.extraction.rel_peak_thr)?;
        unit_interval("extraction.rel_rel_thr", self.extraction.rel_rel_thr)?;
        unit_interval("extraction.ioa_thr", self.extraction.ioa_thr)?;

        if self.extraction.topk_boxes == 0 {
            return Err(ConfigError::ValidationError(
                "extraction.topk_boxes must be > 0".into(),
            ));
        }
        if self.extraction.min_peak_distance == 0 {
            return Err(ConfigError::ValidationError(
                "extraction.min_peak_distance must be > 0".into(),
            ));
        }
        if self.embedding.grid_rows == 0 || self.embedding.grid_cols == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.grid_rows and embedding.grid_cols must be > 0".into(),
            ));
        }
        if self.embedding.input_height == 0 || self.embedding.input_width == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.input_height and embedding.input_width must be > 0".into(),
            ));
        }
        // Start and end sentinels alone take two slots.
        if self.embedding.context_length < 2 {
            return Err(ConfigError::ValidationError(
                "embedding.context_length must be >= 2".into(),
            ));
        }
        if self.embedding.std.iter().any(|&s| s <= 0.0) {
            return Err(ConfigError::ValidationError(
                "embedding.std values must be > 0".into(),
            ));
        }
        if self.scoring.gt_frame_width == 0 || self.scoring.gt_frame_height == 0 {
            return Err(ConfigError::ValidationError(
                "scoring.gt_frame_width and scoring.gt_frame_height must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
