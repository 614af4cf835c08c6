//! Configuration management for Heatbox.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file only needs
//! the values it changes.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Heatbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Dataset locations
    pub dataset: DatasetConfig,

    /// Dual-encoder model settings
    pub embedding: EmbeddingConfig,

    /// Box extraction thresholds
    pub extraction: ExtractionConfig,

    /// Overlap scoring settings
    pub scoring: ScoringConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.heatbox.heatbox/config.toml
    /// - Linux: ~/.config/heatbox/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\heatbox\config\config.toml
    ///
    /// Falls back to ~/.heatbox/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "heatbox", "heatbox")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".heatbox").join("config.toml")
            })
    }

    /// Get the resolved model directory for the configured model (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        expand(&self.general.model_dir).join(&self.embedding.model)
    }

    /// Get the resolved annotation file path.
    pub fn annotations_path(&self) -> PathBuf {
        expand(&self.dataset.annotations)
    }

    /// Get the resolved frames root directory.
    pub fn frames_dir(&self) -> PathBuf {
        expand(&self.dataset.frames_dir)
    }

    /// Get the resolved output directory.
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.output.dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
