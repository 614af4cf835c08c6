//! Error types for the Heatbox evaluation pipeline.
//!
//! Errors are organized by stage so a failed dataset entry can be reported with
//! the context needed to find it again (frame path, segment id, grid shape).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Heatbox operations.
#[derive(Error, Debug)]
pub enum HeatboxError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Frame image does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Frame decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// Region count does not reshape into the declared spatial grid
    #[error("Cannot reshape {regions} regions into a {rows}x{cols} grid")]
    GridShape {
        regions: usize,
        rows: usize,
        cols: usize,
    },

    /// Image and text features disagree on the embedding dimension
    #[error("Feature dimension mismatch: image {image_dim} vs text {text_dim}")]
    FeatureDim { image_dim: usize, text_dim: usize },

    /// Tokenized phrase plus sentinels does not fit the context window
    #[error("Phrase {phrase:?} needs {needed} tokens but the context length is {context_length}")]
    TokenizerOverflow {
        phrase: String,
        needed: usize,
        context_length: usize,
    },

    /// Tokenizer loading or encoding failed
    #[error("Tokenizer error: {message}")]
    Tokenizer { message: String },

    /// Model loading or inference failed
    #[error("Model error: {message}")]
    Model { message: String },

    /// Dataset record is malformed or references missing annotations
    #[error("Dataset error in segment {segment}: {message}")]
    Dataset { segment: String, message: String },
}

/// Convenience type alias for Heatbox results.
pub type Result<T> = std::result::Result<T, HeatboxError>;
