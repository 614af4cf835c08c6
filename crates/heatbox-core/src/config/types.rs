//! Sub-configuration structs with defaults matching the reference setup
//! (RN50 dual encoder at 720×1280, 22×40 region grid, 720×405 annotation frames).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::UnionMode;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.heatbox/models"),
        }
    }
}

/// Dataset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Annotation JSON mapping segment id → record
    pub annotations: PathBuf,

    /// Root directory of extracted frames: `{frames_dir}/{segment}/{frame}.{ext}`
    pub frames_dir: PathBuf,

    /// Frame file extension
    pub frame_extension: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            annotations: PathBuf::from("~/.heatbox/data/train_final_single_verbs.json"),
            frames_dir: PathBuf::from("~/.heatbox/data/train"),
            frame_extension: "jpg".to_string(),
        }
    }
}

/// Dual-encoder model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name; files live in `{model_dir}/{model}/`
    pub model: String,

    /// Model input height in pixels
    pub input_height: u32,

    /// Model input width in pixels
    pub input_width: u32,

    /// Rows of the spatial region grid produced at this resolution
    pub grid_rows: usize,

    /// Columns of the spatial region grid produced at this resolution
    pub grid_cols: usize,

    /// Text context length (tokens, including sentinels)
    pub context_length: usize,

    /// Per-channel normalization mean (RGB)
    pub mean: [f32; 3],

    /// Per-channel normalization std (RGB)
    pub std: [f32; 3],
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "clip-rn50".to_string(),
            input_height: 720,
            input_width: 1280,
            grid_rows: 22,
            grid_cols: 40,
            context_length: 77,
            mean: [0.481_454_66, 0.457_827_5, 0.408_210_73],
            std: [0.268_629_54, 0.261_302_58, 0.275_777_11],
        }
    }
}

/// Heat grid → box extraction thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fraction of the grid maximum a local maximum must exceed
    pub rel_peak_thr: f32,

    /// Fraction of a peak's value used as its region-growing threshold
    pub rel_rel_thr: f32,

    /// Intersection-over-area above which a box counts as redundant
    pub ioa_thr: f32,

    /// Boxes retained before redundancy suppression
    pub topk_boxes: usize,

    /// Neighbourhood radius (in grid cells) for local maximum detection
    pub min_peak_distance: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rel_peak_thr: 0.6,
            rel_rel_thr: 0.3,
            ioa_thr: 0.6,
            topk_boxes: 5,
            min_peak_distance: 1,
        }
    }
}

/// Overlap scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// How several predicted boxes are combined: "area_sum" or "exact"
    pub union_mode: UnionMode,

    /// Width of the frames the ground-truth boxes were annotated on
    pub gt_frame_width: u32,

    /// Height of the frames the ground-truth boxes were annotated on
    pub gt_frame_height: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            union_mode: UnionMode::AreaSum,
            gt_frame_width: 720,
            gt_frame_height: 405,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum frame file size in megabytes
    pub max_file_size_mb: u64,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            decode_timeout_ms: 5000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory shard result files are written to
    pub dir: PathBuf,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
