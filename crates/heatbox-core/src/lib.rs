//! Heatbox Core - zero-shot phrase localization from similarity heatmaps.
//!
//! A dual encoder produces one feature vector per spatial region of a frame
//! and one per text phrase. Their cosine similarities form a heat grid, which
//! is turned into ranked bounding boxes and scored against ground truth.
//!
//! # Architecture
//!
//! ```text
//! Segment → Frame → Encode (image + phrase) → HeatGrid → Boxes → IoU → JSON
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use heatbox_core::{ClipOnnxEncoder, ClipTokenizer, Config, Dataset, Evaluator};
//!
//! #[tokio::main]
//! async fn main() -> heatbox_core::Result<()> {
//!     let config = Config::load()?;
//!     let encoder = ClipOnnxEncoder::load(&config.model_dir())?;
//!     let tokenizer = ClipTokenizer::load(&config.model_dir(), config.embedding.context_length)?;
//!     let evaluator = Evaluator::new(&config, encoder, tokenizer);
//!
//!     let dataset = Dataset::load(&config.annotations_path())?;
//!     let report = evaluator.evaluate_shard(&dataset.shard(0, 50), |_| {}).await;
//!     println!("Mean IoU: {:?}", report.mean_iou());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod heatmap;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod tokenizer;
pub mod types;

pub use config::Config;
pub use dataset::{Dataset, DatasetRecord, Segment};
pub use embedding::{ClipOnnxEncoder, FeatureEncoder};
pub use error::{ConfigError, HeatboxError, PipelineError, Result};
pub use heatmap::{BoxExtractor, HeatGrid, SimilarityMapBuilder};
pub use output::{shard_file_name, write_shard, OutputWriter};
pub use pipeline::{EvaluationRecord, Evaluator, ShardReport};
pub use scoring::{OverlapScorer, UnionMode};
pub use tokenizer::{ClipTokenizer, PhraseTokenizer};
pub use types::{BoundingBox, OverlapScores, ScoredBox};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
