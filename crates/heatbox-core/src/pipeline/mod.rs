//! Evaluation pipeline components.
//!
//! - **validate**: existence, size, and magic-byte checks on frame files
//! - **decode**: timeout-bounded frame decoding on a blocking thread
//! - **evaluator**: the per-segment driver tying decoding, encoding, heat
//!   grids, box extraction, and scoring together
//! - **record**: per-segment results and their JSON form

pub mod decode;
pub mod evaluator;
pub mod record;
pub mod validate;

pub use decode::FrameDecoder;
pub use evaluator::Evaluator;
pub use record::{EntryResult, EvaluationRecord, Prediction, ShardReport, SkippedEntry};
pub use validate::Validator;
