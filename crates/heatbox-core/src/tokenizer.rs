//! Phrase tokenization into fixed-length id sequences for the text tower.
//!
//! Every sequence is `[start, bpe ids..., end, pad...]` with exactly
//! `context_length` entries. A phrase that does not fit is an error rather
//! than being cut short.

use std::path::Path;

use ndarray::Array2;

use crate::error::PipelineError;

/// Start-of-text sentinel token.
pub const START_TOKEN: &str = "<|startoftext|>";

/// End-of-text sentinel token.
pub const END_TOKEN: &str = "<|endoftext|>";

/// Id written after the end sentinel up to the context length.
pub const PAD_ID: i64 = 0;

/// The tokenizer filename expected in the model directory.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Turns free text into a padded id sequence of the model's context length.
pub trait PhraseTokenizer {
    fn context_length(&self) -> usize;

    /// Tokenize one phrase into exactly `context_length` ids.
    fn tokenize(&self, phrase: &str) -> Result<Vec<i64>, PipelineError>;

    /// Tokenize a batch into a `[batch, context_length]` matrix.
    fn tokenize_batch(&self, phrases: &[String]) -> Result<Array2<i64>, PipelineError> {
        let ctx = self.context_length();
        let mut flat = Vec::with_capacity(phrases.len() * ctx);
        for phrase in phrases {
            flat.extend(self.tokenize(phrase)?);
        }
        Array2::from_shape_vec((phrases.len(), ctx), flat).map_err(|e| PipelineError::Tokenizer {
            message: format!("Token batch layout: {e}"),
        })
    }
}

/// Collapse runs of whitespace, trim, and lowercase.
pub fn clean_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Wrap BPE ids in sentinels and pad to `context_length`.
pub fn frame_ids(
    phrase: &str,
    bpe_ids: &[i64],
    start_id: i64,
    end_id: i64,
    context_length: usize,
) -> Result<Vec<i64>, PipelineError> {
    let needed = bpe_ids.len() + 2;
    if needed > context_length {
        return Err(PipelineError::TokenizerOverflow {
            phrase: phrase.to_string(),
            needed,
            context_length,
        });
    }

    let mut ids = Vec::with_capacity(context_length);
    ids.push(start_id);
    ids.extend_from_slice(bpe_ids);
    ids.push(end_id);
    ids.resize(context_length, PAD_ID);
    Ok(ids)
}

/// Byte-level BPE tokenizer loaded once from `tokenizer.json`.
pub struct ClipTokenizer {
    tokenizer: tokenizers::Tokenizer,
    start_id: i64,
    end_id: i64,
    context_length: usize,
}

impl ClipTokenizer {
    /// Load the tokenizer from `{model_dir}/tokenizer.json`.
    pub fn load(model_dir: &Path, context_length: usize) -> Result<Self, PipelineError> {
        let path = model_dir.join(TOKENIZER_FILENAME);
        if !path.exists() {
            return Err(PipelineError::Tokenizer {
                message: format!("Tokenizer not found at {:?}", path),
            });
        }

        let tokenizer =
            tokenizers::Tokenizer::from_file(&path).map_err(|e| PipelineError::Tokenizer {
                message: format!("Failed to load tokenizer: {e}"),
            })?;

        let lookup = |token: &str| {
            tokenizer
                .token_to_id(token)
                .map(i64::from)
                .ok_or_else(|| PipelineError::Tokenizer {
                    message: format!("Vocabulary has no {token} token"),
                })
        };
        let start_id = lookup(START_TOKEN)?;
        let end_id = lookup(END_TOKEN)?;

        tracing::debug!(
            "Loaded tokenizer from {:?} (vocab: {}, start: {start_id}, end: {end_id})",
            path,
            tokenizer.get_vocab_size(true)
        );

        Ok(Self {
            tokenizer,
            start_id,
            end_id,
            context_length,
        })
    }
}

impl PhraseTokenizer for ClipTokenizer {
    fn context_length(&self) -> usize {
        self.context_length
    }

    fn tokenize(&self, phrase: &str) -> Result<Vec<i64>, PipelineError> {
        let cleaned = clean_phrase(phrase);
        let encoding =
            self.tokenizer
                .encode(cleaned.as_str(), false)
                .map_err(|e| PipelineError::Tokenizer {
                    message: format!("Tokenization failed for {phrase:?}: {e}"),
                })?;
        let bpe: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        frame_ids(phrase, &bpe, self.start_id, self.end_id, self.context_length)
    }
}
