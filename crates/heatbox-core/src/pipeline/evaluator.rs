//! Evaluation driver: dataset segment → frames → heat grids → scored boxes.
//!
//! Every failure below the segment level is recorded as a skipped entry and
//! logged; nothing short of a malformed segment stops a record, and nothing
//! stops a shard.

use std::path::PathBuf;
use std::time::Instant;

use ndarray::{Array2, ArrayView2};

use crate::config::{Config, EmbeddingConfig};
use crate::dataset::{frame_path, DatasetRecord, Segment};
use crate::embedding::{drop_global_token, preprocess, FeatureEncoder};
use crate::error::PipelineError;
use crate::heatmap::{BoxExtractor, SimilarityMapBuilder};
use crate::scoring::OverlapScorer;
use crate::tokenizer::PhraseTokenizer;
use crate::types::BoundingBox;

use super::decode::FrameDecoder;
use super::record::{EntryResult, EvaluationRecord, Prediction, ShardReport, SkippedEntry};

/// Runs the full localization pipeline over dataset segments.
///
/// The encoder and tokenizer are loaded once by the caller and injected.
pub struct Evaluator<E, T> {
    encoder: E,
    tokenizer: T,
    decoder: FrameDecoder,
    builder: SimilarityMapBuilder,
    extractor: BoxExtractor,
    scorer: OverlapScorer,
    embedding: EmbeddingConfig,
    frames_dir: PathBuf,
    frame_extension: String,
    gt_width: f32,
    gt_height: f32,
}

impl<E: FeatureEncoder, T: PhraseTokenizer> Evaluator<E, T> {
    pub fn new(config: &Config, encoder: E, tokenizer: T) -> Self {
        Self {
            encoder,
            tokenizer,
            decoder: FrameDecoder::new(config.limits.clone()),
            builder: SimilarityMapBuilder::new(
                config.embedding.grid_rows,
                config.embedding.grid_cols,
            ),
            extractor: BoxExtractor::new(config.extraction.clone()),
            scorer: OverlapScorer::new(config.scoring.union_mode),
            embedding: config.embedding.clone(),
            frames_dir: config.frames_dir(),
            frame_extension: config.dataset.frame_extension.clone(),
            gt_width: config.scoring.gt_frame_width as f32,
            gt_height: config.scoring.gt_frame_height as f32,
        }
    }

    /// Evaluate every segment of a shard in order.
    ///
    /// `on_record` sees each finished record before it is appended.
    pub async fn evaluate_shard<F>(&self, segments: &[Segment], mut on_record: F) -> ShardReport
    where
        F: FnMut(&EvaluationRecord),
    {
        let start = Instant::now();
        let mut records = Vec::with_capacity(segments.len());

        for segment in segments {
            let record = match segment.record() {
                Ok(parsed) => self.evaluate_segment(&segment.id, &parsed).await,
                Err(e) => {
                    tracing::warn!("Segment {} is malformed: {}", segment.id, e);
                    EvaluationRecord::failed(&segment.id, segment.raw.clone(), e.to_string())
                }
            };
            on_record(&record);
            records.push(record);
        }

        ShardReport {
            records,
            elapsed: start.elapsed(),
        }
    }

    /// Evaluate one segment: every ground-truth box of every argument of its verb.
    pub async fn evaluate_segment(&self, id: &str, record: &DatasetRecord) -> EvaluationRecord {
        let mut result = EvaluationRecord::new(id, record.source().clone());

        let Some(verb) = record.primary_verb() else {
            tracing::warn!("Segment {} has no verb", id);
            result.failure = Some("Record has no verb".to_string());
            return result;
        };
        result.verb = Some(verb.to_string());

        for (arg, box_ids) in record.arguments(verb) {
            let text = record
                .phrase(verb, arg)
                .ok_or_else(|| PipelineError::Dataset {
                    segment: id.to_string(),
                    message: format!("No class string for argument {arg:?}"),
                })
                .and_then(|phrase| {
                    let features = self.encode_phrase(&phrase)?;
                    Ok((phrase, features))
                });

            let (phrase, features) = match text {
                Ok(text) => text,
                Err(e) => {
                    for &box_id in box_ids {
                        result.skipped.push(skip(id, arg, box_id, &e));
                    }
                    continue;
                }
            };

            for &box_id in box_ids {
                match self
                    .evaluate_box(id, record, arg, &phrase, features.view(), box_id)
                    .await
                {
                    Ok(entry) => result.entries.push(entry),
                    Err(e) => result.skipped.push(skip(id, arg, box_id, &e)),
                }
            }
        }

        tracing::debug!(
            "Segment {}: {} evaluated, {} skipped",
            id,
            result.entries.len(),
            result.skipped.len()
        );
        result
    }

    /// Tokenize and encode one phrase into a `[1, dim]` feature matrix.
    fn encode_phrase(&self, phrase: &str) -> Result<Array2<f32>, PipelineError> {
        let tokens = self.tokenizer.tokenize_batch(&[phrase.to_string()])?;
        self.encoder.encode_text(&tokens)
    }

    async fn evaluate_box(
        &self,
        id: &str,
        record: &DatasetRecord,
        arg: &str,
        phrase: &str,
        text_features: ArrayView2<'_, f32>,
        box_id: usize,
    ) -> Result<EntryResult, PipelineError> {
        let missing = |what: &str| PipelineError::Dataset {
            segment: id.to_string(),
            message: format!("Box id {box_id} has no {what}"),
        };
        let ground_truth = record
            .ground_truth(box_id)
            .ok_or_else(|| missing("ground-truth box"))?;
        let frame_idx = record
            .frame_index(box_id)
            .ok_or_else(|| missing("frame index"))?;

        let path = frame_path(&self.frames_dir, id, frame_idx, &self.frame_extension);
        let start = Instant::now();

        let image = self.decoder.decode(&path).await?;
        let decode_ms = start.elapsed().as_millis();

        let tensor = preprocess(&image, &self.embedding);
        let encoded = self.encoder.encode_images(&tensor)?;
        let regions = drop_global_token(encoded.view());

        let heat = self
            .builder
            .build_paired(regions, text_features)?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Model {
                message: "No heat grid for image/phrase pair".to_string(),
            })?;

        let boxes = self.extractor.extract(
            &heat,
            self.embedding.input_height as usize,
            self.embedding.input_width as usize,
        );

        let predictions: Vec<Prediction> = boxes
            .iter()
            .map(|b| Prediction {
                bbox: b
                    .bbox_normalized
                    .scaled(self.gt_width, self.gt_height)
                    .truncated(),
                score: b.score,
            })
            .collect();
        let pred_boxes: Vec<BoundingBox> = predictions.iter().map(|p| p.bbox).collect();

        let (iou, mod_iou) = self
            .scorer
            .score(&ground_truth, &pred_boxes)
            .map(|s| (s.iou, s.mod_iou))
            .unwrap_or((0.0, 0.0));

        tracing::trace!(
            "{}/{} box {}: {} predictions, IoU {:.4} (decode {}ms, total {}ms)",
            id,
            frame_idx,
            box_id,
            predictions.len(),
            iou,
            decode_ms,
            start.elapsed().as_millis()
        );

        Ok(EntryResult {
            arg: arg.to_string(),
            box_id,
            frame_idx,
            phrase: phrase.to_string(),
            ground_truth,
            predictions,
            iou,
            mod_iou,
        })
    }
}

fn skip(id: &str, arg: &str, box_id: usize, error: &PipelineError) -> SkippedEntry {
    tracing::warn!("Skipping {} {} box {}: {}", id, arg, box_id, error);
    SkippedEntry {
        box_id,
        arg: arg.to_string(),
        reason: error.to_string(),
    }
}
