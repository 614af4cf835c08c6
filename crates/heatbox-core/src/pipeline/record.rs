//! Per-segment evaluation results and their JSON form.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::types::BoundingBox;

/// A predicted box in ground-truth frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub bbox: BoundingBox,
    pub score: f32,
}

/// The result of evaluating one ground-truth box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryResult {
    pub arg: String,
    pub box_id: usize,
    pub frame_idx: u64,
    pub phrase: String,
    pub ground_truth: BoundingBox,
    pub predictions: Vec<Prediction>,
    pub iou: f32,
    pub mod_iou: f32,
}

/// A ground-truth box that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub box_id: usize,
    pub arg: String,
    pub reason: String,
}

/// Everything learned about one dataset segment.
///
/// Built once by the evaluator and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct EvaluationRecord {
    pub segment_id: String,
    pub verb: Option<String>,
    pub entries: Vec<EntryResult>,
    pub skipped: Vec<SkippedEntry>,
    /// Set when the segment itself is unusable (malformed, no verb).
    pub failure: Option<String>,
    source: Value,
}

impl EvaluationRecord {
    pub fn new(segment_id: &str, source: Value) -> Self {
        Self {
            segment_id: segment_id.to_string(),
            source,
            ..Self::default()
        }
    }

    /// A record for a segment that could not be evaluated at all.
    pub fn failed(segment_id: &str, source: Value, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(segment_id, source)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn iou_list(&self) -> Vec<f32> {
        self.entries.iter().map(|e| e.iou).collect()
    }

    pub fn mod_iou_list(&self) -> Vec<f32> {
        self.entries.iter().map(|e| e.mod_iou).collect()
    }

    /// Predicted boxes of every evaluated entry, in entry order.
    pub fn predicted_boxes(&self) -> Vec<BoundingBox> {
        self.entries
            .iter()
            .flat_map(|e| e.predictions.iter().map(|p| p.bbox))
            .collect()
    }

    /// The source annotation object with results attached.
    ///
    /// Skipped box ids are removed from the mirrored `arg2vid` lists.
    /// Predicted boxes are written as integer pixel coordinates.
    pub fn to_output(&self) -> Value {
        let mut out = match &self.source {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        if let Some(verb) = &self.verb {
            for skip in &self.skipped {
                remove_box_id(&mut out, verb, &skip.arg, skip.box_id);
            }
        }

        let pred_boxes: Vec<[i64; 4]> = self
            .predicted_boxes()
            .into_iter()
            .map(|b| {
                [
                    b.min_x as i64,
                    b.min_y as i64,
                    b.max_x as i64,
                    b.max_y as i64,
                ]
            })
            .collect();

        out.insert("clip_pred_bbox_list".into(), json!(pred_boxes));
        out.insert("clip_iou_list".into(), json!(self.iou_list()));
        out.insert("clip_mod_iou_list".into(), json!(self.mod_iou_list()));
        out.insert("clip_entries".into(), json!(self.entries));
        out.insert("clip_skipped".into(), json!(self.skipped));
        if let Some(reason) = &self.failure {
            out.insert("clip_error".into(), json!(reason));
        }
        Value::Object(out)
    }
}

/// Remove the first occurrence of `box_id` from `arg2vid[verb][arg]`.
fn remove_box_id(record: &mut Map<String, Value>, verb: &str, arg: &str, box_id: usize) {
    let ids = record
        .get_mut("arg2vid")
        .and_then(|v| v.get_mut(verb))
        .and_then(|v| v.get_mut(arg))
        .and_then(Value::as_array_mut);

    if let Some(ids) = ids {
        if let Some(pos) = ids.iter().position(|v| v.as_u64() == Some(box_id as u64)) {
            ids.remove(pos);
        }
    }
}

/// All records of one shard, in dataset order.
#[derive(Debug, Clone, Default)]
pub struct ShardReport {
    pub records: Vec<EvaluationRecord>,
    pub elapsed: Duration,
}

impl ShardReport {
    /// Number of ground-truth boxes that were scored.
    pub fn evaluated(&self) -> usize {
        self.records.iter().map(|r| r.entries.len()).sum()
    }

    pub fn skipped(&self) -> usize {
        self.records.iter().map(|r| r.skipped.len()).sum()
    }

    /// Number of segments that could not be evaluated at all.
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }

    /// Mean IoU over scored boxes, ignoring non-finite values.
    pub fn mean_iou(&self) -> Option<f32> {
        mean(self.records.iter().flat_map(|r| r.entries.iter().map(|e| e.iou)))
    }

    pub fn mean_mod_iou(&self) -> Option<f32> {
        mean(
            self.records
                .iter()
                .flat_map(|r| r.entries.iter().map(|e| e.mod_iou)),
        )
    }

    /// The shard as one JSON object keyed by segment id.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .records
            .iter()
            .map(|r| (r.segment_id.clone(), r.to_output()))
            .collect();
        Value::Object(map)
    }
}

fn mean(values: impl Iterator<Item = f32>) -> Option<f32> {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0usize), |(s, n), v| (s + v as f64, n + 1));
    (count > 0).then(|| (sum / count as f64) as f32)
}
