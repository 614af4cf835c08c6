//! Annotation file reading and sharding.
//!
//! The annotation file is a JSON object keyed by segment id. Segments keep
//! their file order, so an index range always names the same records no matter
//! which machine evaluates it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{HeatboxError, PipelineError};
use crate::types::BoundingBox;

/// One annotated video segment.
///
/// Only the fields the evaluator reads are typed. The full source object is
/// kept alongside so unknown fields survive into the output untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRecord {
    /// Event verbs; only the first is evaluated.
    pub verb: Vec<String>,

    /// verb → role argument → class string
    #[serde(deserialize_with = "roles_in_file_order")]
    pub frames: BTreeMap<String, RoleMap<String>>,

    /// verb → role argument → ground-truth box ids
    #[serde(deserialize_with = "roles_in_file_order")]
    pub arg2vid: BTreeMap<String, RoleMap<Vec<usize>>>,

    /// Ground-truth boxes indexed by box id, in frame pixels.
    pub bb: Vec<BoundingBox>,

    /// Frame index of each box, indexed by box id.
    pub bb2frames: Vec<u64>,

    #[serde(skip)]
    source: Value,
}

impl DatasetRecord {
    /// Parse a record from its raw JSON object, keeping the object for mirroring.
    pub fn from_value(segment: &str, raw: &Value) -> Result<Self, PipelineError> {
        let mut record: Self =
            serde_json::from_value(raw.clone()).map_err(|e| PipelineError::Dataset {
                segment: segment.to_string(),
                message: e.to_string(),
            })?;
        record.source = raw.clone();
        Ok(record)
    }

    /// The raw annotation object this record was parsed from.
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// The evaluated verb: the first entry of `verb`.
    pub fn primary_verb(&self) -> Option<&str> {
        self.verb.first().map(String::as_str)
    }

    /// Role arguments of `verb` with their ground-truth box ids, in file order.
    pub fn arguments<'a>(&'a self, verb: &str) -> impl Iterator<Item = (&'a str, &'a [usize])> {
        self.arg2vid
            .get(verb)
            .into_iter()
            .flat_map(|args| args.iter().map(|(arg, ids)| (arg.as_str(), ids.as_slice())))
    }

    /// The text phrase for an argument: its class string with hyphens as spaces.
    pub fn phrase(&self, verb: &str, arg: &str) -> Option<String> {
        self.frames
            .get(verb)
            .and_then(|args| args.iter().find(|(name, _)| name == arg))
            .map(|(_, class)| class.replace('-', " "))
    }

    pub fn ground_truth(&self, box_id: usize) -> Option<BoundingBox> {
        self.bb.get(box_id).copied()
    }

    pub fn frame_index(&self, box_id: usize) -> Option<u64> {
        self.bb2frames.get(box_id).copied()
    }
}

/// Role argument → value pairs of one verb, in file order.
pub type RoleMap<T> = Vec<(String, T)>;

fn roles_in_file_order<'de, D, T>(
    deserializer: D,
) -> Result<BTreeMap<String, RoleMap<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let verbs: BTreeMap<String, Map<String, Value>> = BTreeMap::deserialize(deserializer)?;
    verbs
        .into_iter()
        .map(|(verb, roles)| {
            let roles = roles
                .into_iter()
                .map(|(arg, value)| {
                    serde_json::from_value(value)
                        .map(|v| (arg, v))
                        .map_err(D::Error::custom)
                })
                .collect::<Result<RoleMap<T>, D::Error>>()?;
            Ok((verb, roles))
        })
        .collect()
}

/// Path of a frame image: `{frames_dir}/{segment}/{frame_idx}.{extension}`.
pub fn frame_path(frames_dir: &Path, segment: &str, frame_idx: u64, extension: &str) -> PathBuf {
    frames_dir
        .join(segment)
        .join(format!("{frame_idx}.{extension}"))
}

/// A segment id with its unparsed annotation object.
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: String,
    pub raw: Value,
}

impl Segment {
    pub fn record(&self) -> Result<DatasetRecord, PipelineError> {
        DatasetRecord::from_value(&self.id, &self.raw)
    }
}

/// The whole annotation file, in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    segments: Map<String, Value>,
}

impl Dataset {
    /// Read and parse an annotation file.
    pub fn load(path: &Path) -> Result<Self, HeatboxError> {
        let content = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&content)?;
        tracing::info!("Loaded {} segments from {:?}", dataset.len(), path);
        Ok(dataset)
    }

    pub fn from_json_str(content: &str) -> Result<Self, HeatboxError> {
        let segments: Map<String, Value> = serde_json::from_str(content)?;
        Ok(Self { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Up to `count` segments starting at index `start`.
    ///
    /// A range running past the end is cut short; one starting past the end
    /// is empty.
    pub fn shard(&self, start: usize, count: usize) -> Vec<Segment> {
        self.segments
            .iter()
            .skip(start)
            .take(count)
            .map(|(id, raw)| Segment {
                id: id.clone(),
                raw: raw.clone(),
            })
            .collect()
    }
}
