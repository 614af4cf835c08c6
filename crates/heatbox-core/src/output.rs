//! Shard result files.
//!
//! A shard is written as one JSON object keyed by segment id, in dataset
//! order, to `{dir}/{run_name}_k{k}_{start}-{end}.json`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::pipeline::ShardReport;

/// File name for the results of segments `start..end` of a run.
pub fn shard_file_name(run_name: &str, k: usize, start: usize, end: usize) -> String {
    format!("{run_name}_k{k}_{start}-{end}.json")
}

/// Serializes values as JSON, compact or pretty-printed.
pub struct OutputWriter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    /// Write one value followed by a newline.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Write a shard report to `dir/file_name`, creating `dir` if needed.
pub fn write_shard(
    report: &ShardReport,
    dir: &Path,
    file_name: &str,
    pretty: bool,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    let mut writer = OutputWriter::new(BufWriter::new(File::create(&path)?), pretty);
    writer.write(&report.to_json())?;
    writer.flush()?;

    tracing::info!(
        "Wrote {} segments to {:?}",
        report.records.len(),
        path
    );
    Ok(path)
}
