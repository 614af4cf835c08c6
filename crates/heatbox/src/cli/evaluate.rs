//! The `heatbox evaluate` command: run one dataset shard end to end.

use std::path::{Path, PathBuf};

use clap::Args;
use heatbox_core::embedding::model_exists;
use heatbox_core::{
    shard_file_name, write_shard, ClipOnnxEncoder, ClipTokenizer, Config, Dataset, Evaluator,
    ShardReport,
};

/// Arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Name of this run, used as the output file prefix
    #[arg(long)]
    pub run_name: String,

    /// Number of segments in the shard
    #[arg(long)]
    pub num_segs: usize,

    /// Index of the first segment of the shard
    #[arg(long)]
    pub job_start: usize,

    /// Maximum number of boxes kept per phrase
    #[arg(long)]
    pub k: usize,

    /// Annotation file (overrides `dataset.annotations`)
    #[arg(long, env = "HEATBOX_ANNOTATIONS")]
    pub annotations: Option<PathBuf>,

    /// Frames root directory (overrides `dataset.frames_dir`)
    #[arg(long, env = "HEATBOX_FRAMES_DIR")]
    pub frames_dir: Option<PathBuf>,

    /// Directory result files are written to (overrides `output.dir`)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Pretty-print the result file
    #[arg(long)]
    pub pretty: bool,
}

impl EvaluateArgs {
    /// Exclusive end index of the shard, as used in the output file name.
    pub fn job_end(&self) -> usize {
        self.job_start + self.num_segs
    }
}

pub async fn execute(args: EvaluateArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, &args)?;

    let dataset = Dataset::load(&config.annotations_path())?;
    let segments = dataset.shard(args.job_start, args.num_segs);
    if segments.len() < args.num_segs {
        tracing::warn!(
            "Shard {}-{} runs past the end of the dataset ({} segments); evaluating {}",
            args.job_start,
            args.job_end(),
            dataset.len(),
            segments.len()
        );
    }

    let model_dir = config.model_dir();
    if !model_exists(&model_dir) {
        anyhow::bail!(
            "Model not found in {}\n\n  Hint: place visual.onnx, textual.onnx and tokenizer.json \
             there, or set general.model_dir / embedding.model in the config.",
            model_dir.display()
        );
    }
    let encoder = ClipOnnxEncoder::load(&model_dir)?;
    let tokenizer = ClipTokenizer::load(&model_dir, config.embedding.context_length)?;
    let evaluator = Evaluator::new(&config, encoder, tokenizer);

    tracing::info!(
        "Evaluating segments {}-{} of {} with top-{} boxes",
        args.job_start,
        args.job_end(),
        dataset.len(),
        config.extraction.topk_boxes
    );

    let progress = create_progress_bar(segments.len() as u64)?;
    let report = evaluator
        .evaluate_shard(&segments, |record| {
            progress.inc(1);
            progress.set_message(record.segment_id.clone());
        })
        .await;
    progress.finish_and_clear();

    let file_name = shard_file_name(&args.run_name, args.k, args.job_start, args.job_end());
    let path = write_shard(
        &report,
        &config.output_dir(),
        &file_name,
        config.output.pretty,
    )?;

    tracing::info!(
        "Shard done: {} evaluated, {} skipped, {} failed in {:.1}s",
        report.evaluated(),
        report.skipped(),
        report.failed(),
        report.elapsed.as_secs_f64()
    );
    eprint!("{}", format_summary(&report, &path));
    Ok(())
}

/// Fold CLI flags into the loaded config and re-check it.
fn apply_overrides(config: &mut Config, args: &EvaluateArgs) -> anyhow::Result<()> {
    config.extraction.topk_boxes = args.k;
    if let Some(path) = &args.annotations {
        config.dataset.annotations = path.clone();
    }
    if let Some(dir) = &args.frames_dir {
        config.dataset.frames_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if args.pretty {
        config.output.pretty = true;
    }
    config.validate()?;
    Ok(())
}

fn create_progress_bar(total: u64) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

fn format_summary(report: &ShardReport, path: &Path) -> String {
    let fmt_mean = |m: Option<f32>| m.map_or_else(|| "     n/a".to_string(), |v| format!("{v:>8.4}"));

    let mut out = String::new();
    out.push('\n');
    out.push_str("  ====================================\n");
    out.push_str("               Summary\n");
    out.push_str("  ====================================\n");
    out.push_str(&format!("    Segments:     {:>8}\n", report.records.len()));
    out.push_str(&format!("    Evaluated:    {:>8}\n", report.evaluated()));
    if report.skipped() > 0 {
        out.push_str(&format!("    Skipped:      {:>8}\n", report.skipped()));
    }
    if report.failed() > 0 {
        out.push_str(&format!("    Failed:       {:>8}\n", report.failed()));
    }
    out.push_str("  ------------------------------------\n");
    out.push_str(&format!("    Mean IoU:     {}\n", fmt_mean(report.mean_iou())));
    out.push_str(&format!("    Mean mod IoU: {}\n", fmt_mean(report.mean_mod_iou())));
    out.push_str(&format!(
        "    Duration:     {:>7.1}s\n",
        report.elapsed.as_secs_f64()
    ));
    out.push_str("  ====================================\n");
    out.push_str(&format!("  Results: {}\n", path.display()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use heatbox_core::pipeline::{EntryResult, EvaluationRecord, SkippedEntry};
    use heatbox_core::BoundingBox;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: EvaluateArgs,
    }

    fn parse(extra: &[&str]) -> EvaluateArgs {
        let mut argv = vec![
            "heatbox",
            "--run-name",
            "rn50",
            "--num-segs",
            "50",
            "--job-start",
            "100",
            "--k",
            "3",
        ];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_job_end_and_file_name() {
        let args = parse(&[]);
        assert_eq!(args.job_end(), 150);
        assert_eq!(
            shard_file_name(&args.run_name, args.k, args.job_start, args.job_end()),
            "rn50_k3_100-150.json"
        );
    }

    #[test]
    fn test_overrides_apply_k_and_paths() {
        let args = parse(&["--frames-dir", "/data/frames", "-o", "/tmp/out", "--pretty"]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args).unwrap();

        assert_eq!(config.extraction.topk_boxes, 3);
        assert_eq!(config.dataset.frames_dir, PathBuf::from("/data/frames"));
        assert_eq!(config.output.dir, PathBuf::from("/tmp/out"));
        assert!(config.output.pretty);
    }

    #[test]
    fn test_zero_k_is_rejected() {
        let mut args = parse(&[]);
        args.k = 0;
        let mut config = Config::default();
        let err = apply_overrides(&mut config, &args).unwrap_err();
        assert!(err.to_string().contains("topk_boxes"));
    }

    #[test]
    fn test_summary_lists_counts_and_means() {
        let mut record = EvaluationRecord::new("seg", serde_json::json!({}));
        record.entries.push(EntryResult {
            arg: "Agent".to_string(),
            box_id: 0,
            frame_idx: 1,
            phrase: "man".to_string(),
            ground_truth: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            predictions: vec![],
            iou: 0.5,
            mod_iou: 0.75,
        });
        record.skipped.push(SkippedEntry {
            box_id: 1,
            arg: "Agent".to_string(),
            reason: "missing".to_string(),
        });
        let report = ShardReport {
            records: vec![record],
            ..ShardReport::default()
        };

        let summary = format_summary(&report, Path::new("out/rn50_k3_0-1.json"));
        assert!(summary.contains("Evaluated:           1"));
        assert!(summary.contains("Skipped:             1"));
        assert!(!summary.contains("Failed"));
        assert!(summary.contains("0.5000"));
        assert!(summary.contains("0.7500"));
        assert!(summary.contains("rn50_k3_0-1.json"));
    }
}
