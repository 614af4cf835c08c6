//! Heatbox CLI - benchmark zero-shot phrase localization of vision-language models.
//!
//! Heatbox turns region/phrase similarity heatmaps from a dual encoder into
//! bounding boxes and scores them against ground-truth annotations, one shard
//! of the dataset per invocation.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate segments 100..150 keeping the top 5 boxes per phrase
//! heatbox evaluate --run-name rn50 --num-segs 50 --job-start 100 --k 5
//!
//! # View configuration
//! heatbox config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Heatbox - zero-shot phrase localization benchmark.
#[derive(Parser, Debug)]
#[command(name = "heatbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate one shard of the dataset and write its results
    Evaluate(cli::evaluate::EvaluateArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match heatbox_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `heatbox config path`."
            );
            heatbox_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Heatbox v{}", heatbox_core::VERSION);

    match cli.command {
        Commands::Evaluate(args) => cli::evaluate::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_requires_all_shard_arguments() {
        let parsed = Cli::try_parse_from(["heatbox", "evaluate", "--run-name", "rn50", "--k", "5"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["heatbox", "config", "path", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Config(_)));
    }
}
