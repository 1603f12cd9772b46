//! Trendpipe - stock trend ETL pipeline
//!
//! Turns raw per-ticker price exports (CSV/JSON) into a labeled training
//! dataset with trend features, guarded by a post-assembly quality gate.
//!
//! # Usage
//! ```sh
//! TRENDPIPE_BASE_DIR=/srv/etl cargo run -- run --job full
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use trendpipe::application::pipeline::{self, Job};
use trendpipe::application::quality::gate;
use trendpipe::config::Config;
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Stock trend ETL pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an ETL job over the raw data directory
    Run {
        /// Job to run (full, extraction, transformation)
        #[arg(long, default_value = "full")]
        job: String,

        /// Base directory for data/raw, data/processed and models
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Raw input directory (overrides <base-dir>/data/raw)
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Processed output directory (overrides <base-dir>/data/processed)
        #[arg(long)]
        processed_dir: Option<PathBuf>,

        /// SMA window size
        #[arg(long)]
        sma_period: Option<usize>,
    },
    /// Print the execution plan of the standard graph
    Stages,
    /// Run the quality gate against an existing dataset file
    Gate {
        /// Path to a training_data.csv artifact
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            job,
            base_dir,
            raw_dir,
            processed_dir,
            sma_period,
        } => {
            let job = Job::from_str(&job)?;
            let mut config = Config::from_env()?;
            if let Some(dir) = base_dir {
                config = config.with_base_dir(&dir);
            }
            if let Some(dir) = raw_dir {
                config.storage = config.storage.with_raw_dir(dir);
            }
            if let Some(dir) = processed_dir {
                config.storage = config.storage.with_processed_dir(dir);
            }
            if let Some(period) = sma_period {
                anyhow::ensure!(period > 0, "sma-period must be at least 1");
                config.params.sma_period = period;
            }

            info!("Trendpipe {} starting...", env!("CARGO_PKG_VERSION"));
            info!(
                "Job: {:?}, raw dir: {}, sma period: {}",
                job,
                config.storage.raw_dir().display(),
                config.params.sma_period
            );

            let ctx = pipeline::run_job(&config, job)
                .with_context(|| format!("pipeline job {:?} failed", job))?;

            if let Some(dataset) = &ctx.dataset {
                info!(
                    "Dataset ready: {} rows -> {}",
                    dataset.len(),
                    config.storage.dataset_path().display()
                );
            }
            if let Some(report) = &ctx.quality {
                info!(
                    "Quality gate: {} ({} warnings)",
                    report.summary(),
                    report.warnings().len()
                );
            }
            Ok(())
        }
        Commands::Stages => {
            let graph = pipeline::build_graph();
            for stage in graph.plan(None)? {
                let deps = stage.deps();
                if deps.is_empty() {
                    println!("{}", stage.name());
                } else {
                    println!("{} <- {}", stage.name(), deps.join(", "));
                }
            }
            Ok(())
        }
        Commands::Gate { file } => {
            let report = gate::run_gate(&file)
                .with_context(|| format!("quality gate failed to read {}", file.display()))?;
            for check in &report.checks {
                print!("{}", check);
            }
            if !report.passed {
                error!("Quality gate FAILED: {}", report.summary());
                anyhow::bail!("quality gate failed: {}", report.summary());
            }
            info!("Quality gate passed: {}", report.summary());
            Ok(())
        }
    }
}
