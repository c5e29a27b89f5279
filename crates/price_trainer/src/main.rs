//! Crop price trainer CLI
//!
//! With no arguments, reads `prices.csv` and writes
//! `model_files/gradient_boosting_model.joblib`.

use anyhow::{Context, Result};
use clap::Parser;
use crop_price_core::PriceConfig;
use crop_price_trainer::{train, VERSION};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "price-train")]
#[command(version = VERSION)]
#[command(about = "Train the crop price prediction pipeline", long_about = None)]
struct Args {
    /// TOML configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input CSV dataset path
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the model artifact
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Model artifact file name
    #[arg(long)]
    model_file: Option<String>,

    /// Number of boosting trees
    #[arg(long)]
    trees: Option<usize>,

    /// Shrinkage applied to every tree
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Random seed for the split and subsampling
    #[arg(long)]
    seed: Option<i64>,

    /// Held-out fraction for evaluation
    #[arg(long)]
    test_size: Option<f64>,

    /// Row fraction drawn per tree
    #[arg(long)]
    subsample: Option<f64>,

    /// Write a JSON training report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut PriceConfig) {
        let training = &mut config.training;
        if let Some(input) = &self.input {
            training.input = input.clone();
        }
        if let Some(seed) = self.seed {
            training.seed = seed;
        }
        if let Some(test_size) = self.test_size {
            training.test_size = test_size;
        }

        let gbdt = &mut training.gbdt;
        if let Some(trees) = self.trees {
            gbdt.n_estimators = trees;
        }
        if let Some(rate) = self.learning_rate {
            gbdt.learning_rate = rate;
        }
        if let Some(depth) = self.max_depth {
            gbdt.max_depth = depth;
        }
        if let Some(subsample) = self.subsample {
            gbdt.subsample = subsample;
        }

        if let Some(dir) = &self.model_dir {
            config.artifact.dir = dir.clone();
        }
        if let Some(file) = &self.model_file {
            config.artifact.file_name = file.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Crop Price Trainer v{}", VERSION);

    let mut config = match &args.config {
        Some(path) => PriceConfig::load(path).context("Failed to load configuration")?,
        None => PriceConfig::default(),
    };
    args.apply(&mut config);

    let report = train(&config).context("Training failed")?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    info!("✓ Training completed successfully");
    info!("  Model: {}", report.artifact_path.display());
    info!("  Hash: {}", report.model_hash);

    Ok(())
}
