//! Crop price predictor CLI
//!
//! Prints exactly one JSON object on stdout for every invocation:
//! `{"predicted_price": "..."}` or `{"error": "..."}`. Logs go to stderr.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use crop_price_core::inference::{self, PredictionOutcome};
use crop_price_core::{PredictError, PriceConfig, VERSION};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "price-predict")]
#[command(version = VERSION)]
#[command(about = "Predict a commodity's modal price from a trained pipeline", long_about = None)]
struct Args {
    /// <state> <district> <crop>; options must come first
    #[arg(allow_hyphen_values = true)]
    values: Vec<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the model artifact
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Model artifact file name
    #[arg(long)]
    model_file: Option<String>,

    /// Verbose logging (stderr)
    #[arg(short, long)]
    verbose: bool,
}

fn emit(outcome: &PredictionOutcome) {
    println!("{}", outcome.to_json());
}

fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => {
            emit(&PredictionOutcome::from_result(Err(PredictError::InvalidArguments)));
            return Ok(());
        }
    };

    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = match args.config.as_deref().map(PriceConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            emit(&PredictionOutcome::Error(err.to_string()));
            return Ok(());
        }
    };

    let mut artifact = config.artifact;
    if let Some(dir) = args.model_dir {
        artifact.dir = dir;
    }
    if let Some(file) = args.model_file {
        artifact.file_name = file;
    }
    debug!("Using model artifact {}", artifact.path().display());

    emit(&inference::run(&args.values, &artifact));
    Ok(())
}
