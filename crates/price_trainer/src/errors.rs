use crop_price_core::{ArtifactError, ConfigError, FrameError, PipelineError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the trainer. All of them abort the training run.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("input file '{}' not found", .0.display())]
    MissingInputFile(PathBuf),

    #[error("required column '{0}' not found in dataset")]
    MissingRequiredColumn(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("dataset error: {0}")]
    Frame(#[from] FrameError),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("training error: {0}")]
    Training(#[from] PipelineError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
