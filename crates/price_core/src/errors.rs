//! Error types for the inference path

use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::pipeline::PipelineError;

/// Everything that can go wrong answering one prediction request.
///
/// None of these are fatal: the inference entry point turns each into a
/// structured `{"error": ...}` result.
#[derive(Error, Debug)]
pub enum PredictError {
    /// No artifact at the configured path
    #[error("Model not found. Please train the model first.")]
    ModelNotTrained,

    /// Artifact present but unreadable, corrupt or incompatible
    #[error("{0}")]
    ArtifactLoad(#[from] ArtifactError),

    /// Loaded pipeline rejected the request
    #[error("{0}")]
    Prediction(#[from] PipelineError),

    /// Wrong positional argument count at the CLI
    #[error("Invalid number of arguments.")]
    InvalidArguments,
}

/// Result type for inference operations
pub type Result<T> = std::result::Result<T, PredictError>;
