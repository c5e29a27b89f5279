//! Crop price model core
//!
//! Everything needed to answer a modal price prediction from a fitted
//! pipeline, plus the pieces the trainer fits and persists.
//!
//! Modules:
//! - `frame`: Typed tabular values with shape validation
//! - `schema`: Feature column contract shared by training and inference
//! - `encoding`: One-hot encoder tolerant of unseen categories
//! - `gbdt`: Gradient boosted regression tree model
//! - `estimator`: Fit/predict traits the pipeline is generic over
//! - `pipeline`: Encoder + regressor composition
//! - `artifact`: Hashed canonical JSON persistence
//! - `config`: TOML configuration
//! - `inference`: Single-request prediction with structured outcomes

pub mod artifact;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod estimator;
pub mod frame;
pub mod gbdt;
pub mod inference;
pub mod matrix;
pub mod pipeline;
pub mod schema;
pub mod serde_canon;

pub use artifact::{load_artifact, load_pipeline, save_pipeline, ArtifactError, PipelineArtifact};
pub use config::{ArtifactConfig, BoostingConfig, ConfigError, PriceConfig, TrainingConfig};
pub use encoding::{EncodingError, FittedOneHotEncoder, HandleUnknown, OneHotEncoder};
pub use errors::PredictError;
pub use estimator::{Estimator, Predictor};
pub use frame::{Column, Frame, FrameError};
pub use gbdt::{GbdtModel, ModelError, Node, Tree};
pub use inference::{format_price, PredictionOutcome, PredictionRequest, PricePredictor};
pub use matrix::FeatureMatrix;
pub use pipeline::{Pipeline, PipelineError};
pub use schema::{FeatureSchema, SchemaError, DEFAULT_FEATURE_COLUMNS};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
