//! Configuration for training and inference
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! reproduces the stock behaviour: read `prices.csv`, write
//! `model_files/gradient_boosting_model.joblib`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::schema::{DEFAULT_FEATURE_COLUMNS, MODAL_PRICE};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PriceConfig {
    /// Where the fitted pipeline lives
    pub artifact: ArtifactConfig,
    /// Dataset and regressor settings
    pub training: TrainingConfig,
}

/// Artifact location, shared by the trainer and the predictor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub file_name: String,
}

impl ArtifactConfig {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self::new("model_files", "gradient_boosting_model.joblib")
    }
}

/// Dataset handling and evaluation split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Input CSV path
    pub input: PathBuf,
    /// Regression target column
    pub target_column: String,
    /// Model inputs, in schema order
    pub feature_columns: Vec<String>,
    /// Replacement for missing cells after target filtering
    pub missing_sentinel: String,
    /// Held-out fraction for evaluation
    pub test_size: f64,
    /// Seed for the train/test shuffle and row subsampling
    pub seed: i64,
    /// Regressor hyperparameters
    pub gbdt: BoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("prices.csv"),
            target_column: MODAL_PRICE.to_string(),
            feature_columns: DEFAULT_FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            missing_sentinel: "Unknown".to_string(),
            test_size: 0.2,
            seed: 42,
            gbdt: BoostingConfig::default(),
        }
    }
}

/// Gradient boosting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Number of sequential trees
    pub n_estimators: usize,
    /// Shrinkage applied to every tree's output
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Smallest node that may still be split
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn for each tree (1.0 disables sampling)
    pub subsample: f64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 1.0,
        }
    }
}

impl BoostingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_estimators == 0 {
            return Err(ConfigError::Invalid("n_estimators must be at least 1".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.min_samples_split < 2 {
            return Err(ConfigError::Invalid("min_samples_split must be at least 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(ConfigError::Invalid("min_samples_leaf must be at least 1".into()));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        Ok(())
    }
}

impl PriceConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let training = &self.training;

        if self.artifact.file_name.is_empty() {
            return Err(ConfigError::Invalid("artifact file_name must not be empty".into()));
        }
        if training.feature_columns.is_empty() {
            return Err(ConfigError::Invalid("feature_columns must not be empty".into()));
        }
        if training.feature_columns.contains(&training.target_column) {
            return Err(ConfigError::Invalid(format!(
                "target column '{}' cannot also be a feature",
                training.target_column
            )));
        }
        if !(training.test_size > 0.0 && training.test_size < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test_size must be in (0, 1), got {}",
                training.test_size
            )));
        }

        training.gbdt.validate()
    }
}
