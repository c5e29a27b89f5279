//! Regressor seam of the pipeline
//!
//! The pipeline only knows how to fit an [`Estimator`] on an encoded matrix
//! and how to ask the resulting [`Predictor`] for values. Any regression
//! algorithm implementing the pair can replace the GBDT without touching the
//! encoder, the artifact format of the surrounding pipeline, or the inference
//! contract.

use crate::gbdt::ModelError;
use crate::matrix::FeatureMatrix;

/// Trainable regressor configuration
pub trait Estimator {
    type Fitted: Predictor;

    fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<Self::Fitted, ModelError>;
}

/// Fitted regressor
pub trait Predictor {
    /// Encoded width the predictor was fitted on
    fn n_features(&self) -> usize;

    /// One prediction per matrix row
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError>;
}
