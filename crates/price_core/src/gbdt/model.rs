//! GBDT regression model
//!
//! Implements the fitted ensemble:
//! - Initial prediction (training target mean)
//! - Weighted sum of regression tree outputs
//! - Structural validation on load

use super::tree::Tree;
use crate::estimator::Predictor;
use crate::matrix::FeatureMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model format version
pub const MODEL_VERSION: i32 = 1;

/// Regressor fit and predict errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("Model expects {expected} features, got {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Feature matrix has {rows} rows but {targets} targets were given")]
    TargetLengthMismatch { rows: usize, targets: usize },

    #[error("Target value at row {0} is not finite")]
    NonFiniteTarget(usize),

    #[error("Invalid regressor configuration: {0}")]
    InvalidConfig(String),
}

/// Fitted gradient boosted regression ensemble
///
/// `score(x) = init + sum(tree.weight * tree.evaluate(x))`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtModel {
    /// Model format version
    pub version: i32,

    /// Baseline prediction before any tree
    pub init: f64,

    /// Boosting stages in fit order
    pub trees: Vec<Tree>,

    /// Width of the encoded feature rows the model was fitted on
    pub n_features: usize,
}

impl GbdtModel {
    pub fn new(init: f64, trees: Vec<Tree>, n_features: usize) -> Self {
        Self {
            version: MODEL_VERSION,
            init,
            trees,
            n_features,
        }
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != MODEL_VERSION {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if !self.init.is_finite() {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid init value: {}",
                self.init
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;

            if let Some(feature) = tree.max_feature_index() {
                if feature >= self.n_features {
                    return Err(ModelError::ValidationFailed(format!(
                        "Tree {} splits on feature {} but model has {} features",
                        i, feature, self.n_features
                    )));
                }
            }
        }

        Ok(())
    }

    /// Predict a single sparse row
    pub fn score(&self, row: &[(usize, f64)]) -> f64 {
        self.trees
            .iter()
            .fold(self.init, |acc, tree| acc + tree.weight * tree.evaluate(row))
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for GbdtModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        if features.n_cols() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                found: features.n_cols(),
            });
        }

        Ok(features.rows().map(|row| self.score(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tree::Node;

    fn create_test_model() -> GbdtModel {
        let tree1 = Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 1, 2),
                Node::leaf(1, 100.0),
                Node::leaf(2, 200.0),
            ],
            0.1,
        );

        let tree2 = Tree::new(
            vec![
                Node::internal(0, 1, 0.5, 1, 2),
                Node::leaf(1, -50.0),
                Node::leaf(2, 50.0),
            ],
            0.1,
        );

        GbdtModel::new(1000.0, vec![tree1, tree2], 3)
    }

    #[test]
    fn test_model_creation() {
        let model = create_test_model();
        assert_eq!(model.version, MODEL_VERSION);
        assert_eq!(model.num_trees(), 2);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_model_inference() {
        let model = create_test_model();

        // 1000 + 0.1 * 100 + 0.1 * -50
        assert!((model.score(&[]) - 1005.0).abs() < 1e-9);
        // 1000 + 0.1 * 200 + 0.1 * 50
        assert!((model.score(&[(0, 1.0), (1, 1.0)]) - 1025.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_checks_width() {
        let model = create_test_model();
        let wrong = FeatureMatrix::new(2);
        assert_eq!(
            model.predict(&wrong),
            Err(ModelError::FeatureCountMismatch {
                expected: 3,
                found: 2
            })
        );

        let matrix = FeatureMatrix::from_dense(3, &[vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]]);
        let predictions = model.predict(&matrix).unwrap();
        assert_eq!(predictions.len(), 2);
        assert!((predictions[0] - 1015.0).abs() < 1e-9);
        assert!((predictions[1] - 1005.0).abs() < 1e-9);
    }

    #[test]
    fn test_model_validation() {
        let mut invalid = create_test_model();
        invalid.version = 999;
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.init = f64::INFINITY;
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.n_features = 1;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_predictions() {
        let original = create_test_model();
        let json = serde_json::to_string(&original).unwrap();
        let restored: GbdtModel = serde_json::from_str(&json).unwrap();

        assert_eq!(original, restored);
        assert_eq!(original.score(&[(1, 1.0)]), restored.score(&[(1, 1.0)]));
    }
}
