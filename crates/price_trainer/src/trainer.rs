//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Implements deterministic GBDT training with squared-error loss
//! and exact-greedy CART splits.

use crop_price_core::{BoostingConfig, Estimator, FeatureMatrix, GbdtModel, ModelError, Tree};
use tracing::{debug, info};

use crate::cart::{CartBuilder, TreeConfig};
use crate::deterministic::{sample_without_replacement, LcgRng};

/// GBDT trainer
#[derive(Clone, Debug)]
pub struct GbdtTrainer {
    config: BoostingConfig,
    seed: i64,
}

impl GbdtTrainer {
    pub fn new(config: BoostingConfig) -> Self {
        Self { config, seed: 42 }
    }

    /// Seed for row subsampling; unused when `subsample == 1.0`
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    /// Train a GBDT model on an encoded matrix
    pub fn train(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<GbdtModel, ModelError> {
        self.check_inputs(features, targets)?;

        let n_samples = targets.len();
        let init = mean(targets);
        let mut predictions = vec![init; n_samples];
        let hessians = vec![1.0; n_samples];

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
        };

        let sample_size = ((n_samples as f64 * self.config.subsample).round() as usize).max(1);
        let mut rng = LcgRng::new(self.seed);
        let all_rows: Vec<usize> = (0..n_samples).collect();

        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for stage in 0..self.config.n_estimators {
            let gradients = gradients(targets, &predictions);

            let rows = if sample_size < n_samples {
                sample_without_replacement(n_samples, sample_size, &mut rng)
            } else {
                all_rows.clone()
            };

            let builder =
                CartBuilder::new(features, &gradients, &hessians, tree_config.clone());
            let mut tree = builder.build(&rows);
            tree.weight = self.config.learning_rate;

            update_predictions(&tree, features, &mut predictions);
            trees.push(tree);

            let loss = mse(targets, &predictions);
            debug!("Stage {}: train MSE {:.4}", stage + 1, loss);
            if (stage + 1) % 10 == 0 || stage + 1 == self.config.n_estimators {
                info!(
                    "Trained tree {}/{} (train MSE {:.4})",
                    stage + 1,
                    self.config.n_estimators,
                    loss
                );
            }
        }

        Ok(GbdtModel::new(init, trees, features.n_cols()))
    }

    fn check_inputs(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<(), ModelError> {
        self.config
            .validate()
            .map_err(|err| ModelError::InvalidConfig(err.to_string()))?;

        if features.n_rows() != targets.len() {
            return Err(ModelError::TargetLengthMismatch {
                rows: features.n_rows(),
                targets: targets.len(),
            });
        }

        if targets.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        if let Some(row) = targets.iter().position(|t| !t.is_finite()) {
            return Err(ModelError::NonFiniteTarget(row));
        }

        Ok(())
    }
}

impl Estimator for GbdtTrainer {
    type Fitted = GbdtModel;

    fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<GbdtModel, ModelError> {
        self.train(features, targets)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Squared-error gradients: prediction - target (hessian is 1)
fn gradients(targets: &[f64], predictions: &[f64]) -> Vec<f64> {
    predictions.iter().zip(targets).map(|(p, y)| p - y).collect()
}

/// Add one stage's weighted output to every row's prediction
fn update_predictions(tree: &Tree, features: &FeatureMatrix, predictions: &mut [f64]) {
    for (pred, row) in predictions.iter_mut().zip(features.rows()) {
        *pred += tree.weight * tree.evaluate(row);
    }
}

fn mse(targets: &[f64], predictions: &[f64]) -> f64 {
    targets
        .iter()
        .zip(predictions)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>()
        / targets.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crop_price_core::Predictor;

    fn indicator_dataset() -> (FeatureMatrix, Vec<f64>) {
        // Columns: [Onion, Tomato]
        let features = FeatureMatrix::from_dense(
            2,
            &[
                vec![1.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.0, 1.0],
            ],
        );
        (features, vec![1500.0, 1500.0, 900.0, 900.0])
    }

    #[test]
    fn test_training_converges_on_indicator_data() {
        let (features, targets) = indicator_dataset();
        let config = BoostingConfig {
            n_estimators: 100,
            ..Default::default()
        };
        let model = GbdtTrainer::new(config).train(&features, &targets).unwrap();

        assert_eq!(model.init, 1200.0);
        assert_eq!(model.num_trees(), 100);
        assert!(model.validate().is_ok());

        let predictions = model.predict(&features).unwrap();
        // Residual shrinks by 0.9 per stage: 300 * 0.9^100 < 0.01
        assert!((predictions[0] - 1500.0).abs() < 0.01);
        assert!((predictions[2] - 900.0).abs() < 0.01);
    }

    #[test]
    fn test_first_stage_moves_by_learning_rate() {
        let (features, targets) = indicator_dataset();
        let config = BoostingConfig {
            n_estimators: 1,
            learning_rate: 0.5,
            ..Default::default()
        };
        let model = GbdtTrainer::new(config).train(&features, &targets).unwrap();
        let predictions = model.predict(&features).unwrap();

        assert!((predictions[0] - 1350.0).abs() < 1e-9);
        assert!((predictions[3] - 1050.0).abs() < 1e-9);
    }

    #[test]
    fn test_determinism_with_subsampling() {
        let dense: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 3 == 0) as u8 as f64, (i % 5 == 0) as u8 as f64, (i % 7) as f64])
            .collect();
        let features = FeatureMatrix::from_dense(3, &dense);
        let targets: Vec<f64> = (0..40).map(|i| 100.0 + (i * 37 % 11) as f64 * 10.0).collect();

        let config = BoostingConfig {
            n_estimators: 15,
            subsample: 0.5,
            ..Default::default()
        };
        let a = GbdtTrainer::new(config.clone()).with_seed(9).train(&features, &targets).unwrap();
        let b = GbdtTrainer::new(config).with_seed(9).train(&features, &targets).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_input_validation() {
        let (features, targets) = indicator_dataset();
        let trainer = GbdtTrainer::new(BoostingConfig::default());

        assert_eq!(
            trainer.train(&features, &targets[..3]),
            Err(ModelError::TargetLengthMismatch { rows: 4, targets: 3 })
        );
        assert_eq!(
            trainer.train(&FeatureMatrix::new(2), &[]),
            Err(ModelError::EmptyTrainingSet)
        );
        assert_eq!(
            trainer.train(&features, &[1.0, f64::NAN, 2.0, 3.0]),
            Err(ModelError::NonFiniteTarget(1))
        );

        let bad = GbdtTrainer::new(BoostingConfig {
            learning_rate: 0.0,
            ..Default::default()
        });
        assert!(matches!(
            bad.train(&features, &targets),
            Err(ModelError::InvalidConfig(_))
        ));
    }
}
