//! End-to-end training run
//!
//! Load, clean, split, fit, evaluate, persist. Every failure is fatal and
//! surfaces as a [`TrainerError`].

use crop_price_core::{save_pipeline, FeatureSchema, OneHotEncoder, Pipeline, PriceConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::dataset::{load_csv, PriceDataset};
use crate::errors::TrainerError;
use crate::metrics::RegressionMetrics;
use crate::trainer::GbdtTrainer;

/// Summary of a completed training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows_loaded: usize,
    pub rows_used: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub encoded_features: usize,
    pub trees: usize,
    pub r2: Option<f64>,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub model_hash: String,
    pub artifact_path: PathBuf,
}

/// Fit a pipeline on the configured CSV and write the artifact.
pub fn train(config: &PriceConfig) -> Result<TrainingReport, TrainerError> {
    config.validate()?;
    let training = &config.training;

    info!("Step 1: Loading dataset from {}", training.input.display());
    let frame = load_csv(&training.input, &training.feature_columns)?;
    let rows_loaded = frame.n_rows();
    info!("Loaded {} rows with {} columns", rows_loaded, frame.n_cols());

    info!("Step 2: Cleaning dataset");
    let dataset = PriceDataset::prepare(frame, training)?;
    info!(
        "{} rows with a '{}' value remain",
        dataset.len(),
        training.target_column
    );
    for (column, count) in dataset.category_counts() {
        info!("  {}: {} categories", column, count);
    }

    info!(
        "Step 3: Splitting (test_size={}, seed={})",
        training.test_size, training.seed
    );
    let (train_set, test_set) = dataset.split(training.test_size, training.seed)?;
    info!(
        "Train rows: {}, test rows: {}",
        train_set.len(),
        test_set.len()
    );

    let gbdt = &training.gbdt;
    info!("Step 4: Training gradient boosting pipeline");
    info!("  Trees: {}", gbdt.n_estimators);
    info!("  Learning rate: {}", gbdt.learning_rate);
    info!("  Max depth: {}", gbdt.max_depth);
    info!("  Min samples split/leaf: {}/{}", gbdt.min_samples_split, gbdt.min_samples_leaf);
    info!("  Subsample: {}", gbdt.subsample);

    let schema = FeatureSchema::new(training.feature_columns.clone());
    let trainer = GbdtTrainer::new(gbdt.clone()).with_seed(training.seed);
    let pipeline = Pipeline::fit(
        schema,
        &OneHotEncoder::new(),
        &trainer,
        &train_set.features,
        &train_set.targets,
    )?;

    debug!("Encoded features: {}", pipeline.encoder().feature_names().join(", "));

    let predictions = pipeline.predict(&test_set.features)?;
    let metrics = RegressionMetrics::compute(&test_set.targets, &predictions);
    match metrics.r2 {
        Some(r2) => info!("Model R^2 score: {:.4}", r2),
        None => warn!("Model R^2 score: undefined for {} test rows", test_set.len()),
    }
    if let (Some(mae), Some(rmse)) = (metrics.mae, metrics.rmse) {
        info!("Test MAE: {:.2}, RMSE: {:.2}", mae, rmse);
    }

    let artifact_path = config.artifact.path();
    info!("Step 5: Saving pipeline to {}", artifact_path.display());
    let model_hash = save_pipeline(&pipeline, &artifact_path)?;
    info!("Model saved to {}", artifact_path.display());

    Ok(TrainingReport {
        rows_loaded,
        rows_used: dataset.len(),
        train_rows: train_set.len(),
        test_rows: test_set.len(),
        encoded_features: pipeline.encoder().n_features_out(),
        trees: pipeline.regressor().num_trees(),
        r2: metrics.r2,
        mae: metrics.mae,
        rmse: metrics.rmse,
        model_hash,
        artifact_path,
    })
}
