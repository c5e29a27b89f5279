//! Encoder + regressor pipeline
//!
//! A [`Pipeline`] is fitted and persisted as one unit. Callers hand it raw
//! categorical frames; the stored schema is checked, the frame is one-hot
//! encoded, and the regressor produces one value per row.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::{EncodingError, FittedOneHotEncoder, OneHotEncoder};
use crate::estimator::{Estimator, Predictor};
use crate::frame::Frame;
use crate::gbdt::{GbdtModel, ModelError};
use crate::schema::{FeatureSchema, SchemaError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("encoder produces {encoded} features but regressor expects {expected}")]
    WidthMismatch { encoded: usize, expected: usize },

    #[error("regressor returned no prediction")]
    EmptyPrediction,
}

/// Fitted preprocessing and regression stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline<P = GbdtModel> {
    schema: FeatureSchema,
    encoder: FittedOneHotEncoder,
    regressor: P,
}

impl<P: Predictor> Pipeline<P> {
    /// Fit the encoder on `frame`, then the regressor on the encoded matrix.
    pub fn fit<E>(
        schema: FeatureSchema,
        encoder: &OneHotEncoder,
        estimator: &E,
        frame: &Frame,
        targets: &[f64],
    ) -> Result<Self, PipelineError>
    where
        E: Estimator<Fitted = P>,
    {
        let encoder = encoder.fit(&schema, frame)?;
        let matrix = encoder.transform(frame)?;

        tracing::info!(
            "Encoded {} rows into {} indicator features",
            matrix.n_rows(),
            matrix.n_cols()
        );

        let regressor = estimator.fit(&matrix, targets)?;
        Self::from_parts(schema, encoder, regressor)
    }

    /// Assemble a pipeline from already fitted stages.
    pub fn from_parts(
        schema: FeatureSchema,
        encoder: FittedOneHotEncoder,
        regressor: P,
    ) -> Result<Self, PipelineError> {
        if encoder.n_features_out() != regressor.n_features() {
            return Err(PipelineError::WidthMismatch {
                encoded: encoder.n_features_out(),
                expected: regressor.n_features(),
            });
        }

        Ok(Self {
            schema,
            encoder,
            regressor,
        })
    }

    /// Predict every row of `frame`, which must match the schema exactly.
    pub fn predict(&self, frame: &Frame) -> Result<Vec<f64>, PipelineError> {
        self.schema.validate(frame)?;
        let matrix = self.encoder.transform(frame)?;
        Ok(self.regressor.predict(&matrix)?)
    }

    /// Predict a single row given as values in schema order.
    pub fn predict_one<V: AsRef<str>>(&self, values: &[V]) -> Result<f64, PipelineError> {
        let frame = self.schema.row(values)?;
        self.predict(&frame)?
            .first()
            .copied()
            .ok_or(PipelineError::EmptyPrediction)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encoder(&self) -> &FittedOneHotEncoder {
        &self.encoder
    }

    pub fn regressor(&self) -> &P {
        &self.regressor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Column;
    use crate::matrix::FeatureMatrix;

    /// Predicts the training mean plus a per-feature average offset
    struct OffsetEstimator;

    struct OffsetModel {
        mean: f64,
        offsets: Vec<f64>,
    }

    impl Estimator for OffsetEstimator {
        type Fitted = OffsetModel;

        fn fit(&self, features: &FeatureMatrix, targets: &[f64]) -> Result<OffsetModel, ModelError> {
            if targets.is_empty() {
                return Err(ModelError::EmptyTrainingSet);
            }
            let mean = targets.iter().sum::<f64>() / targets.len() as f64;
            let mut sums = vec![0.0; features.n_cols()];
            let mut counts = vec![0usize; features.n_cols()];
            for (row, &y) in features.rows().zip(targets) {
                for &(col, _) in row {
                    sums[col] += y - mean;
                    counts[col] += 1;
                }
            }
            let offsets = sums
                .iter()
                .zip(&counts)
                .map(|(s, &c)| if c == 0 { 0.0 } else { s / c as f64 })
                .collect();
            Ok(OffsetModel { mean, offsets })
        }
    }

    impl Predictor for OffsetModel {
        fn n_features(&self) -> usize {
            self.offsets.len()
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
            Ok(features
                .rows()
                .map(|row| self.mean + row.iter().map(|&(c, _)| self.offsets[c]).sum::<f64>())
                .collect())
        }
    }

    fn training_frame() -> (Frame, Vec<f64>) {
        let frame = Frame::new(vec![
            (
                "State".to_string(),
                Column::categorical(["Maharashtra", "Maharashtra", "Gujarat", "Gujarat"]),
            ),
            (
                "District".to_string(),
                Column::categorical(["Pune", "Pune", "Surat", "Rajkot"]),
            ),
            (
                "Commodity".to_string(),
                Column::categorical(["Onion", "Onion", "Cotton", "Cotton"]),
            ),
        ])
        .unwrap();
        (frame, vec![1500.0, 1520.0, 6000.0, 6100.0])
    }

    fn fitted() -> Pipeline<OffsetModel> {
        let (frame, targets) = training_frame();
        Pipeline::fit(
            FeatureSchema::default(),
            &OneHotEncoder::new(),
            &OffsetEstimator,
            &frame,
            &targets,
        )
        .unwrap()
    }

    #[test]
    fn test_fit_and_predict_any_estimator() {
        let pipeline = fitted();
        assert_eq!(pipeline.encoder().n_features_out(), 7);

        let (frame, _) = training_frame();
        let predictions = pipeline.predict(&frame).unwrap();
        assert_eq!(predictions.len(), 4);
        assert!(predictions[0] < predictions[2]);
    }

    #[test]
    fn test_unseen_row_predicts_baseline() {
        let pipeline = fitted();
        let value = pipeline.predict_one(&["Mars", "Crater", "Moonrock"]).unwrap();
        assert!((value - 3780.0).abs() < 1e-9);
    }

    #[test]
    fn test_schema_mismatch_is_reported() {
        let pipeline = fitted();
        let reordered = Frame::from_row(&[
            ("Commodity", "Onion"),
            ("State", "Maharashtra"),
            ("District", "Pune"),
        ])
        .unwrap();

        assert!(matches!(
            pipeline.predict(&reordered),
            Err(PipelineError::Schema(SchemaError::Mismatch { .. }))
        ));
    }

    #[test]
    fn test_from_parts_checks_width() {
        let pipeline = fitted();
        let narrow = OffsetModel {
            mean: 0.0,
            offsets: vec![0.0; 2],
        };
        let result = Pipeline::from_parts(
            pipeline.schema().clone(),
            pipeline.encoder().clone(),
            narrow,
        );
        assert!(matches!(
            result,
            Err(PipelineError::WidthMismatch {
                encoded: 7,
                expected: 2
            })
        ));
    }
}
