//! One-hot encoding for categorical feature columns
//!
//! Each schema column learns its sorted set of categories at fit time. A row
//! encodes to one indicator per column, laid out column after column in the
//! output matrix. Categories never seen during fitting either encode to the
//! all-zero block for that column ([`HandleUnknown::Ignore`]) or raise
//! [`EncodingError::UnknownCategory`] ([`HandleUnknown::Error`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::frame::{Frame, FrameError};
use crate::matrix::FeatureMatrix;
use crate::schema::{FeatureSchema, SchemaError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("cannot fit encoder on empty data")]
    EmptyInput,

    #[error("encoder was fitted on {expected} columns, got {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Strategy for categories absent from the fitted vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Encode to an all-zero block
    #[default]
    Ignore,
    /// Fail the transform
    Error,
}

/// Unfitted one-hot encoder
#[derive(Debug, Clone, Default)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }

    /// Learn the categories of every schema column in `frame`.
    ///
    /// Missing cells contribute no category.
    pub fn fit(
        &self,
        schema: &FeatureSchema,
        frame: &Frame,
    ) -> Result<FittedOneHotEncoder, EncodingError> {
        schema.validate(frame)?;
        if frame.is_empty() {
            return Err(EncodingError::EmptyInput);
        }

        let mut columns = Vec::with_capacity(schema.len());
        let mut categories = Vec::with_capacity(schema.len());

        for (name, column) in frame.columns() {
            let unique: BTreeSet<String> =
                (0..frame.n_rows()).filter_map(|row| column.category(row)).collect();
            columns.push(name.to_string());
            categories.push(unique.into_iter().collect::<Vec<_>>());
        }

        tracing::debug!(
            "Fitted one-hot encoder: {}",
            columns
                .iter()
                .zip(&categories)
                .map(|(name, cats)| format!("{name}={}", cats.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(FittedOneHotEncoder {
            columns,
            categories,
            handle_unknown: self.handle_unknown,
        })
    }
}

/// Fitted encoder with a sorted vocabulary per column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedOneHotEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    /// Width of the encoded output (sum of vocabulary sizes)
    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Output column names, `"<column>=<category>"`
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, cats)| cats.iter().map(move |cat| format!("{name}={cat}")))
            .collect()
    }

    /// Encode `frame` (columns positionally aligned with the fitted columns).
    pub fn transform(&self, frame: &Frame) -> Result<FeatureMatrix, EncodingError> {
        if frame.n_cols() != self.categories.len() {
            return Err(EncodingError::ColumnCountMismatch {
                expected: self.categories.len(),
                found: frame.n_cols(),
            });
        }

        let mut offsets = Vec::with_capacity(self.categories.len());
        let mut width = 0;
        for cats in &self.categories {
            offsets.push(width);
            width += cats.len();
        }

        let mut matrix = FeatureMatrix::new(width);
        let columns: Vec<_> = frame.columns().collect();

        for row in 0..frame.n_rows() {
            let mut entries = Vec::with_capacity(columns.len());

            for (col_idx, (name, column)) in columns.iter().enumerate() {
                let Some(value) = column.category(row) else {
                    continue;
                };

                match self.categories[col_idx].binary_search(&value) {
                    Ok(pos) => entries.push((offsets[col_idx] + pos, 1.0)),
                    Err(_) => match self.handle_unknown {
                        HandleUnknown::Ignore => {
                            tracing::debug!("Unknown category '{}' in column '{}'", value, name);
                        }
                        HandleUnknown::Error => {
                            return Err(EncodingError::UnknownCategory {
                                column: name.to_string(),
                                value,
                            });
                        }
                    },
                }
            }

            matrix.push_row(entries);
        }

        Ok(matrix)
    }
}
