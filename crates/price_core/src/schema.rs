//! Feature schema shared by training and inference
//!
//! The fitted pipeline binds to the exact column names and order it was
//! trained on. Inference frames are checked against the stored schema before
//! encoding, so a renamed or reordered column is an error rather than a
//! silently wrong prediction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::{Frame, FrameError};

pub const STATE: &str = "State";
pub const DISTRICT: &str = "District";
pub const COMMODITY: &str = "Commodity";
pub const MODAL_PRICE: &str = "Modal Price";

/// Default model inputs, in order
pub const DEFAULT_FEATURE_COLUMNS: [&str; 3] = [STATE, DISTRICT, COMMODITY];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("feature columns {found:?} do not match schema {expected:?}")]
    Mismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("expected {expected} feature values, got {found}")]
    Arity { expected: usize, found: usize },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Ordered feature column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Require `frame` to carry exactly the schema columns, in schema order.
    pub fn validate(&self, frame: &Frame) -> Result<(), SchemaError> {
        if frame.column_names() != self.columns.as_slice() {
            return Err(SchemaError::Mismatch {
                expected: self.columns.clone(),
                found: frame.column_names().to_vec(),
            });
        }
        Ok(())
    }

    /// Build a one-row frame from values given in schema order.
    pub fn row<V: AsRef<str>>(&self, values: &[V]) -> Result<Frame, SchemaError> {
        if values.len() != self.columns.len() {
            return Err(SchemaError::Arity {
                expected: self.columns.len(),
                found: values.len(),
            });
        }

        let cells: Vec<(&str, &str)> = self
            .columns
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(AsRef::as_ref))
            .collect();

        Ok(Frame::from_row(&cells)?)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_COLUMNS)
    }
}
