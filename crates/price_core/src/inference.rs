//! Single-request price inference
//!
//! [`PricePredictor`] answers one `(state, district, commodity)` request from
//! the artifact named by its [`ArtifactConfig`]. [`PricePredictor::outcome`]
//! and [`run`] never fail: every error becomes a
//! [`PredictionOutcome::Error`], so callers always get a well-formed result.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::artifact::load_pipeline;
use crate::config::ArtifactConfig;
use crate::errors::{PredictError, Result};

/// One prediction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub state: String,
    pub district: String,
    pub commodity: String,
}

impl PredictionRequest {
    pub fn new(
        state: impl Into<String>,
        district: impl Into<String>,
        commodity: impl Into<String>,
    ) -> Self {
        Self {
            state: state.into(),
            district: district.into(),
            commodity: commodity.into(),
        }
    }

    /// Exactly three positional values, in `state district crop` order.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        match args {
            [state, district, commodity] => Ok(Self::new(
                state.as_ref(),
                district.as_ref(),
                commodity.as_ref(),
            )),
            _ => Err(PredictError::InvalidArguments),
        }
    }

    /// Values in feature schema order
    pub fn values(&self) -> [&str; 3] {
        [self.state.as_str(), self.district.as_str(), self.commodity.as_str()]
    }
}

/// Either a formatted price or an error message, never both.
///
/// Serializes as `{"predicted_price": "1234.50"}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionOutcome {
    PredictedPrice(String),
    Error(String),
}

impl PredictionOutcome {
    pub fn from_result(result: Result<f64>) -> Self {
        match result {
            Ok(price) => PredictionOutcome::PredictedPrice(format_price(price)),
            Err(err) => PredictionOutcome::Error(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PredictionOutcome::Error(_))
    }

    /// Single-line JSON object
    pub fn to_json(&self) -> String {
        let value = match self {
            PredictionOutcome::PredictedPrice(price) => {
                serde_json::json!({ "predicted_price": price })
            }
            PredictionOutcome::Error(message) => serde_json::json!({ "error": message }),
        };
        value.to_string()
    }
}

/// Render a price with exactly two decimals.
pub fn format_price(value: f64) -> String {
    format!("{value:.2}")
}

/// Loads the configured artifact and predicts single requests
#[derive(Debug, Clone, Default)]
pub struct PricePredictor {
    artifact: ArtifactConfig,
}

impl PricePredictor {
    pub fn new(artifact: ArtifactConfig) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &ArtifactConfig {
        &self.artifact
    }

    /// Predict the modal price for `request`.
    pub fn predict(&self, request: &PredictionRequest) -> Result<f64> {
        let path = self.artifact.path();
        if !path.exists() {
            return Err(PredictError::ModelNotTrained);
        }

        let pipeline = load_pipeline(&path)?;
        let price = pipeline.predict_one(&request.values())?;

        debug!(
            "Predicted {:.4} for {} / {} / {}",
            price, request.state, request.district, request.commodity
        );
        Ok(price)
    }

    /// Like [`PricePredictor::predict`], with errors folded into the outcome.
    pub fn outcome(&self, request: &PredictionRequest) -> PredictionOutcome {
        let result = self.predict(request);
        if let Err(err) = &result {
            warn!("Prediction failed: {}", err);
        }
        PredictionOutcome::from_result(result)
    }
}

/// Command-line entry: validate the positional arguments, then predict.
///
/// The artifact is not touched unless exactly three arguments are given.
pub fn run<S: AsRef<str>>(args: &[S], artifact: &ArtifactConfig) -> PredictionOutcome {
    match PredictionRequest::from_args(args) {
        Ok(request) => PricePredictor::new(artifact.clone()).outcome(&request),
        Err(err) => PredictionOutcome::from_result(Err(err)),
    }
}
