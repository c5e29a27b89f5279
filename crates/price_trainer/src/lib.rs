//! Crop price trainer - deterministic offline GBDT pipeline fitting
//!
//! Loads a price history CSV, cleans it, fits a one-hot + gradient boosted
//! tree pipeline on a seeded train split, reports held-out R² and writes the
//! artifact the predictor loads.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod metrics;
pub mod trainer;
pub mod training;

pub use dataset::{load_csv, PriceDataset};
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use metrics::{r2_score, RegressionMetrics};
pub use trainer::GbdtTrainer;
pub use training::{train, TrainingReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
