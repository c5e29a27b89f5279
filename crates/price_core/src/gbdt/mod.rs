//! Gradient boosted regression trees
//!
//! Fitted models are plain data: a baseline value plus a list of weighted
//! regression trees over sparse encoded rows. Fitting lives in the trainer
//! crate; this module only evaluates and validates.
//!
//! # Usage
//!
//! ```rust
//! use crop_price_core::gbdt::{GbdtModel, Node, Tree};
//!
//! let tree = Tree::new(
//!     vec![
//!         Node::internal(0, 0, 0.5, 1, 2),
//!         Node::leaf(1, -100.0),
//!         Node::leaf(2, 100.0),
//!     ],
//!     0.1,
//! );
//! let model = GbdtModel::new(1500.0, vec![tree], 2);
//!
//! assert!((model.score(&[(0, 1.0)]) - 1510.0).abs() < 1e-9);
//! assert!((model.score(&[]) - 1490.0).abs() < 1e-9);
//! ```

pub mod model;
pub mod tree;

pub use model::{GbdtModel, ModelError, MODEL_VERSION};
pub use tree::{Node, Tree};
