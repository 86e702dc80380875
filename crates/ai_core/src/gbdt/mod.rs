//! Gradient boosted decision tree inference
//!
//! A [`Model`] is a list of regression [`Tree`]s over a dense `f64` feature
//! vector plus a log-odds bias. Scoring walks every tree (go left when
//! `feature <= threshold`), sums the weighted leaves and applies the logistic
//! function. Models serialize to canonical JSON:
//!
//! ```json
//! {
//!   "bias": -2.31,
//!   "metadata": { "columns_hash": "…", "feature_count": 29, … },
//!   "objective": "binary_logistic",
//!   "trees": [
//!     { "nodes": [ {"feature_idx":0,"id":0,"leaf":null,"left":1,"right":2,"threshold":1450.5}, … ],
//!       "weight": 0.05 }
//!   ],
//!   "version": 1
//! }
//! ```

pub mod model;
pub mod tree;

pub use model::{logit, sigmoid, Model, ModelError, ModelMetadata, Objective, MODEL_FORMAT_VERSION};
pub use tree::{Node, Tree};
