//! Model training
//!
//! The regression forest (bagged variance-splitting trees), its evaluation
//! metrics, and the pipeline turning an uploaded frame into a trained bundle.

pub mod decision_tree;
pub mod forest;
mod metrics;
mod pipeline;

pub use decision_tree::{RegressionTree, TreeNode};
pub use forest::RandomForest;
pub use metrics::{round_to, RegressionMetrics};
pub use pipeline::{
    train_bundle, TrainingOptions, CATEGORICAL_FEATURES, NUMERIC_FEATURES, TARGET_COLUMN,
};
