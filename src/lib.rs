//! MPG prediction service
//!
//! Trains a random-forest regressor on uploaded car data and serves
//! combined-fuel-economy predictions over HTTP.
//!
//! # Modules
//!
//! - [`preprocessing`] - categorical encoding
//! - [`training`] - regression forest, metrics, and the training pipeline
//! - [`inference`] - single-record prediction
//! - [`bundle`] - the persisted training artifact
//! - [`store`] - injectable bundle persistence (file-backed or in-memory)
//! - [`history`] - append-only prediction log
//! - [`data`] - CSV loading and frame helpers
//! - [`server`] - HTTP server with REST API and embedded web UI
//! - [`cli`] - command-line interface

pub mod bundle;
pub mod cli;
pub mod data;
pub mod error;
pub mod history;
pub mod inference;
pub mod preprocessing;
pub mod server;
pub mod store;
pub mod training;

pub use error::{MpgError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bundle::TrainedBundle;
    pub use crate::error::{MpgError, Result};
    pub use crate::history::HistoryLog;
    pub use crate::inference::predict_record;
    pub use crate::preprocessing::{CategoryEncoder, UnknownCategoryPolicy};
    pub use crate::store::{FileModelStore, InMemoryModelStore, ModelStore};
    pub use crate::training::{train_bundle, RandomForest, RegressionMetrics, TrainingOptions};
}
