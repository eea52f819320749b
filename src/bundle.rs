//! The persisted training artifact

use crate::preprocessing::CategoryEncoder;
use crate::training::{RandomForest, RegressionMetrics};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything a prediction needs, produced by one training run.
///
/// A bundle is immutable once built; retraining replaces it wholesale through
/// the model store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedBundle {
    /// The fitted regressor
    pub forest: RandomForest,
    /// One encoder per categorical feature present at training time
    pub encoders: HashMap<String, CategoryEncoder>,
    /// Feature names in the positional order the forest was trained with
    pub features: Vec<String>,
    /// Held-out evaluation metrics, rounded to 3 decimal places
    pub metrics: RegressionMetrics,
}

impl TrainedBundle {
    /// Whether `feature` was encoded (categorical) rather than numeric.
    pub fn is_categorical(&self, feature: &str) -> bool {
        self.encoders.contains_key(feature)
    }

    /// Categorical feature names in training order with their class lists.
    pub fn category_options(&self) -> Vec<(&str, &[String])> {
        self.features
            .iter()
            .filter_map(|name| {
                self.encoders
                    .get(name)
                    .map(|enc| (name.as_str(), enc.classes()))
            })
            .collect()
    }
}
