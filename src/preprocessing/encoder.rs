//! Categorical encoding

use crate::error::{MpgError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Policy for categorical values never seen during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownCategoryPolicy {
    /// Substitute the first class observed during fitting (code 0).
    UseFirstClass,
    /// Reject the record with a `BadInput` error.
    Reject,
}

impl Default for UnknownCategoryPolicy {
    fn default() -> Self {
        UnknownCategoryPolicy::UseFirstClass
    }
}

/// Deterministic string-to-integer encoder for one categorical column.
///
/// Codes are assigned in order of first occurrence, so `classes()[0]` is the
/// first distinct value seen during fitting and always encodes to 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
    is_fitted: bool,
}

impl CategoryEncoder {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            codes: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the encoder to a string column.
    pub fn fit(&mut self, series: &Series) -> Result<&mut Self> {
        let ca = series
            .str()
            .map_err(|e| MpgError::DataError(e.to_string()))?;

        self.classes.clear();
        self.codes.clear();

        for val in ca.into_iter().flatten() {
            if !self.codes.contains_key(val) {
                self.codes.insert(val.to_string(), self.classes.len());
                self.classes.push(val.to_string());
            }
        }

        if self.classes.is_empty() {
            return Err(MpgError::DataError(
                "cannot fit an encoder on an empty column".to_string(),
            ));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Encode every value of a fitted column to its integer code.
    pub fn transform(&self, series: &Series) -> Result<Vec<i64>> {
        if !self.is_fitted {
            return Err(MpgError::ModelNotFitted);
        }

        let ca = series
            .str()
            .map_err(|e| MpgError::DataError(e.to_string()))?;

        ca.into_iter()
            .map(|v| {
                let val = v.ok_or_else(|| {
                    MpgError::DataError("null value in categorical column".to_string())
                })?;
                self.codes
                    .get(val)
                    .map(|&c| c as i64)
                    .ok_or_else(|| MpgError::FeatureNotFound(val.to_string()))
            })
            .collect()
    }

    /// Encode a single value, applying `policy` to unknown values.
    pub fn encode(&self, value: &str, policy: UnknownCategoryPolicy) -> Result<usize> {
        if !self.is_fitted {
            return Err(MpgError::ModelNotFitted);
        }

        match self.codes.get(value) {
            Some(&code) => Ok(code),
            None => match policy {
                UnknownCategoryPolicy::UseFirstClass => Ok(0),
                UnknownCategoryPolicy::Reject => Err(MpgError::BadInput(format!(
                    "unknown categorical value: {}",
                    value
                ))),
            },
        }
    }

    /// Classes in first-occurrence order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn first_class(&self) -> Option<&str> {
        self.classes.first().map(|s| s.as_str())
    }
}

impl Default for CategoryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted_encoder() -> CategoryEncoder {
        let series = Series::new(
            "make".into(),
            &["toyota", "honda", "toyota", "ford", "honda"],
        );
        let mut encoder = CategoryEncoder::new();
        encoder.fit(&series).unwrap();
        encoder
    }

    #[test]
    fn test_first_occurrence_order() {
        let encoder = fitted_encoder();
        assert_eq!(encoder.classes(), &["toyota", "honda", "ford"]);
        assert_eq!(
            encoder.encode("honda", UnknownCategoryPolicy::Reject).unwrap(),
            1
        );
    }

    #[test]
    fn test_unknown_falls_back_to_first_class() {
        let encoder = fitted_encoder();
        let code = encoder
            .encode("tesla", UnknownCategoryPolicy::UseFirstClass)
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(encoder.first_class(), Some("toyota"));
    }

    #[test]
    fn test_unknown_rejected_under_reject_policy() {
        let encoder = fitted_encoder();
        let err = encoder
            .encode("tesla", UnknownCategoryPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, MpgError::BadInput(_)));
    }

    #[test]
    fn test_transform_column() {
        let encoder = fitted_encoder();
        let series = Series::new("make".into(), &["ford", "toyota"]);
        assert_eq!(encoder.transform(&series).unwrap(), vec![2, 0]);
    }
}
