//! Single-record prediction

use crate::bundle::TrainedBundle;
use crate::error::{MpgError, Result};
use crate::preprocessing::UnknownCategoryPolicy;
use crate::training::round_to;
use ndarray::Array2;
use serde_json::{Map, Value};

/// Predict combined MPG for one input record.
///
/// The feature vector is assembled in the bundle's stored feature order;
/// numeric features coerce to f64, categorical features go through their
/// encoder with `policy` deciding what happens to unseen values. The result
/// is rounded to 2 decimal places.
pub fn predict_record(
    bundle: &TrainedBundle,
    record: &Map<String, Value>,
    policy: UnknownCategoryPolicy,
) -> Result<f64> {
    let mut row = Vec::with_capacity(bundle.features.len());

    for feature in &bundle.features {
        let value = record.get(feature).ok_or_else(|| {
            MpgError::BadInput(format!("missing feature: {}", feature))
        })?;

        let encoded = if let Some(encoder) = bundle.encoders.get(feature) {
            let label = value_to_label(value);
            encoder.encode(&label, policy)? as f64
        } else {
            coerce_numeric(feature, value)?
        };
        row.push(encoded);
    }

    let x = Array2::from_shape_vec((1, row.len()), row)
        .map_err(|e| MpgError::ShapeError {
            expected: format!("1 x {}", bundle.features.len()),
            actual: e.to_string(),
        })?;

    let prediction = bundle.forest.predict(&x)?;
    Ok(round_to(prediction[0], 2))
}

/// Coerce a JSON value into a float, or fail with `BadInput`.
fn coerce_numeric(feature: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            MpgError::BadInput(format!("{} is not a finite number", feature))
        }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            MpgError::BadInput(format!("{} must be numeric, got '{}'", feature, s))
        }),
        other => Err(MpgError::BadInput(format!(
            "{} must be numeric, got {}",
            feature, other
        ))),
    }
}

fn value_to_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_csv_bytes;
    use crate::training::{train_bundle, TrainingOptions};
    use serde_json::json;

    fn trained_bundle() -> TrainedBundle {
        let csv = b"cylinders,displacement,year,make,fuel_type,combination_mpg\n\
                    4,2.0,2018,toyota,gasoline,28\n\
                    6,3.5,2019,honda,gasoline,21\n\
                    8,5.0,2017,ford,gasoline,15\n\
                    4,1.8,2020,toyota,hybrid,45\n\
                    6,3.0,2016,ford,diesel,22\n\
                    4,2.5,2021,honda,gasoline,27\n";
        let df = read_csv_bytes(csv).unwrap();
        train_bundle(&df, &TrainingOptions::default().with_n_estimators(20)).unwrap()
    }

    fn record(make: &str, fuel: &str) -> Map<String, Value> {
        json!({
            "cylinders": 4,
            "displacement": 2.0,
            "year": 2019,
            "make": make,
            "fuel_type": fuel,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_predict_returns_rounded_scalar() {
        let bundle = trained_bundle();
        let prediction =
            predict_record(&bundle, &record("toyota", "gasoline"), UnknownCategoryPolicy::UseFirstClass)
                .unwrap();
        assert!(prediction > 0.0);
        assert_eq!(prediction, round_to(prediction, 2));
    }

    #[test]
    fn test_unseen_category_uses_fallback() {
        let bundle = trained_bundle();
        // "tesla" was never seen; the fallback class is "toyota" (code 0).
        let fallback =
            predict_record(&bundle, &record("tesla", "gasoline"), UnknownCategoryPolicy::UseFirstClass)
                .unwrap();
        let first_class =
            predict_record(&bundle, &record("toyota", "gasoline"), UnknownCategoryPolicy::UseFirstClass)
                .unwrap();
        assert_eq!(fallback, first_class);
    }

    #[test]
    fn test_unseen_category_rejected_under_reject_policy() {
        let bundle = trained_bundle();
        let err = predict_record(&bundle, &record("tesla", "gasoline"), UnknownCategoryPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, MpgError::BadInput(_)));
    }

    #[test]
    fn test_non_numeric_value_is_bad_input() {
        let bundle = trained_bundle();
        let mut rec = record("toyota", "gasoline");
        rec.insert("cylinders".to_string(), json!("four"));
        let err = predict_record(&bundle, &rec, UnknownCategoryPolicy::UseFirstClass).unwrap_err();
        assert!(matches!(err, MpgError::BadInput(_)));
    }

    #[test]
    fn test_numeric_string_is_coerced() {
        let bundle = trained_bundle();
        let mut rec = record("toyota", "gasoline");
        rec.insert("cylinders".to_string(), json!(" 4 "));
        assert!(predict_record(&bundle, &rec, UnknownCategoryPolicy::UseFirstClass).is_ok());
    }

    #[test]
    fn test_missing_feature_is_bad_input() {
        let bundle = trained_bundle();
        let mut rec = record("toyota", "gasoline");
        rec.remove("year");
        let err = predict_record(&bundle, &rec, UnknownCategoryPolicy::UseFirstClass).unwrap_err();
        assert!(matches!(err, MpgError::BadInput(_)));
    }
}
