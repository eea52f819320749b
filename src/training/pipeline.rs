//! Training pipeline: uploaded frame to trained bundle

use crate::bundle::TrainedBundle;
use crate::data;
use crate::error::{MpgError, Result};
use crate::preprocessing::CategoryEncoder;
use super::forest::RandomForest;
use super::metrics::RegressionMetrics;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// Required numeric features, in training order.
pub const NUMERIC_FEATURES: [&str; 3] = ["cylinders", "displacement", "year"];

/// Optional categorical features, appended after the numeric block when
/// present. The order is fixed because the forest indexes features
/// positionally.
pub const CATEGORICAL_FEATURES: [&str; 3] = ["make", "fuel_type", "transmission"];

/// The regression target.
pub const TARGET_COLUMN: &str = "combination_mpg";

const CITY_COLUMN: &str = "city_mpg";
const HIGHWAY_COLUMN: &str = "highway_mpg";

/// Knobs for one training run.
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    /// Fraction of rows held out for validation
    pub validation_split: f64,
    /// Seed for the shuffle split and the forest
    pub seed: u64,
    /// Number of trees
    pub n_estimators: usize,
    /// Optional per-tree depth cap
    pub max_depth: Option<usize>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            validation_split: 0.2,
            seed: 42,
            n_estimators: 100,
            max_depth: None,
        }
    }
}

impl TrainingOptions {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Train a bundle from a raw uploaded frame.
///
/// Normalizes headers, derives the target when only city/highway values are
/// given, drops incomplete rows, fits the encoders and the forest, and
/// evaluates on a seeded 80/20 hold-out.
pub fn train_bundle(df: &DataFrame, opts: &TrainingOptions) -> Result<TrainedBundle> {
    let start = Instant::now();

    let mut df = df.clone();
    data::normalize_column_names(&mut df)?;
    let df = ensure_target(df)?;

    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for required in NUMERIC_FEATURES {
        if !column_names.iter().any(|c| c == required) {
            return Err(MpgError::FeatureNotFound(required.to_string()));
        }
    }

    let categorical: Vec<String> = CATEGORICAL_FEATURES
        .iter()
        .filter(|f| column_names.iter().any(|c| c == *f))
        .map(|f| f.to_string())
        .collect();

    let mut features: Vec<String> =
        NUMERIC_FEATURES.iter().map(|f| f.to_string()).collect();
    features.extend(categorical.iter().cloned());

    let mut subset = features.clone();
    subset.push(TARGET_COLUMN.to_string());
    let mut df = data::drop_incomplete_rows(&df, &subset)?;

    if df.height() < 2 {
        return Err(MpgError::DataError(format!(
            "need at least 2 complete rows to train, got {}",
            df.height()
        )));
    }

    // Fit one encoder per categorical column, then replace the column with
    // its integer codes so the matrix extraction sees only numbers.
    let mut encoders: HashMap<String, CategoryEncoder> = HashMap::new();
    for col_name in &categorical {
        let series = df
            .column(col_name)?
            .as_materialized_series()
            .clone();
        let mut encoder = CategoryEncoder::new();
        encoder.fit(&series)?;
        let codes = encoder.transform(&series)?;
        df.with_column(Series::new(col_name.as_str().into(), codes))?;
        encoders.insert(col_name.clone(), encoder);
    }

    let x = data::columns_to_matrix(&df, &features)?;
    let y = Array1::from_vec(data::column_to_vec(&df, TARGET_COLUMN)?);

    let (x_train, x_val, y_train, y_val) = shuffle_split(&x, &y, opts.validation_split, opts.seed);

    let mut forest = RandomForest::new(opts.n_estimators).with_random_state(opts.seed);
    if let Some(depth) = opts.max_depth {
        forest = forest.with_max_depth(depth);
    }
    forest.fit(&x_train, &y_train)?;

    let y_pred = forest.predict(&x_val)?;
    let metrics = RegressionMetrics::compute(&y_val, &y_pred).rounded(3);

    info!(
        rows = df.height(),
        n_features = features.len(),
        r2 = metrics.r2,
        mae = metrics.mae,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Training completed"
    );

    Ok(TrainedBundle {
        forest,
        encoders,
        features,
        metrics,
    })
}

/// Make sure the target column exists, deriving it from the city/highway
/// pair when possible. Rows where either side is null derive to null and are
/// dropped with the rest of the incomplete rows.
fn ensure_target(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let has = |name: &str| names.iter().any(|c| c == name);

    if has(TARGET_COLUMN) {
        return Ok(df);
    }
    if !(has(CITY_COLUMN) && has(HIGHWAY_COLUMN)) {
        return Err(MpgError::MissingTargetColumn);
    }

    let city = df
        .column(CITY_COLUMN)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let highway = df
        .column(HIGHWAY_COLUMN)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let combined: Vec<Option<f64>> = city
        .f64()?
        .into_iter()
        .zip(highway.f64()?.into_iter())
        .map(|(c, h)| match (c, h) {
            (Some(c), Some(h)) => Some((c + h) / 2.0),
            _ => None,
        })
        .collect();

    df.with_column(Series::new(TARGET_COLUMN.into(), combined))?;
    Ok(df)
}

/// Seeded shuffle split. The validation size is `ceil(n * split)`, clamped so
/// both sides keep at least one row.
fn shuffle_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    split: f64,
    seed: u64,
) -> (Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>) {
    let n = x.nrows();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let val_size = ((n as f64) * split).ceil() as usize;
    let val_size = val_size.clamp(1, n - 1);
    let (val_idx, train_idx) = indices.split_at(val_size);

    let x_train = x.select(Axis(0), train_idx);
    let x_val = x.select(Axis(0), val_idx);
    let y_train = Array1::from_vec(train_idx.iter().map(|&i| y[i]).collect());
    let y_val = Array1::from_vec(val_idx.iter().map(|&i| y[i]).collect());

    (x_train, x_val, y_train, y_val)
}
