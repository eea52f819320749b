//! Integration test: full train-then-predict flow through the library API

use mpg_predictor::data::read_csv_bytes;
use mpg_predictor::inference::predict_record;
use mpg_predictor::preprocessing::UnknownCategoryPolicy;
use mpg_predictor::store::{FileModelStore, ModelStore};
use mpg_predictor::training::{train_bundle, TrainingOptions};
use mpg_predictor::MpgError;
use serde_json::json;

fn sample_csv() -> &'static [u8] {
    b"cylinders,displacement,year,make,fuel_type,transmission,city_mpg,highway_mpg\n\
      4,2.0,2018,toyota,gasoline,automatic,20,28\n\
      6,3.5,2019,honda,gasoline,automatic,21,29\n\
      4,1.8,2020,toyota,hybrid,cvt,50,54\n\
      8,5.0,2017,ford,gasoline,manual,15,23\n\
      4,2.5,2021,nissan,gasoline,cvt,27,35\n\
      6,3.0,2016,ford,diesel,automatic,22,30\n\
      4,1.6,2022,honda,gasoline,manual,30,38\n\
      8,6.2,2015,ford,gasoline,automatic,13,19\n\
      4,2.0,2019,nissan,gasoline,automatic,26,34\n\
      6,3.6,2018,toyota,gasoline,automatic,19,27\n"
}

#[test]
fn test_train_persist_reload_predict() {
    let df = read_csv_bytes(sample_csv()).unwrap();
    let bundle = train_bundle(&df, &TrainingOptions::default().with_n_estimators(30)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = FileModelStore::new(dir.path().join("mpg_model.bin"));
    store.replace(&bundle).unwrap();

    // A second store over the same path sees the persisted bundle, like a
    // server restart would.
    let reopened = FileModelStore::new(dir.path().join("mpg_model.bin"));
    assert!(reopened.is_trained());
    let loaded = reopened.load().unwrap().unwrap();

    let record = json!({
        "cylinders": 4,
        "displacement": 2.0,
        "year": 2019,
        "make": "toyota",
        "fuel_type": "gasoline",
        "transmission": "automatic"
    })
    .as_object()
    .unwrap()
    .clone();

    let direct = predict_record(&bundle, &record, UnknownCategoryPolicy::UseFirstClass).unwrap();
    let reloaded = predict_record(&loaded, &record, UnknownCategoryPolicy::UseFirstClass).unwrap();
    assert_eq!(direct, reloaded);
}

#[test]
fn test_metrics_are_rounded_to_three_places() {
    let df = read_csv_bytes(sample_csv()).unwrap();
    let bundle = train_bundle(&df, &TrainingOptions::default().with_n_estimators(30)).unwrap();

    let scaled_r2 = bundle.metrics.r2 * 1000.0;
    let scaled_mae = bundle.metrics.mae * 1000.0;
    assert!((scaled_r2 - scaled_r2.round()).abs() < 1e-9);
    assert!((scaled_mae - scaled_mae.round()).abs() < 1e-9);
}

#[test]
fn test_prediction_rounded_to_two_places() {
    let df = read_csv_bytes(sample_csv()).unwrap();
    let bundle = train_bundle(&df, &TrainingOptions::default().with_n_estimators(30)).unwrap();

    let record = json!({
        "cylinders": 6,
        "displacement": 3.0,
        "year": 2017,
        "make": "ford",
        "fuel_type": "diesel",
        "transmission": "automatic"
    })
    .as_object()
    .unwrap()
    .clone();

    let prediction =
        predict_record(&bundle, &record, UnknownCategoryPolicy::UseFirstClass).unwrap();
    let scaled = prediction * 100.0;
    assert!((scaled - scaled.round()).abs() < 1e-9);
}

#[test]
fn test_missing_target_is_reported() {
    let csv = b"cylinders,displacement,year,make\n4,2.0,2018,toyota\n6,3.5,2019,honda\n";
    let df = read_csv_bytes(csv).unwrap();
    let err = train_bundle(&df, &TrainingOptions::default()).unwrap_err();
    assert!(matches!(err, MpgError::MissingTargetColumn));
}

#[test]
fn test_failed_training_leaves_prior_bundle_intact() {
    let df = read_csv_bytes(sample_csv()).unwrap();
    let bundle = train_bundle(&df, &TrainingOptions::default().with_n_estimators(10)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = FileModelStore::new(dir.path().join("mpg_model.bin"));
    store.replace(&bundle).unwrap();

    // The bad upload fails before any store interaction.
    let bad = read_csv_bytes(b"cylinders,displacement,year\n4,2.0,2018\n6,3.0,2019\n").unwrap();
    assert!(train_bundle(&bad, &TrainingOptions::default()).is_err());

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.features, bundle.features);
}
