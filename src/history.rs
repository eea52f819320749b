//! Prediction history log
//!
//! An append-only CSV file. The header is written on first append using the
//! bundle's feature order plus the prediction column; rows are never mutated
//! or deleted.

use crate::error::Result;
use serde_json::{Map, Number, Value};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Column name for the predicted value.
pub const PREDICTION_COLUMN: &str = "predicted_mpg";

#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append one prediction. `features` fixes the column order; the header
    /// row is written only when the file does not exist yet.
    pub fn append(
        &self,
        record: &Map<String, Value>,
        features: &[String],
        prediction: f64,
    ) -> Result<()> {
        let write_header = !self.path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            let header: Vec<&str> = features
                .iter()
                .map(|f| f.as_str())
                .chain(std::iter::once(PREDICTION_COLUMN))
                .collect();
            writer.write_record(&header)?;
        }

        let row: Vec<String> = features
            .iter()
            .map(|f| record.get(f).map(value_to_cell).unwrap_or_default())
            .chain(std::iter::once(prediction.to_string()))
            .collect();
        writer.write_record(&row)?;
        writer.flush()?;

        Ok(())
    }

    /// All entries in append order, cells re-typed to JSON numbers where they
    /// parse as such.
    pub fn read_all(&self) -> Result<Vec<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut entry = Map::new();
            for (name, cell) in headers.iter().zip(record.iter()) {
                entry.insert(name.clone(), infer_value(cell));
            }
            entries.push(entry);
        }

        Ok(entries)
    }
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn infer_value(cell: &str) -> Value {
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(Number::from(i));
    }
    if let Ok(f) = cell.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_string())
}
