//! Data loading utilities

use crate::error::{MpgError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

/// Parse a CSV upload held in memory.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

/// Load a CSV file from disk.
pub fn read_csv_path(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(file)
        .finish()?;
    Ok(df)
}

/// Normalize column names to trimmed lowercase so lookups are
/// header-spelling independent.
pub fn normalize_column_names(df: &mut DataFrame) -> Result<()> {
    let normalized: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_lowercase())
        .collect();
    df.set_column_names(normalized)?;
    Ok(())
}

/// Drop every row holding a null in any of `subset` (no imputation).
pub fn drop_incomplete_rows(df: &DataFrame, subset: &[String]) -> Result<DataFrame> {
    let mut mask: Option<BooleanChunked> = None;

    for col_name in subset {
        let column = df
            .column(col_name)
            .map_err(|_| MpgError::FeatureNotFound(col_name.clone()))?;
        let not_null = column.as_materialized_series().is_not_null();
        mask = Some(match mask {
            Some(m) => &m & &not_null,
            None => not_null,
        });
    }

    match mask {
        Some(m) => Ok(df.filter(&m)?),
        None => Ok(df.clone()),
    }
}

/// Extract named columns into a row-major `Array2<f64>`, casting as needed.
pub fn columns_to_matrix(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| MpgError::FeatureNotFound(col_name.clone()))?;
            let casted = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| MpgError::DataError(e.to_string()))?;
            let values: Vec<f64> = casted
                .f64()
                .map_err(|e| MpgError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

/// Extract a single column as `Vec<f64>`.
pub fn column_to_vec(df: &DataFrame, col_name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(col_name)
        .map_err(|_| MpgError::FeatureNotFound(col_name.to_string()))?;
    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| MpgError::DataError(e.to_string()))?;
    Ok(casted
        .f64()
        .map_err(|e| MpgError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_bytes() {
        let csv = b"a,b\n1,2\n3,4\n";
        let df = read_csv_bytes(csv).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_normalize_column_names() {
        let csv = b" Cylinders ,MAKE\n4,toyota\n";
        let mut df = read_csv_bytes(csv).unwrap();
        normalize_column_names(&mut df).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["cylinders", "make"]);
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let csv = b"a,b\n1,x\n2,\n,y\n3,z\n";
        let df = read_csv_bytes(csv).unwrap();
        let filtered =
            drop_incomplete_rows(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_columns_to_matrix_order() {
        let csv = b"a,b\n1,10\n2,20\n";
        let df = read_csv_bytes(csv).unwrap();
        let x = columns_to_matrix(&df, &["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(x[[0, 0]], 10.0);
        assert_eq!(x[[0, 1]], 1.0);
        assert_eq!(x[[1, 0]], 20.0);
    }
}
