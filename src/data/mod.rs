//! Tabular data handling: loading, calendar features, splitting and export
//!
//! Tables are polars `DataFrame`s; models consume row-major
//! `ndarray::Array2<f64>` matrices built by [`FeatureSchema`].

pub mod loader;
pub mod features;
pub mod split;
pub mod export;

pub use loader::{load_test, load_train, read_dates};
pub use features::add_date_features;
pub use split::{train_test_split, Split, SplitConfig};
pub use export::write_submission;

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

pub const DATE_COLUMN: &str = "date";
pub const STORE_COLUMN: &str = "store";
pub const ITEM_COLUMN: &str = "item";
pub const TARGET_COLUMN: &str = "sales";
pub const ID_COLUMN: &str = "id";

/// Model inputs, in the order they appear in every feature matrix
pub const FEATURE_COLUMNS: [&str; 5] = ["store", "item", "year", "month", "day_of_week"];

/// Ordered feature column list shared by fitting and prediction.
///
/// Every matrix is extracted through the same schema, so fit, validation and
/// test matrices agree on width and column order. A frame missing one of the
/// columns is rejected instead of being silently misaligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(FEATURE_COLUMNS)
    }
}

impl FeatureSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { columns: columns.into_iter().map(Into::into).collect() }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fail with the first schema column absent from `df`
    pub fn check(&self, df: &DataFrame) -> Result<()> {
        let present = df.get_column_names();
        match self
            .columns
            .iter()
            .find(|c| !present.iter().any(|p| p.as_str() == c.as_str()))
        {
            Some(missing) => Err(ForecastError::FeatureNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    /// Extract the schema columns into a row-major matrix
    pub fn extract(&self, df: &DataFrame) -> Result<Array2<f64>> {
        self.check(df)?;
        columns_to_array2(df, &self.columns)
    }
}

/// Read one column as `f64` values; nulls are rejected
pub fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| ForecastError::FeatureNotFound(name.to_string()))?;
    let as_f64 = column.cast(&DataType::Float64)?;
    as_f64
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                ForecastError::DataError(format!("null value in column '{}' at row {}", name, row))
            })
        })
        .collect()
}

/// Target column as a vector
pub fn target_vector(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    Ok(Array1::from_vec(column_f64(df, name)?))
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|name| column_f64(df, name))
        .collect::<Result<_>>()?;

    Ok(Array2::from_shape_fn((n_rows, col_names.len()), |(r, c)| col_data[c][r]))
}
