//! CSV loading for the training and test tables

use super::{DATE_COLUMN, ID_COLUMN, ITEM_COLUMN, STORE_COLUMN, TARGET_COLUMN};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days between 0001-01-01 (CE day 1) and the Unix epoch
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

const TRAIN_COLUMNS: [&str; 4] = [DATE_COLUMN, STORE_COLUMN, ITEM_COLUMN, TARGET_COLUMN];
const TEST_COLUMNS: [&str; 4] = [DATE_COLUMN, STORE_COLUMN, ITEM_COLUMN, ID_COLUMN];

/// Load the training table: requires `date`, `store`, `item`, `sales`
pub fn load_train(path: impl AsRef<Path>) -> Result<DataFrame> {
    load_table(path.as_ref(), "train", &TRAIN_COLUMNS)
}

/// Load the test table: requires `date`, `store`, `item`, `id`
pub fn load_test(path: impl AsRef<Path>) -> Result<DataFrame> {
    load_table(path.as_ref(), "test", &TEST_COLUMNS)
}

fn load_table(path: &Path, table: &str, required: &[&str]) -> Result<DataFrame> {
    let mut df = read_csv(path)?;
    require_columns(&df, table, required)?;
    parse_date_column(&mut df)?;

    info!(
        table,
        path = %path.display(),
        rows = df.height(),
        cols = df.width(),
        "Loaded table"
    );
    Ok(df)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(ForecastError::DataError(format!(
            "input file not found: {}",
            path.display()
        )));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

fn require_columns(df: &DataFrame, table: &str, required: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    for &column in required {
        if !present.iter().any(|p| p.as_str() == column) {
            return Err(ForecastError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Replace the textual `date` column with a polars `Date` column
fn parse_date_column(df: &mut DataFrame) -> Result<()> {
    let dates = read_dates(df)?;
    df.with_column(Series::new(DATE_COLUMN.into(), dates))?;
    debug!(rows = df.height(), "Parsed date column");
    Ok(())
}

/// Read the `date` column as calendar dates.
///
/// Accepts either a polars `Date` column or `YYYY-MM-DD` strings.
pub fn read_dates(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let column = df
        .column(DATE_COLUMN)
        .map_err(|_| ForecastError::FeatureNotFound(DATE_COLUMN.to_string()))?;

    match column.dtype() {
        DataType::Date => {
            let days = column.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE))
                        .ok_or_else(|| bad_date(row, "null or out-of-range date"))
                })
                .collect()
        }
        _ => {
            let text = column.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    let raw = v.ok_or_else(|| bad_date(row, "missing date"))?;
                    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                        .map_err(|e| bad_date(row, &format!("'{}': {}", raw, e)))
                })
                .collect()
        }
    }
}

fn bad_date(row: usize, detail: &str) -> ForecastError {
    ForecastError::DataError(format!("malformed date at row {}: {}", row, detail))
}
