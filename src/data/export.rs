//! Submission file writer

use super::{ID_COLUMN, TARGET_COLUMN};
use crate::error::{ForecastError, Result};
use ndarray::Array1;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Write `id,sales` rows in the test table's order. Returns the row count.
pub fn write_submission(
    test: &DataFrame,
    predictions: &Array1<f64>,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();

    if predictions.len() != test.height() {
        return Err(ForecastError::ShapeError {
            expected: format!("{} predictions (one per test row)", test.height()),
            actual: format!("{} predictions", predictions.len()),
        });
    }

    let ids = test
        .column(ID_COLUMN)
        .map_err(|_| ForecastError::FeatureNotFound(ID_COLUMN.to_string()))?
        .clone();
    let sales = Series::new(TARGET_COLUMN.into(), predictions.to_vec());
    let mut submission = DataFrame::new(vec![ids, sales.into()])?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut submission)?;

    info!(path = %path.display(), rows = submission.height(), "Wrote submission");
    Ok(submission.height())
}
