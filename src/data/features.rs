//! Calendar features derived from the `date` column

use super::loader::read_dates;
use crate::error::Result;
use chrono::Datelike;
use polars::prelude::*;

pub const YEAR_COLUMN: &str = "year";
pub const MONTH_COLUMN: &str = "month";
pub const DAY_OF_WEEK_COLUMN: &str = "day_of_week";

/// Add `year`, `month` (1-12) and `day_of_week` (Monday = 0) columns.
///
/// Existing columns with those names are overwritten, so applying this to an
/// already augmented table leaves it unchanged.
pub fn add_date_features(df: &mut DataFrame) -> Result<()> {
    let dates = read_dates(df)?;

    let years: Vec<i32> = dates.iter().map(|d| d.year()).collect();
    let months: Vec<i32> = dates.iter().map(|d| d.month() as i32).collect();
    let weekdays: Vec<i32> = dates
        .iter()
        .map(|d| d.weekday().num_days_from_monday() as i32)
        .collect();

    df.with_column(Series::new(YEAR_COLUMN.into(), years))?;
    df.with_column(Series::new(MONTH_COLUMN.into(), months))?;
    df.with_column(Series::new(DAY_OF_WEEK_COLUMN.into(), weekdays))?;
    Ok(())
}
