//! Integration test: Full pipeline (load → features → split → train → export)

use chrono::{Duration, NaiveDate};
use demand_forecast::pipeline::{self, PipelineConfig};
use demand_forecast::training::{ForestConfig, LightGBMConfig};
use demand_forecast::ForecastError;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const STORES: u32 = 2;
const ITEMS: u32 = 2;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 11, 1).unwrap()
}

/// Daily sales with a linear trend, a store/item offset and bounded noise
fn write_train_csv(path: &Path, days: i64) {
    let mut csv = String::from("date,store,item,sales\n");
    for day in 0..days {
        let date = start() + Duration::days(day);
        for store in 1..=STORES {
            for item in 1..=ITEMS {
                let noise = ((day * 7 + (store * 3 + item) as i64) % 5) as f64 - 2.0;
                let sales = 20.0 + 0.5 * day as f64 + 4.0 * store as f64 + 2.0 * item as f64 + noise;
                writeln!(csv, "{},{},{},{}", date.format("%Y-%m-%d"), store, item, sales).unwrap();
            }
        }
    }
    fs::write(path, csv).unwrap();
}

/// Future days with sequential ids
fn write_test_csv(path: &Path, first_day: i64, days: i64) {
    let mut csv = String::from("id,date,store,item\n");
    let mut id = 0;
    for day in first_day..first_day + days {
        let date = start() + Duration::days(day);
        for store in 1..=STORES {
            for item in 1..=ITEMS {
                writeln!(csv, "{},{},{},{}", id, date.format("%Y-%m-%d"), store, item).unwrap();
                id += 1;
            }
        }
    }
    fs::write(path, csv).unwrap();
}

fn small_config(dir: &Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_train_path(dir.join("train.csv"))
        .with_test_path(dir.join("test.csv"))
        .with_submission_path(dir.join("submission.csv"))
        .with_forest(ForestConfig { n_estimators: 20, ..Default::default() })
        .with_booster(LightGBMConfig { n_estimators: 20, min_child_samples: 3, ..Default::default() })
        .with_plots(false)
}

#[test]
fn test_end_to_end_forecast() {
    let dir = tempfile::tempdir().unwrap();
    write_train_csv(&dir.path().join("train.csv"), 30);
    write_test_csv(&dir.path().join("test.csv"), 30, 10);

    let config = small_config(dir.path());
    let report = pipeline::run(&config).unwrap();

    assert!(report.rmse.is_finite());
    assert!(report.rmse >= 0.0);
    assert_eq!(report.n_train + report.n_validation, 120);
    assert_eq!(report.n_validation, 24);
    assert_eq!(report.n_test, 40);
    assert_eq!(report.charts.len(), 4);
    assert_eq!(report.feature_importances.len(), 5);

    let submission = fs::read_to_string(&config.submission_path).unwrap();
    let mut lines = submission.lines();
    assert_eq!(lines.next(), Some("id,sales"));

    let rows: Vec<(i64, f64)> = lines
        .map(|line| {
            let (id, sales) = line.split_once(',').unwrap();
            (id.parse().unwrap(), sales.parse().unwrap())
        })
        .collect();
    assert_eq!(rows.len(), 40);
    for (expected_id, (id, sales)) in rows.iter().enumerate() {
        assert_eq!(*id, expected_id as i64);
        assert!(sales.is_finite());
    }
}

#[test]
fn test_repeat_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_train_csv(&dir.path().join("train.csv"), 20);
    write_test_csv(&dir.path().join("test.csv"), 20, 5);

    let config = small_config(dir.path());
    let first = pipeline::run(&config).unwrap();
    let first_file = fs::read_to_string(&config.submission_path).unwrap();
    let second = pipeline::run(&config).unwrap();
    let second_file = fs::read_to_string(&config.submission_path).unwrap();

    assert_eq!(first.rmse, second.rmse);
    assert_eq!(first.test_predictions, second.test_predictions);
    assert_eq!(first_file, second_file);
}

#[test]
fn test_single_row_training_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("train.csv"),
        "date,store,item,sales\n2018-01-01,1,1,13\n",
    )
    .unwrap();
    write_test_csv(&dir.path().join("test.csv"), 1, 1);

    let config = small_config(dir.path());
    let result = pipeline::run(&config);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    assert!(!config.submission_path.exists());
}

#[test]
fn test_missing_sales_column() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("train.csv"),
        "date,store,item,units\n2018-01-01,1,1,13\n2018-01-02,1,1,11\n",
    )
    .unwrap();
    write_test_csv(&dir.path().join("test.csv"), 2, 1);

    let result = pipeline::run(&small_config(dir.path()));
    match result {
        Err(ForecastError::MissingColumn { column, .. }) => assert_eq!(column, "sales"),
        other => panic!("expected MissingColumn, got {:?}", other.map(|r| r.rmse)),
    }
}

#[test]
fn test_missing_test_file() {
    let dir = tempfile::tempdir().unwrap();
    write_train_csv(&dir.path().join("train.csv"), 5);

    let result = pipeline::run(&small_config(dir.path()));
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_malformed_date() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("train.csv"),
        "date,store,item,sales\n2018-01-01,1,1,13\nyesterday,1,1,11\n",
    )
    .unwrap();
    write_test_csv(&dir.path().join("test.csv"), 2, 1);

    let result = pipeline::run(&small_config(dir.path()));
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_run_on_frames() {
    let mut dates = Vec::new();
    let mut stores = Vec::new();
    let mut sales = Vec::new();
    for day in 0..25i64 {
        for store in 1..=2i64 {
            dates.push((start() + Duration::days(day)).format("%Y-%m-%d").to_string());
            stores.push(store);
            sales.push(10.0 * store as f64 + day as f64);
        }
    }
    let items = vec![1i64; dates.len()];
    let train = polars::df!(
        "date" => &dates,
        "store" => &stores,
        "item" => &items,
        "sales" => &sales
    )
    .unwrap();

    let test = polars::df!(
        "id" => &[0i64, 1],
        "date" => &["2017-11-26", "2017-11-26"],
        "store" => &[1i64, 2],
        "item" => &[1i64, 1]
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    let report = pipeline::run_on_frames(train, test, &config).unwrap();

    assert_eq!(report.n_test, 2);
    assert_eq!(report.test_predictions.len(), 2);
    // Store 2 sells more on the same day.
    assert!(report.test_predictions[1] > report.test_predictions[0]);
    assert!(config.submission_path.exists());
}

#[test]
fn test_test_frame_missing_feature_column() {
    let train = polars::df!(
        "date" => &["2017-11-01", "2017-11-02", "2017-11-03", "2017-11-04", "2017-11-05"],
        "store" => &[1i64, 1, 1, 1, 1],
        "item" => &[1i64, 1, 1, 1, 1],
        "sales" => &[10.0, 11.0, 12.0, 13.0, 14.0]
    )
    .unwrap();
    let test = polars::df!(
        "id" => &[0i64],
        "date" => &["2017-11-06"],
        "store" => &[1i64]
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    match pipeline::run_on_frames(train, test, &config) {
        Err(ForecastError::FeatureNotFound(column)) => assert_eq!(column, "item"),
        other => panic!("expected FeatureNotFound, got {:?}", other.map(|r| r.rmse)),
    }
    assert!(!config.submission_path.exists());
}
