//! End-to-end forecasting run
//!
//! load → calendar features → split → fit base → fit residual → evaluate →
//! predict test → export. Charts are built here but drawn by the caller, so
//! the submission file always exists before any rendering starts.

mod config;

pub use config::PipelineConfig;

use crate::data::{
    self, add_date_features, load_test, load_train, read_dates, train_test_split, write_submission,
    FeatureSchema, TARGET_COLUMN,
};
use crate::error::Result;
use crate::training::{HybridForecaster, LightGBMRegressor, RandomForest, RegressionMetrics};
use crate::visualization::{self, ChartSpec, ERROR_BINS};
use ndarray::Array1;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use tracing::{debug, info};

/// Outcome of a forecasting run
#[derive(Debug, Clone)]
pub struct ForecastReport {
    /// Combined-model RMSE on the validation subset
    pub rmse: f64,
    pub metrics: RegressionMetrics,
    pub n_train: usize,
    pub n_validation: usize,
    pub n_test: usize,
    pub submission_path: PathBuf,
    /// Combined predictions for the test rows, in file order
    pub test_predictions: Array1<f64>,
    /// Base model feature importances, in feature order
    pub feature_importances: Vec<(String, f64)>,
    /// Diagnostic charts, in display order
    pub charts: Vec<ChartSpec>,
}

/// Load both tables from the configured paths and run the forecast
pub fn run(config: &PipelineConfig) -> Result<ForecastReport> {
    let train = load_train(&config.train_path)?;
    let test = load_test(&config.test_path)?;
    run_on_frames(train, test, config)
}

/// Run the forecast on already loaded tables
pub fn run_on_frames(
    mut train: DataFrame,
    mut test: DataFrame,
    config: &PipelineConfig,
) -> Result<ForecastReport> {
    add_date_features(&mut train)?;
    add_date_features(&mut test)?;

    let schema = FeatureSchema::default();
    let x = schema.extract(&train)?;
    let y = data::target_vector(&train, TARGET_COLUMN)?;
    let x_test = schema.extract(&test)?;
    debug!(features = ?schema.columns(), "Extracted feature matrices");

    let split = train_test_split(&x, &y, &config.split)?;
    info!(
        train_rows = split.x_train.nrows(),
        validation_rows = split.x_val.nrows(),
        test_size = config.split.test_size,
        "Split training data"
    );

    let mut model = HybridForecaster::new(
        RandomForest::new_regressor(config.forest.clone()),
        LightGBMRegressor::new(config.booster.clone()),
    );
    let outcome = model.fit(&split.x_train, &split.y_train, &split.x_val, &split.y_val)?;

    let feature_importances: Vec<(String, f64)> = match model.base().feature_importances() {
        Some(imp) => schema.columns().iter().cloned().zip(imp.iter().copied()).collect(),
        None => Vec::new(),
    };
    for (feature, importance) in &feature_importances {
        debug!(feature = %feature, importance, "Base model feature importance");
    }

    let metrics = RegressionMetrics::compute(&split.y_val, &outcome.combined)?;
    info!(
        rmse = metrics.rmse,
        mae = metrics.mae,
        r2 = ?metrics.r2,
        "Validation metrics (residual model was fit on these rows)"
    );

    let test_predictions = model.predict(&x_test)?;
    let n_test = write_submission(&test, &test_predictions, &config.submission_path)?;

    let errors = &split.y_val - &outcome.combined;
    let test_dates = read_dates(&test)?;
    let charts = vec![
        visualization::actual_vs_predicted(&split.y_val, &outcome.combined),
        visualization::error_histogram(&errors, ERROR_BINS),
        visualization::scatter_with_reference(&split.y_val, &outcome.combined),
        visualization::predicted_over_time(&test_dates, &test_predictions),
    ];

    Ok(ForecastReport {
        rmse: metrics.rmse,
        metrics,
        n_train: split.x_train.nrows(),
        n_validation: split.x_val.nrows(),
        n_test,
        submission_path: config.submission_path.clone(),
        test_predictions,
        feature_importances,
        charts,
    })
}
