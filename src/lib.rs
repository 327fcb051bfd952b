//! Demand forecast - store/item sales forecasting
//!
//! This crate trains a two-stage forecaster on daily sales history:
//! - A Random Forest fit on calendar and store/item features
//! - A LightGBM-style booster fit on the forest's validation residuals
//! - Combined predictions as the sum of both
//!
//! # Modules
//!
//! - [`data`] - CSV loading, calendar features, splitting, submission export
//! - [`training`] - Trees, forest, booster, hybrid model, metrics
//! - [`pipeline`] - End-to-end run and its configuration
//! - [`visualization`] - Diagnostic charts rendered in the terminal
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

pub mod data;
pub mod training;
pub mod pipeline;
pub mod visualization;
pub mod cli;

pub use error::{ForecastError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{ForecastError, Result};
    pub use crate::data::{
        add_date_features, load_test, load_train, train_test_split, write_submission, FeatureSchema,
        Split, SplitConfig,
    };
    pub use crate::training::{
        ForestConfig, HybridForecaster, LightGBMConfig, LightGBMRegressor, RandomForest,
        RegressionMetrics, Regressor,
    };
    pub use crate::pipeline::{ForecastReport, PipelineConfig};
}
