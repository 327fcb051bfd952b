//! Model training module
//!
//! Provides the two learners of the forecaster and their combination:
//! - Regression trees and a bagged Random Forest (base model)
//! - LightGBM-style leaf-wise gradient boosting (residual model)
//! - The hybrid base + residual forecaster
//! - Regression metrics

pub mod decision_tree;
pub mod random_forest;
pub mod lightgbm;
pub mod hybrid;
pub mod metrics;

pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::{RandomForest, ForestConfig, MaxFeatures};
pub use lightgbm::{LightGBMRegressor, LightGBMConfig};
pub use hybrid::{HybridForecaster, ValidationOutcome};
pub use metrics::{rmse, RegressionMetrics};

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A regressor that is fit once on a feature matrix and predicts one value per row
pub trait Regressor {
    /// Short model identifier used in logs
    fn name(&self) -> &'static str;

    /// Fit on a row-major feature matrix and its targets
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}
