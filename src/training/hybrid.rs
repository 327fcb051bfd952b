//! Base + residual model combination
//!
//! The residual model is fit on the validation rows' residuals and the same
//! rows are then scored, so validation metrics computed from
//! [`ValidationOutcome::combined`] are optimistic.

use crate::error::{ForecastError, Result};
use super::{LightGBMRegressor, RandomForest, Regressor};
use ndarray::{Array1, Array2};
use std::time::Instant;
use tracing::info;

/// Predictions produced while fitting on the validation subset
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Base model output on validation rows
    pub base_predictions: Array1<f64>,
    /// `y_val - base_predictions`, the residual model's target
    pub residuals: Array1<f64>,
    /// Base plus residual model output on validation rows
    pub combined: Array1<f64>,
}

/// Two-stage forecaster: a base regressor plus a regressor on its residuals
#[derive(Debug, Clone)]
pub struct HybridForecaster<B = RandomForest, R = LightGBMRegressor> {
    base: B,
    residual: R,
    is_fitted: bool,
}

impl<B: Regressor, R: Regressor> HybridForecaster<B, R> {
    pub fn new(base: B, residual: R) -> Self {
        Self { base, residual, is_fitted: false }
    }

    /// Fit the base model on the train subset, then the residual model on
    /// the validation subset's residuals.
    pub fn fit(
        &mut self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_val: &Array2<f64>,
        y_val: &Array1<f64>,
    ) -> Result<ValidationOutcome> {
        if x_train.ncols() != x_val.ncols() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} validation features", x_train.ncols()),
                actual: format!("{} validation features", x_val.ncols()),
            });
        }

        let start = Instant::now();
        self.base.fit(x_train, y_train)?;
        info!(
            model = self.base.name(),
            rows = x_train.nrows(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted base model"
        );

        let base_predictions = self.base.predict(x_val)?;
        if base_predictions.len() != y_val.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} validation targets", base_predictions.len()),
                actual: format!("{} validation targets", y_val.len()),
            });
        }
        let residuals = y_val - &base_predictions;

        let start = Instant::now();
        self.residual.fit(x_val, &residuals)?;
        info!(
            model = self.residual.name(),
            rows = x_val.nrows(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted residual model"
        );

        self.is_fitted = true;
        let combined = self.predict(x_val)?;

        Ok(ValidationOutcome { base_predictions, residuals, combined })
    }

    /// `base.predict(x) + residual.predict(x)`, row by row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(ForecastError::ModelNotFitted);
        }

        let base = self.base.predict(x)?;
        let residual = self.residual.predict(x)?;
        if base.len() != residual.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} residual predictions", base.len()),
                actual: format!("{} residual predictions", residual.len()),
            });
        }
        Ok(base + residual)
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn residual(&self) -> &R {
        &self.residual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{ForestConfig, LightGBMConfig};
    use ndarray::{array, Axis};

    /// Predicts a fixed linear function of the first column, ignoring fit data.
    struct Linear {
        slope: f64,
        intercept: f64,
        fitted_on: Option<Array1<f64>>,
    }

    impl Linear {
        fn new(slope: f64, intercept: f64) -> Self {
            Self { slope, intercept, fitted_on: None }
        }
    }

    impl Regressor for Linear {
        fn name(&self) -> &'static str {
            "linear"
        }

        fn fit(&mut self, _x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
            self.fitted_on = Some(y.clone());
            Ok(())
        }

        fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(x.column(0).mapv(|v| self.slope * v + self.intercept))
        }
    }

    #[test]
    fn test_residual_model_sees_validation_residuals() {
        let x_train = array![[1.0], [2.0]];
        let y_train = array![1.0, 2.0];
        let x_val = array![[3.0], [4.0]];
        let y_val = array![10.0, 20.0];

        let mut model = HybridForecaster::new(Linear::new(2.0, 0.0), Linear::new(0.0, 0.5));
        let outcome = model.fit(&x_train, &y_train, &x_val, &y_val).unwrap();

        assert_eq!(outcome.base_predictions, array![6.0, 8.0]);
        assert_eq!(outcome.residuals, array![4.0, 12.0]);
        assert_eq!(model.residual().fitted_on.as_ref().unwrap(), &array![4.0, 12.0]);
        assert_eq!(outcome.combined, array![6.5, 8.5]);
    }

    #[test]
    fn test_combined_is_sum_of_parts() {
        let x = Array2::from_shape_fn((60, 5), |(r, c)| ((r * 7 + c * 3) % 11) as f64);
        let y: Array1<f64> = x.sum_axis(Axis(1)).mapv(|v| v * 1.5 + 2.0);
        let (x_train, x_val) = (x.slice(ndarray::s![..45, ..]).to_owned(), x.slice(ndarray::s![45.., ..]).to_owned());
        let (y_train, y_val) = (y.slice(ndarray::s![..45]).to_owned(), y.slice(ndarray::s![45..]).to_owned());

        let base = RandomForest::new_regressor(ForestConfig { n_estimators: 10, ..Default::default() });
        let residual = LightGBMRegressor::new(LightGBMConfig { n_estimators: 10, min_child_samples: 3, ..Default::default() });
        let mut model = HybridForecaster::new(base, residual);
        model.fit(&x_train, &y_train, &x_val, &y_val).unwrap();

        let combined = model.predict(&x).unwrap();
        let base = model.base().predict(&x).unwrap();
        let residual = model.residual().predict(&x).unwrap();
        for i in 0..x.nrows() {
            assert!((combined[i] - (base[i] + residual[i])).abs() < 1e-9);
        }
    }

    #[test]
    fn test_predict_before_fit() {
        let model = HybridForecaster::new(Linear::new(1.0, 0.0), Linear::new(1.0, 0.0));
        assert!(matches!(model.predict(&array![[1.0]]), Err(ForecastError::ModelNotFitted)));
    }
}
