//! Integration test: base, residual and combined models on store/item features

use demand_forecast::data::{train_test_split, SplitConfig};
use demand_forecast::training::{
    rmse, ForestConfig, HybridForecaster, LightGBMConfig, LightGBMRegressor, RandomForest,
    Regressor,
};
use ndarray::{Array1, Array2};

/// Rows of (store, item, year, month, day_of_week) with a weekly pattern
fn calendar_data(n_days: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rows = Vec::new();
    let mut target = Vec::new();
    for day in 0..n_days {
        for store in 1..=3 {
            for item in 1..=2 {
                let dow = (day % 7) as f64;
                let month = (1 + (day / 30) % 12) as f64;
                rows.extend_from_slice(&[store as f64, item as f64, 2017.0, month, dow]);
                let weekend = if dow >= 5.0 { 8.0 } else { 0.0 };
                target.push(10.0 * store as f64 + 3.0 * item as f64 + weekend + month);
            }
        }
    }
    let n = target.len();
    (Array2::from_shape_vec((n, 5), rows).unwrap(), Array1::from_vec(target))
}

#[test]
fn test_forest_learns_store_item_levels() {
    let (x, y) = calendar_data(60);
    let mut forest = RandomForest::new_regressor(ForestConfig { n_estimators: 30, ..Default::default() });
    forest.fit(&x, &y).unwrap();

    let preds = forest.predict(&x).unwrap();
    let mean = y.mean().unwrap();
    let baseline = rmse(&y, &Array1::from_elem(y.len(), mean)).unwrap();
    assert!(rmse(&y, &preds).unwrap() < baseline * 0.2);

    let importances = forest.feature_importances().unwrap();
    assert_eq!(importances.len(), 5);
    // Year is constant and never split on.
    assert_eq!(importances[2], 0.0);
}

#[test]
fn test_booster_reduces_residual_error() {
    let (x, y) = calendar_data(40);
    let mut booster = LightGBMRegressor::new(LightGBMConfig {
        n_estimators: 50,
        min_child_samples: 5,
        ..Default::default()
    });
    booster.fit(&x, &y).unwrap();

    let preds = booster.predict(&x).unwrap();
    let mean = y.mean().unwrap();
    let baseline = rmse(&y, &Array1::from_elem(y.len(), mean)).unwrap();
    assert!(rmse(&y, &preds).unwrap() < baseline);
    assert_eq!(booster.n_trees(), 50);
    assert!(booster.leaves_per_tree().iter().all(|&l| l <= 31));
}

#[test]
fn test_hybrid_on_split() {
    let (x, y) = calendar_data(50);
    let split = train_test_split(&x, &y, &SplitConfig::default()).unwrap();

    let mut model = HybridForecaster::new(
        RandomForest::new_regressor(ForestConfig { n_estimators: 20, ..Default::default() }),
        LightGBMRegressor::new(LightGBMConfig { n_estimators: 20, min_child_samples: 5, ..Default::default() }),
    );
    let outcome = model.fit(&split.x_train, &split.y_train, &split.x_val, &split.y_val).unwrap();

    let base_only = rmse(&split.y_val, &outcome.base_predictions).unwrap();
    let combined = rmse(&split.y_val, &outcome.combined).unwrap();
    assert!(combined.is_finite());
    // The residual model was fit on these same rows.
    assert!(combined <= base_only * 1.05);

    let again = model.predict(&split.x_val).unwrap();
    for (a, b) in again.iter().zip(outcome.combined.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_models_are_seeded() {
    let (x, y) = calendar_data(20);

    let fit_forest = || {
        let mut f = RandomForest::new_regressor(ForestConfig { n_estimators: 10, ..Default::default() });
        f.fit(&x, &y).unwrap();
        f.predict(&x).unwrap()
    };
    assert_eq!(fit_forest(), fit_forest());

    let fit_booster = || {
        let mut b = LightGBMRegressor::default();
        Regressor::fit(&mut b, &x, &y).unwrap();
        b.predict(&x).unwrap()
    };
    assert_eq!(fit_booster(), fit_booster());
}

#[test]
fn test_predict_before_fit_fails() {
    let (x, _) = calendar_data(2);
    assert!(RandomForest::default().predict(&x).is_err());
    assert!(LightGBMRegressor::default().predict(&x).is_err());
}
