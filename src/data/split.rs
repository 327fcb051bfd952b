//! Seeded train/validation split

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of rows assigned to validation, in (0, 1)
    pub test_size: f64,
    /// Seed for the row permutation
    pub random_state: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
        }
    }
}

/// Fit and validation partitions of a feature matrix and its targets
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_val: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_val: Array1<f64>,
    /// Source row of each train row
    pub train_indices: Vec<usize>,
    /// Source row of each validation row
    pub val_indices: Vec<usize>,
}

/// Shuffle rows with a seeded permutation and cut off `ceil(n * test_size)`
/// validation rows. The remaining rows form the fit subset.
pub fn train_test_split(x: &Array2<f64>, y: &Array1<f64>, config: &SplitConfig) -> Result<Split> {
    let n = x.nrows();

    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(ForecastError::InvalidParameter {
            name: "test_size".to_string(),
            value: config.test_size.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }
    if n != y.len() {
        return Err(ForecastError::ValidationError(format!(
            "feature rows ({}) and targets ({}) differ in length",
            n,
            y.len()
        )));
    }
    if n == 0 {
        return Err(ForecastError::ValidationError(
            "cannot split an empty table".to_string(),
        ));
    }

    let n_val = (n as f64 * config.test_size).ceil() as usize;
    let n_train = n - n_val;
    if n_train == 0 {
        return Err(ForecastError::ValidationError(format!(
            "with n_samples={} and test_size={}, the fit subset would be empty",
            n, config.test_size
        )));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(config.random_state);
    permutation.shuffle(&mut rng);

    let val_indices = permutation[..n_val].to_vec();
    let train_indices = permutation[n_val..].to_vec();

    Ok(Split {
        x_train: x.select(Axis(0), &train_indices),
        x_val: x.select(Axis(0), &val_indices),
        y_train: y.select(Axis(0), &train_indices),
        y_val: y.select(Axis(0), &val_indices),
        train_indices,
        val_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn table(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(r, c)| (r * 10 + c) as f64);
        let y = Array1::from_shape_fn(n, |r| r as f64);
        (x, y)
    }

    #[test]
    fn test_sizes() {
        let (x, y) = table(10);
        let split = train_test_split(&x, &y, &SplitConfig::default()).unwrap();
        assert_eq!(split.x_val.nrows(), 2);
        assert_eq!(split.x_train.nrows(), 8);

        let (x, y) = table(11);
        let split = train_test_split(&x, &y, &SplitConfig::default()).unwrap();
        assert_eq!(split.y_val.len(), 3);
        assert_eq!(split.y_train.len(), 8);
    }

    #[test]
    fn test_disjoint_and_exhaustive() {
        let (x, y) = table(37);
        let split = train_test_split(&x, &y, &SplitConfig::default()).unwrap();

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.val_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());

        for (row, &src) in split.val_indices.iter().enumerate() {
            assert_eq!(split.y_val[row], src as f64);
            assert_eq!(split.x_val.row(row), x.row(src));
        }
    }

    #[test]
    fn test_deterministic() {
        let (x, y) = table(50);
        let a = train_test_split(&x, &y, &SplitConfig::default()).unwrap();
        let b = train_test_split(&x, &y, &SplitConfig::default()).unwrap();
        assert_eq!(a.train_indices, b.train_indices);
        assert_eq!(a.val_indices, b.val_indices);

        let other = SplitConfig { random_state: 7, ..Default::default() };
        let c = train_test_split(&x, &y, &other).unwrap();
        assert_ne!(a.val_indices, c.val_indices);
    }

    #[test]
    fn test_single_row_fails() {
        let x = array![[1.0, 2.0]];
        let y = array![3.0];
        let err = train_test_split(&x, &y, &SplitConfig::default()).unwrap_err();
        assert!(matches!(err, ForecastError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_fraction() {
        let (x, y) = table(10);
        let config = SplitConfig { test_size: 1.0, ..Default::default() };
        assert!(matches!(
            train_test_split(&x, &y, &config),
            Err(ForecastError::InvalidParameter { .. })
        ));
    }
}
