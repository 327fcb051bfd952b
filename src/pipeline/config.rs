//! Pipeline configuration

use crate::data::SplitConfig;
use crate::error::{ForecastError, Result};
use crate::training::{ForestConfig, LightGBMConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything one forecasting run needs. Defaults reproduce the reference
/// workflow: `train.csv`/`test.csv` in, `submission.csv` out, charts shown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub submission_path: PathBuf,
    pub split: SplitConfig,
    pub forest: ForestConfig,
    pub booster: LightGBMConfig,
    /// Render the diagnostic charts after export
    pub plots: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from("train.csv"),
            test_path: PathBuf::from("test.csv"),
            submission_path: PathBuf::from("submission.csv"),
            split: SplitConfig::default(),
            forest: ForestConfig::default(),
            booster: LightGBMConfig::default(),
            plots: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn with_train_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.train_path = path.into();
        self
    }

    pub fn with_test_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_path = path.into();
        self
    }

    pub fn with_submission_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.submission_path = path.into();
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn with_booster(mut self, booster: LightGBMConfig) -> Self {
        self.booster = booster;
        self
    }

    pub fn with_plots(mut self, plots: bool) -> Self {
        self.plots = plots;
        self
    }
}
