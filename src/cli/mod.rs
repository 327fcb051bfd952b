//! Command-line interface
//!
//! Flags override the JSON config, which overrides the built-in defaults.
//! The run summary goes to stderr; stdout carries only the RMSE line.

use clap::Parser;
use colored::*;
use std::path::PathBuf;

use crate::error::Result;
use crate::pipeline::{ForecastReport, PipelineConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn section(title: &str) {
    eprintln!();
    eprintln!("  {}", title.white().bold());
    eprintln!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "demand-forecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Forecast store/item sales with a random forest and a boosted residual model")]
#[command(long_about = None)]
pub struct Cli {
    /// Training data (date, store, item, sales)
    #[arg(long)]
    pub train: Option<PathBuf>,

    /// Test data (id, date, store, item)
    #[arg(long)]
    pub test: Option<PathBuf>,

    /// Submission file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file with split and model parameters
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip the diagnostic charts
    #[arg(long)]
    pub no_plots: bool,
}

impl Cli {
    /// Resolve the run configuration
    pub fn build_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(path) = &self.train {
            config.train_path = path.clone();
        }
        if let Some(path) = &self.test {
            config.test_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.submission_path = path.clone();
        }
        if self.no_plots {
            config.plots = false;
        }
        Ok(config)
    }
}

/// Print the run summary to stderr
pub fn print_summary(report: &ForecastReport) {
    section("Forecast");
    eprintln!("  {}", kv("train rows      ", &report.n_train.to_string()));
    eprintln!("  {}", kv("validation rows ", &report.n_validation.to_string()));
    eprintln!("  {}", kv("test rows       ", &report.n_test.to_string()));
    eprintln!("  {}", kv("rmse            ", &format!("{:.4}", report.metrics.rmse)));
    eprintln!("  {}", kv("mae             ", &format!("{:.4}", report.metrics.mae)));
    if let Some(r2) = report.metrics.r2 {
        eprintln!("  {}", kv("r2              ", &format!("{:.4}", r2)));
    }

    if !report.feature_importances.is_empty() {
        section("Feature importance");
        for (name, importance) in &report.feature_importances {
            let bar = "█".repeat((importance * 40.0).round() as usize);
            eprintln!("  {:<12} {} {}", muted(name), bar.truecolor(120, 170, 255), dim(&format!("{:.3}", importance)));
        }
    }

    eprintln!();
    eprintln!("  {} wrote {}", ok("✓"), report.submission_path.display());
}
