//! Demand forecast - Main Entry Point
//!
//! Trains the hybrid model on `train.csv`, writes `submission.csv` and shows
//! the diagnostic charts.

use anyhow::Context;
use clap::Parser;
use demand_forecast::cli::{print_summary, Cli};
use demand_forecast::pipeline;
use demand_forecast::visualization::ChartViewer;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demand_forecast=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.build_config().context("failed to resolve configuration")?;

    let report = pipeline::run(&config).context("forecast run failed")?;
    println!("Combined Model RMSE: {}", report.rmse);
    print_summary(&report);

    if config.plots {
        ChartViewer::show(&report.charts).context("failed to render charts")?;
    }

    Ok(())
}
