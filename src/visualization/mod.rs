//! Visualization module: diagnostic charts drawn in the terminal.

pub mod charts;
pub mod viewer;

pub use charts::{
    actual_vs_predicted, error_histogram, histogram_bins, predicted_over_time, scatter_with_reference,
    ChartSpec, Histogram, HistogramBin, XyChart, ERROR_BINS,
};
pub use viewer::{render_chart, ChartViewer};
