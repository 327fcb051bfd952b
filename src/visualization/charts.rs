//! Chart data for the four diagnostic plots
//!
//! Builders here are pure functions of already computed arrays; drawing is
//! done by [`super::viewer`].

use chrono::{Datelike, NaiveDate};
use ndarray::Array1;
use ratatui::style::Color;

/// How a series is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Scatter,
}

/// One named series of `(x, y)` points
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub name: String,
    pub kind: SeriesKind,
    pub color: Color,
    pub points: Vec<(f64, f64)>,
}

/// Axis title, bounds and tick labels
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub title: String,
    pub bounds: [f64; 2],
    pub labels: Vec<String>,
}

/// Line or scatter chart
#[derive(Debug, Clone, PartialEq)]
pub struct XyChart {
    pub title: String,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub series: Vec<PlotSeries>,
}

/// One histogram bin covering `[lower, upper)` (the last bin is closed)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Bar histogram
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub color: Color,
    pub bins: Vec<HistogramBin>,
}

/// A chart ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Xy(XyChart),
    Histogram(Histogram),
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Xy(chart) => &chart.title,
            ChartSpec::Histogram(hist) => &hist.title,
        }
    }
}

/// Number of bins in the error histogram
pub const ERROR_BINS: usize = 20;

/// Actual and predicted validation values against their position
pub fn actual_vs_predicted(actual: &Array1<f64>, predicted: &Array1<f64>) -> ChartSpec {
    let indexed = |values: &Array1<f64>| -> Vec<(f64, f64)> {
        values.iter().enumerate().map(|(i, &v)| (i as f64, v)).collect()
    };

    let series = vec![
        PlotSeries {
            name: "Actual Sales".to_string(),
            kind: SeriesKind::Line,
            color: Color::Blue,
            points: indexed(actual),
        },
        PlotSeries {
            name: "Predicted Sales (Combined Model)".to_string(),
            kind: SeriesKind::Line,
            color: Color::Red,
            points: indexed(predicted),
        },
    ];

    let x_bounds = [0.0, (actual.len().max(predicted.len()).max(2) - 1) as f64];
    let y_bounds = value_bounds(actual.iter().chain(predicted.iter()).copied());

    ChartSpec::Xy(XyChart {
        title: "Actual vs Predicted Sales".to_string(),
        x_axis: numeric_axis("Data Point", x_bounds),
        y_axis: numeric_axis("Sales", y_bounds),
        series,
    })
}

/// Histogram of validation errors (`actual - predicted`)
pub fn error_histogram(errors: &Array1<f64>, n_bins: usize) -> ChartSpec {
    ChartSpec::Histogram(Histogram {
        title: "Distribution of Prediction Errors".to_string(),
        x_title: "Prediction Error".to_string(),
        y_title: "Frequency".to_string(),
        color: Color::Magenta,
        bins: histogram_bins(errors, n_bins),
    })
}

/// Equal-width bins spanning the data range.
///
/// An empty input spans `[0, 1]`; a constant input spans `value ± 0.5`.
pub fn histogram_bins(values: &Array1<f64>, n_bins: usize) -> Vec<HistogramBin> {
    let n_bins = n_bins.max(1);
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    let (lo, hi) = match finite.iter().copied().fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }) {
        None => (0.0, 1.0),
        Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
        Some(range) => range,
    };

    let width = (hi - lo) / n_bins as f64;
    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == n_bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in finite {
        let idx = (((v - lo) / width) as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Actual vs predicted scatter with the `y = x` reference line
pub fn scatter_with_reference(actual: &Array1<f64>, predicted: &Array1<f64>) -> ChartSpec {
    let points: Vec<(f64, f64)> = actual.iter().copied().zip(predicted.iter().copied()).collect();

    let lo = actual.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = actual.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let reference = if lo.is_finite() && hi.is_finite() {
        vec![(lo, lo), (hi, hi)]
    } else {
        Vec::new()
    };

    let x_bounds = value_bounds(actual.iter().copied());
    let y_bounds = value_bounds(predicted.iter().copied().chain([lo, hi]));

    ChartSpec::Xy(XyChart {
        title: "Actual vs Predicted Sales (Scatter Plot)".to_string(),
        x_axis: numeric_axis("Actual Sales", x_bounds),
        y_axis: numeric_axis("Predicted Sales", y_bounds),
        series: vec![
            PlotSeries {
                name: "Predictions".to_string(),
                kind: SeriesKind::Scatter,
                color: Color::Green,
                points,
            },
            PlotSeries {
                name: "45° reference".to_string(),
                kind: SeriesKind::Line,
                color: Color::Red,
                points: reference,
            },
        ],
    })
}

/// Test-set predictions against their dates, in test row order
pub fn predicted_over_time(dates: &[NaiveDate], predicted: &Array1<f64>) -> ChartSpec {
    let points: Vec<(f64, f64)> = dates
        .iter()
        .zip(predicted.iter())
        .map(|(d, &v)| (d.num_days_from_ce() as f64, v))
        .collect();

    let first = dates.iter().min().copied();
    let last = dates.iter().max().copied();
    let x_axis = match (first, last) {
        (Some(first), Some(last)) => {
            let span = (last - first).num_days();
            let mid = first + chrono::Duration::days(span / 2);
            let hi = if span == 0 { first.num_days_from_ce() + 1 } else { last.num_days_from_ce() };
            AxisSpec {
                title: "Date".to_string(),
                bounds: [first.num_days_from_ce() as f64, hi as f64],
                labels: [first, mid, last].iter().map(|d| d.format("%Y-%m-%d").to_string()).collect(),
            }
        }
        _ => numeric_axis("Date", [0.0, 1.0]),
    };

    ChartSpec::Xy(XyChart {
        title: "Predicted Sales on Test Data".to_string(),
        x_axis,
        y_axis: numeric_axis("Sales", value_bounds(predicted.iter().copied())),
        series: vec![PlotSeries {
            name: "Predicted Sales (Test Set)".to_string(),
            kind: SeriesKind::Line,
            color: Color::Rgb(255, 165, 0),
            points,
        }],
    })
}

/// Finite min/max of `values`, padded by 5% and widened when degenerate
fn value_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() {
        return [0.0, 1.0];
    }
    if lo == hi {
        return [lo - 1.0, hi + 1.0];
    }
    let pad = (hi - lo) * 0.05;
    [lo - pad, hi + pad]
}

fn numeric_axis(title: &str, bounds: [f64; 2]) -> AxisSpec {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    AxisSpec {
        title: title.to_string(),
        bounds,
        labels: [bounds[0], mid, bounds[1]].iter().map(|v| format!("{:.1}", v)).collect(),
    }
}
