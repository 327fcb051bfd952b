//! Terminal rendering of diagnostic charts

use super::charts::{ChartSpec, Histogram, SeriesKind, XyChart};
use crate::error::{ForecastError, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType},
};
use std::io;
use tracing::debug;

/// Draw one chart over the whole frame
pub fn render_chart(frame: &mut Frame, chart: &ChartSpec) {
    let area = frame.area();
    match chart {
        ChartSpec::Xy(xy) => render_xy(frame, area, xy),
        ChartSpec::Histogram(hist) => render_histogram(frame, area, hist),
    }
}

fn render_xy(frame: &mut Frame, area: Rect, chart: &XyChart) {
    let datasets: Vec<Dataset> = chart
        .series
        .iter()
        .map(|s| {
            let (marker, graph_type) = match s.kind {
                SeriesKind::Line => (Marker::Braille, GraphType::Line),
                SeriesKind::Scatter => (Marker::Dot, GraphType::Scatter),
            };
            Dataset::default()
                .name(s.name.clone())
                .marker(marker)
                .graph_type(graph_type)
                .style(Style::default().fg(s.color))
                .data(&s.points)
        })
        .collect();

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", chart.title)))
        .x_axis(
            Axis::default()
                .title(chart.x_axis.title.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds(chart.x_axis.bounds)
                .labels(chart.x_axis.labels.iter().map(|l| Span::raw(l.clone())).collect::<Vec<_>>()),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_axis.title.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds(chart.y_axis.bounds)
                .labels(chart.y_axis.labels.iter().map(|l| Span::raw(l.clone())).collect::<Vec<_>>()),
        );

    frame.render_widget(widget, area);
}

fn render_histogram(frame: &mut Frame, area: Rect, hist: &Histogram) {
    let bars: Vec<Bar> = hist
        .bins
        .iter()
        .map(|bin| {
            Bar::default()
                .value(bin.count)
                .label(Line::from(format!("{:.1}", bin.center())))
                .style(Style::default().fg(hist.color))
        })
        .collect();

    let n_bins = hist.bins.len().max(1) as u16;
    let inner_width = area.width.saturating_sub(2);
    let bar_gap = 1u16;
    let bar_width = (inner_width / n_bins).saturating_sub(bar_gap).max(1);

    let title = format!(" {} ({} vs {}) ", hist.title, hist.x_title, hist.y_title);
    let widget = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(bar_gap);

    frame.render_widget(widget, area);
}

/// Shows charts full-screen one at a time, advancing on any key press
pub struct ChartViewer;

impl ChartViewer {
    /// Render every chart in turn on the alternate screen.
    ///
    /// The terminal is restored even when drawing fails.
    pub fn show(charts: &[ChartSpec]) -> Result<()> {
        enable_raw_mode().map_err(render_err)?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(render_err(e));
        }

        let result = Terminal::new(CrosstermBackend::new(io::stdout()))
            .map_err(render_err)
            .and_then(|mut terminal| {
                let shown = Self::show_all(&mut terminal, charts);
                let _ = terminal.show_cursor();
                shown
            });

        disable_raw_mode().map_err(render_err)?;
        execute!(io::stdout(), LeaveAlternateScreen).map_err(render_err)?;
        result
    }

    fn show_all<B: Backend>(terminal: &mut Terminal<B>, charts: &[ChartSpec]) -> Result<()> {
        for (i, chart) in charts.iter().enumerate() {
            debug!(chart = chart.title(), index = i, "Rendering chart");
            terminal.draw(|frame| render_chart(frame, chart)).map_err(render_err)?;
            wait_for_key()?;
        }
        Ok(())
    }
}

fn wait_for_key() -> Result<()> {
    loop {
        match event::read().map_err(render_err)? {
            Event::Key(key) if key.kind == KeyEventKind::Press => return Ok(()),
            _ => {}
        }
    }
}

fn render_err(err: io::Error) -> ForecastError {
    ForecastError::RenderError(err.to_string())
}
