//! SVG chart set rendering (Plotters).
//!
//! Every chart is rendered to an in-memory string first; files are staged
//! under temporary names and renamed into place only after the whole set is
//! on disk. Neither a render failure nor a write failure leaves a partial
//! chart set behind.
//!
//! Charts are independent, so rendering runs in parallel. Output paths come
//! back in presentation order regardless of which chart finished first.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::prelude::*;
use rayon::prelude::*;

use crate::domain::{AnalysisConfig, EntityRate, Observation, SeriesKind};
use crate::error::AppError;
use crate::plot::{ChartData, date_span, pad_range, placeholder_dates, prepare};

/// Chart pixel size (matches a 12x6 inch figure at screen resolution).
const CHART_SIZE: (u32, u32) = (1200, 600);

/// Series palette, assigned to countries in CLI order.
const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),  // blue
    RGBColor(255, 127, 14),  // orange
    RGBColor(44, 160, 44),   // green
    RGBColor(214, 39, 40),   // red
    RGBColor(148, 103, 189), // purple
    RGBColor(140, 86, 75),   // brown
];

/// File name of the latest-vaccination bar chart.
const BAR_CHART_FILE: &str = "latest_vaccination_rate";

/// Render the full chart set and write it under `dir`.
///
/// Returns the written paths in presentation order.
pub fn write_chart_set(
    dir: &Path,
    cleaned: &[Observation],
    rates: &[EntityRate],
    config: &AnalysisConfig,
) -> Result<Vec<PathBuf>, AppError> {
    let mut charts: Vec<(&'static str, String)> = SeriesKind::ALL
        .par_iter()
        .map(|&kind| {
            let data = prepare(cleaned, &config.entities, kind);
            render_line_chart(&data).map(|svg| (kind.file_stem(), svg))
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    charts.push((BAR_CHART_FILE, render_bar_chart(rates)?));

    fs::create_dir_all(dir).map_err(|e| AppError::ExportFailed {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    // Stage the whole set first; a failed write discards the staged files
    // instead of leaving a partial set under the final names.
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(charts.len());
    for (stem, svg) in &charts {
        let tmp = dir.join(format!("{stem}.svg.tmp"));
        if let Err(e) = fs::write(&tmp, svg) {
            discard_staged(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(AppError::ExportFailed {
                path: tmp,
                message: e.to_string(),
            });
        }
        staged.push((tmp, dir.join(format!("{stem}.svg"))));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (tmp, path) in &staged {
        // Windows rename does not replace; drop any chart from a previous run.
        let _ = fs::remove_file(path);
        if let Err(e) = fs::rename(tmp, path) {
            discard_staged(&staged);
            return Err(AppError::ExportFailed {
                path: path.clone(),
                message: e.to_string(),
            });
        }
        written.push(path.clone());
    }

    Ok(written)
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

/// Render one multi-country line chart to an SVG string.
fn render_line_chart(data: &ChartData) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        draw_line_chart(&root, data).map_err(|e| AppError::ChartRender {
            chart: data.kind.title().to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(svg)
}

fn draw_line_chart(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    data: &ChartData,
) -> Result<(), Box<dyn std::error::Error>> {
    root.fill(&WHITE)?;

    let (x_min, x_max) = match data.x_range {
        Some(range) => date_span(range),
        None => placeholder_dates(),
    };
    let (y_min, y_max) = data.y_range.unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut chart = ChartBuilder::on(root)
        .caption(data.kind.title(), ("sans-serif", 24))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 46)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc(data.kind.y_label())
        .x_labels(8)
        .y_labels(6)
        .x_label_formatter(&|date: &NaiveDate| date.format("%Y-%m").to_string())
        .label_style(("sans-serif", 13))
        .draw()?;

    for (idx, series) in data.series.iter().enumerate() {
        if series.points.is_empty() {
            continue;
        }
        let color = PALETTE[idx % PALETTE.len()];
        chart
            .draw_series(LineSeries::new(
                series.points.iter().copied(),
                color.stroke_width(2),
            ))?
            .label(series.entity.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .label_font(("sans-serif", 14))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Render the latest-vaccination bar chart to an SVG string.
fn render_bar_chart(rates: &[EntityRate]) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        draw_bar_chart(&root, rates).map_err(|e| AppError::ChartRender {
            chart: "Latest Vaccination Rate by Country".to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(svg)
}

fn draw_bar_chart(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    rates: &[EntityRate],
) -> Result<(), Box<dyn std::error::Error>> {
    root.fill(&WHITE)?;

    let max_pct = rates
        .iter()
        .map(|r| r.percent)
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);
    let y_max = if max_pct > 0.0 { max_pct * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption("Latest Vaccination Rate by Country", ("sans-serif", 24))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 46)
        .build_cartesian_2d((0usize..rates.len().max(1)).into_segmented(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Country")
        .y_desc("% of Population Vaccinated")
        .x_labels(rates.len().max(1))
        .x_label_formatter(&|seg: &SegmentValue<usize>| match seg {
            SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => rates
                .get(*idx)
                .map(|r| r.entity.clone())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .label_style(("sans-serif", 13))
        .draw()?;

    // Undefined rates get no bar; their slot stays empty under the label.
    chart.draw_series(
        rates
            .iter()
            .enumerate()
            .filter(|(_, r)| r.percent.is_finite())
            .map(|(idx, r)| {
                let color = PALETTE[idx % PALETTE.len()];
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(idx), 0.0),
                        (SegmentValue::Exact(idx + 1), r.percent),
                    ],
                    color.filled(),
                );
                bar.set_margin(0, 0, 18, 18);
                bar
            }),
    )?;

    root.present()?;
    Ok(())
}
