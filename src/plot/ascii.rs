//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each country gets a marker glyph, reused for the line segments between its
//! points so overlapping series stay tellable apart. A legend line maps
//! glyphs to countries.

use chrono::NaiveDate;

use crate::domain::EntityRate;
use crate::plot::{ChartData, EntitySeries, date_span, pad_range, placeholder_dates};

/// Marker glyphs, assigned to countries in CLI order.
const MARKERS: [char; 6] = ['*', 'o', '+', 'x', '#', '@'];

/// Render one line chart as a character grid.
pub fn render_chart(data: &ChartData, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = match data.x_range {
        Some(range) => date_span(range),
        None => placeholder_dates(),
    };
    let (y_min, y_max) = data.y_range.unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for (idx, series) in data.series.iter().enumerate() {
        let marker = MARKERS[idx % MARKERS.len()];
        draw_series(&mut grid, &series.points, marker, x_min, x_max, y_min, y_max);
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", data.kind.title()));
    out.push_str(&format!(
        "Plot: date=[{x_min}, {x_max}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out.push_str(&legend(&data.series));
    out
}

/// Render the latest-vaccination bar chart.
///
/// One row per country, bar length proportional to the highest rate on
/// display. An undefined rate renders as a note instead of a zero-length bar.
pub fn render_bars(rates: &[EntityRate], width: usize) -> String {
    let width = width.max(30);
    let name_width = rates
        .iter()
        .map(|r| r.entity.chars().count())
        .max()
        .unwrap_or(0)
        .max(7);
    let bar_width = width.saturating_sub(name_width + 12).max(10);

    let max_pct = rates
        .iter()
        .map(|r| r.percent)
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);

    let mut out = String::from("Latest Vaccination Rate by Country\n");
    for rate in rates {
        if rate.percent.is_finite() {
            let frac = if max_pct > 0.0 {
                (rate.percent / max_pct).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let filled = (frac * bar_width as f64).round() as usize;
            out.push_str(&format!(
                "{:<name_width$} | {:<bar_width$} {:>6.2}%\n",
                rate.entity,
                "#".repeat(filled),
                rate.percent,
            ));
        } else {
            out.push_str(&format!(
                "{:<name_width$} | {:<bar_width$} (undefined: population is 0)\n",
                rate.entity, "",
            ));
        }
    }
    out
}

fn legend(series: &[EntitySeries]) -> String {
    let mut out = String::from("Legend:");
    for (idx, s) in series.iter().enumerate() {
        out.push_str(&format!(" {} {}", MARKERS[idx % MARKERS.len()], s.entity));
    }
    out.push('\n');
    out
}

fn draw_series(
    grid: &mut [Vec<char>],
    points: &[(NaiveDate, f64)],
    marker: char,
    x_min: NaiveDate,
    x_max: NaiveDate,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev: Option<(usize, usize)> = None;
    for &(date, value) in points {
        let x = map_x(date, x_min, x_max, width);
        let y = map_y(value, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, y, marker);
        }
        prev = Some((x, y));
    }

    // Stamp the actual data points last so they win over line segments.
    for &(date, value) in points {
        let x = map_x(date, x_min, x_max, width);
        let y = map_y(value, y_min, y_max, height);
        grid[y][x] = marker;
    }
}

fn map_x(date: NaiveDate, x_min: NaiveDate, x_max: NaiveDate, width: usize) -> usize {
    let width = width.max(2);
    let span = (x_max - x_min).num_days().max(1) as f64;
    let u = ((date - x_min).num_days() as f64 / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(value: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((value - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written, so
/// earlier series keep their pixels.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, SeriesKind};
    use crate::plot::prepare;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(entity: &str, date: NaiveDate, cases: f64) -> Observation {
        Observation {
            entity: entity.to_string(),
            date,
            total_cases: cases,
            new_cases: 0.0,
            total_deaths: 0.0,
            new_deaths: 0.0,
            total_vaccinations: 0.0,
            people_vaccinated: 0.0,
            population: 1000.0,
            death_rate: f64::NAN,
            vaccination_rate: 0.0,
        }
    }

    fn rate(entity: &str, percent: f64) -> EntityRate {
        EntityRate {
            entity: entity.to_string(),
            date: date(2021, 6, 1),
            people_vaccinated: 0.0,
            population: 100.0,
            percent,
            overridden: false,
        }
    }

    #[test]
    fn chart_golden_snapshot_small() {
        let rows = vec![
            obs("Kenya", date(2021, 1, 1), 0.0),
            obs("Kenya", date(2021, 1, 10), 9.0),
        ];
        let entities = vec!["Kenya".to_string()];
        let data = prepare(&rows, &entities, SeriesKind::TotalCases);

        let txt = render_chart(&data, 10, 5);
        let expected = concat!(
            "Total COVID-19 Cases Over Time\n",
            "Plot: date=[2021-01-01, 2021-01-10] | y=[-0.45, 9.45]\n",
            "        **\n",
            "      **  \n",
            "    **    \n",
            "  **      \n",
            "**        \n",
            "Legend: * Kenya\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn second_series_gets_its_own_marker() {
        let rows = vec![
            obs("Kenya", date(2021, 1, 1), 0.0),
            obs("Kenya", date(2021, 1, 10), 9.0),
            obs("India", date(2021, 1, 1), 9.0),
            obs("India", date(2021, 1, 10), 0.0),
        ];
        let entities = vec!["Kenya".to_string(), "India".to_string()];
        let data = prepare(&rows, &entities, SeriesKind::TotalCases);

        let txt = render_chart(&data, 20, 8);
        assert!(txt.contains('*'));
        assert!(txt.contains('o'));
        assert!(txt.contains("Legend: * Kenya o India"));
    }

    #[test]
    fn empty_chart_still_renders_frame_and_legend() {
        let data = prepare(&[], &["Kenya".to_string()], SeriesKind::DeathRate);
        let txt = render_chart(&data, 10, 5);
        assert!(txt.starts_with("COVID-19 Death Rate"));
        assert!(txt.ends_with("Legend: * Kenya\n"));
    }

    #[test]
    fn bars_scale_to_the_largest_rate() {
        let rates = vec![rate("India", 50.0), rate("Kenya", 20.0)];
        let txt = render_bars(&rates, 40);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Latest Vaccination Rate by Country");
        let india_bars = lines[1].matches('#').count();
        let kenya_bars = lines[2].matches('#').count();
        assert_eq!(india_bars, 21, "largest rate fills the bar width");
        assert_eq!(kenya_bars, 8, "40% of the largest rate");
        assert!(lines[1].ends_with("50.00%"));
        assert!(lines[2].ends_with("20.00%"));
    }

    #[test]
    fn undefined_rate_renders_note_instead_of_bar() {
        let rates = vec![rate("Narnia", f64::NAN)];
        let txt = render_bars(&rates, 40);
        assert!(txt.contains("(undefined: population is 0)"));
        assert!(!txt.contains('#'));
    }
}
