//! Chart rendering.
//!
//! Two renderers share one data-preparation step:
//!
//! - `ascii`: fixed-size character grids for the terminal
//! - `svg`: the Plotters chart set written to an output directory
//!
//! NaN marks an undefined point (e.g. a death rate before the first recorded
//! case). Those points are dropped from series and ranges here, so neither
//! renderer has to special-case them.

use chrono::{Duration, NaiveDate};

use crate::domain::{Observation, SeriesKind};

pub mod ascii;
pub mod svg;

/// One country's drawable series: finite points only, in date order.
#[derive(Debug, Clone)]
pub struct EntitySeries {
    pub entity: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Prepared input for one chart.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub kind: SeriesKind,
    /// Series in the CLI's country order (drives marker/color assignment).
    pub series: Vec<EntitySeries>,
    /// Min/max date over all finite points; `None` when nothing is drawable.
    pub x_range: Option<(NaiveDate, NaiveDate)>,
    /// Min/max value over all finite points; `None` when nothing is drawable.
    pub y_range: Option<(f64, f64)>,
}

/// Collect the drawable series for one chart.
pub fn prepare(cleaned: &[Observation], entities: &[String], kind: SeriesKind) -> ChartData {
    let mut series = Vec::with_capacity(entities.len());
    for entity in entities {
        let mut points: Vec<(NaiveDate, f64)> = cleaned
            .iter()
            .filter(|row| row.entity == *entity)
            .map(|row| (row.date, kind.value(row)))
            .filter(|&(_, value)| value.is_finite())
            .collect();
        points.sort_by_key(|&(date, _)| date);
        series.push(EntitySeries {
            entity: entity.clone(),
            points,
        });
    }

    let mut x_range: Option<(NaiveDate, NaiveDate)> = None;
    let mut y_range: Option<(f64, f64)> = None;
    for s in &series {
        for &(date, value) in &s.points {
            x_range = Some(match x_range {
                None => (date, date),
                Some((lo, hi)) => (lo.min(date), hi.max(date)),
            });
            y_range = Some(match y_range {
                None => (value, value),
                Some((lo, hi)) => (lo.min(value), hi.max(value)),
            });
        }
    }

    ChartData {
        kind,
        series,
        x_range,
        y_range,
    }
}

/// Pad a y-range so extremes don't sit on the frame.
///
/// A flat series still gets a visible band around it.
pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 {
        span * frac
    } else {
        min.abs().max(1.0) * frac
    };
    (min - pad, max + pad)
}

/// Widen a zero-width date range by a day on each side.
pub(crate) fn date_span(range: (NaiveDate, NaiveDate)) -> (NaiveDate, NaiveDate) {
    let (lo, hi) = range;
    if lo == hi {
        (lo - Duration::days(1), hi + Duration::days(1))
    } else {
        (lo, hi)
    }
}

/// X range used when a chart has no drawable points at all.
pub(crate) fn placeholder_dates() -> (NaiveDate, NaiveDate) {
    let lo = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    (lo, lo + Duration::days(1))
}
