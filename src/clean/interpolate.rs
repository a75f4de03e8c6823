//! Linear gap-fill for date-ordered series.
//!
//! Interior runs of missing values are replaced with points on the straight
//! line between the nearest known neighbors, weighted by calendar distance:
//! a value one day after the left neighbor of a ten-day gap lands at 10% of
//! the rise, not at the index midpoint.
//!
//! Only interior gaps are touched:
//!
//! - values before the first known point stay missing
//! - values after the last known point stay missing
//!
//! The residual zero-fill at the end of cleaning handles those edges.

use chrono::NaiveDate;

/// Fill interior gaps in a date-ordered series.
///
/// `series` must be sorted by date ascending (duplicate dates are allowed).
/// Returns a vector of the same length with interior `None`s replaced.
pub fn fill_linear(series: &[(NaiveDate, Option<f64>)]) -> Vec<Option<f64>> {
    let mut out: Vec<Option<f64>> = series.iter().map(|&(_, value)| value).collect();

    // Positions of known values, in order.
    let known: Vec<usize> = series
        .iter()
        .enumerate()
        .filter_map(|(idx, (_, value))| value.map(|_| idx))
        .collect();

    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue; // adjacent knowns, nothing to fill
        }
        let (Some(v0), Some(v1)) = (out[lo], out[hi]) else {
            continue;
        };
        let d0 = series[lo].0;
        let span = (series[hi].0 - d0).num_days();

        for idx in (lo + 1)..hi {
            let value = if span == 0 {
                // The bracketing rows share a date; there is no time axis to
                // walk, so the gap takes the left value.
                v0
            } else {
                let elapsed = (series[idx].0 - d0).num_days() as f64;
                v0 + (v1 - v0) * (elapsed / span as f64)
            };
            out[idx] = Some(value);
        }
    }

    out
}
