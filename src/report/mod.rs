//! Reporting: derived insights and formatted terminal output.

use std::collections::BTreeMap;

use crate::domain::{EntityRate, Observation};

pub mod format;

pub use format::*;

/// Derive the closing insights from the latest standings.
///
/// Each insight names the country the data actually points at, so the lines
/// stay correct when the selection changes. Undefined ratios are left out of
/// comparisons; NaN never wins one.
pub fn derive_insights(
    latest: &BTreeMap<String, Observation>,
    rates: &[EntityRate],
) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(obs) = max_by_key(latest.values(), |o| o.total_cases) {
        out.push(format!(
            "{} has the highest total number of COVID-19 cases among the selected countries ({}).",
            obs.entity,
            format::fmt_count(obs.total_cases)
        ));
    }

    if let Some(obs) = max_by_key(latest.values(), |o| o.total_vaccinations) {
        out.push(format!(
            "{} has administered the highest total number of vaccinations ({}).",
            obs.entity,
            format::fmt_count(obs.total_vaccinations)
        ));
    }

    let mut defined: Vec<&EntityRate> = rates.iter().filter(|r| r.percent.is_finite()).collect();
    defined.sort_by(|a, b| {
        a.percent
            .partial_cmp(&b.percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(lowest) = defined.first() {
        out.push(format!(
            "{} has the lowest vaccination rate among the selected countries ({:.2}% of the population).",
            lowest.entity, lowest.percent
        ));
    }

    let mut death_rates: Vec<&Observation> = latest
        .values()
        .filter(|o| o.death_rate.is_finite())
        .collect();
    death_rates.sort_by(|a, b| {
        a.death_rate
            .partial_cmp(&b.death_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    match (death_rates.first(), death_rates.last()) {
        (Some(lo), Some(hi)) if lo.entity != hi.entity => {
            out.push(format!(
                "Latest death rates range from {:.2}% ({}) to {:.2}% ({}).",
                lo.death_rate * 100.0,
                lo.entity,
                hi.death_rate * 100.0,
                hi.entity
            ));
        }
        (Some(only), _) => {
            out.push(format!(
                "The latest death rate for {} stands at {:.2}%.",
                only.entity,
                only.death_rate * 100.0
            ));
        }
        _ => {}
    }

    out
}

fn max_by_key<'a, I, F>(items: I, key: F) -> Option<&'a Observation>
where
    I: Iterator<Item = &'a Observation>,
    F: Fn(&Observation) -> f64,
{
    items
        .filter(|o| key(o).is_finite())
        .max_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal))
}
