//! Formatting helpers for terminal output.
//!
//! We keep formatting code in one place so:
//! - the cleaning code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use std::collections::BTreeMap;

use crate::domain::{AnalysisConfig, EntityRate, Observation, RawObservation};
use crate::io::ingest::LoadedData;

/// Number of raw rows shown in the exploration preview.
const PREVIEW_ROWS: usize = 5;
/// Number of row-level problems listed before the list is truncated.
const MAX_ROW_PROBLEMS: usize = 5;

pub fn format_banner(config: &AnalysisConfig) -> String {
    let mut out = String::new();
    out.push_str("=== epi - COVID-19 Data Analysis ===\n");
    out.push_str(&format!("Data: {}\n", config.data_path.display()));
    out.push_str(&format!("Countries: {}\n", config.entities.join(", ")));
    out
}

/// Format the dataset overview (shape, columns, preview, missing counts).
pub fn format_exploration(loaded: &LoadedData) -> String {
    let mut out = String::new();
    out.push_str("--- Data Exploration ---\n");
    out.push_str(&format!(
        "Shape: {} rows x {} columns\n",
        loaded.rows_read,
        loaded.columns.len()
    ));
    out.push_str(&format!("Columns: {}\n", loaded.columns.join(", ")));

    out.push_str("\nFirst rows:\n");
    out.push_str(&format_preview(&loaded.rows));

    out.push_str("\nMissing values per column:\n");
    for (name, count) in loaded.missing_counts() {
        out.push_str(&format!("  {name:<20} {count:>8}\n"));
    }
    out
}

fn format_preview(rows: &[RawObservation]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:>10} {:>12} {:>10} {:>12} {:>10} {:>12} {:>12} {:>12}\n",
            "location",
            "date",
            "total_cases",
            "new_cases",
            "total_deaths",
            "new_deaths",
            "total_vacc",
            "people_vacc",
            "population",
        )
        .trim_end(),
    );
    out.push('\n');

    for row in rows.iter().take(PREVIEW_ROWS) {
        out.push_str(
            format!(
                "{:<20} {:>10} {:>12} {:>10} {:>12} {:>10} {:>12} {:>12} {:>12}\n",
                truncate(&row.entity, 20),
                row.date.as_deref().unwrap_or(""),
                fmt_opt(row.total_cases),
                fmt_opt(row.new_cases),
                fmt_opt(row.total_deaths),
                fmt_opt(row.new_deaths),
                fmt_opt(row.total_vaccinations),
                fmt_opt(row.people_vaccinated),
                fmt_opt(row.population),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Format the cleaning recap (rows kept, undefined ratios, row problems).
pub fn format_clean_summary(loaded: &LoadedData, cleaned: &[Observation]) -> String {
    let mut out = String::new();
    out.push_str("--- Cleaning ---\n");
    out.push_str(&format!(
        "Rows after cleaning: {} (of {} loaded)\n",
        cleaned.len(),
        loaded.rows_read
    ));
    out.push_str("Missing values after cleaning: 0 across all columns\n");

    let undefined_death = cleaned.iter().filter(|o| o.death_rate.is_nan()).count();
    let undefined_vacc = cleaned
        .iter()
        .filter(|o| o.vaccination_rate.is_nan())
        .count();
    out.push_str(&format!(
        "Undefined ratios: death_rate on {undefined_death} rows, vaccination_rate on {undefined_vacc} rows\n"
    ));

    if !loaded.row_errors.is_empty() {
        out.push_str(&format!("Row-level problems: {}\n", loaded.row_errors.len()));
        for err in loaded.row_errors.iter().take(MAX_ROW_PROBLEMS) {
            match &err.entity {
                Some(entity) => {
                    out.push_str(&format!("  line {} ({entity}): {}\n", err.line, err.message));
                }
                None => out.push_str(&format!("  line {}: {}\n", err.line, err.message)),
            }
        }
        if loaded.row_errors.len() > MAX_ROW_PROBLEMS {
            out.push_str(&format!(
                "  ... and {} more\n",
                loaded.row_errors.len() - MAX_ROW_PROBLEMS
            ));
        }
    }
    out.push_str("\nData cleaning complete.\n");
    out
}

/// Format the latest standing per country, one row each, in the order `rates`
/// was built (alphabetical).
pub fn format_latest_table(
    latest: &BTreeMap<String, Observation>,
    rates: &[EntityRate],
) -> String {
    let mut out = String::new();
    out.push_str("Latest observation per country:\n");
    out.push_str(
        format!(
            "{:<20} {:>10} {:>14} {:>14} {:>11} {:>14} {:>15} {:>8}\n",
            "country",
            "date",
            "total_cases",
            "total_deaths",
            "death_rate",
            "people_vacc",
            "population",
            "vacc%",
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<20} {:-<10} {:-<14} {:-<14} {:-<11} {:-<14} {:-<15} {:-<8}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    let mut any_override = false;
    for rate in rates {
        let Some(obs) = latest.get(rate.entity.as_str()) else {
            continue;
        };
        let population = if rate.overridden {
            any_override = true;
            format!("{}*", fmt_count(rate.population))
        } else {
            fmt_count(rate.population)
        };
        out.push_str(
            format!(
                "{:<20} {:>10} {:>14} {:>14} {:>11} {:>14} {:>15} {:>8}\n",
                truncate(&rate.entity, 20),
                rate.date.to_string(),
                fmt_count(obs.total_cases),
                fmt_count(obs.total_deaths),
                fmt_pct(obs.death_rate * 100.0),
                fmt_count(rate.people_vaccinated),
                population,
                fmt_pct(rate.percent),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if any_override {
        out.push_str("(* population overridden from the command line)\n");
    }
    out
}

/// Format the numbered insight list.
pub fn format_insights(insights: &[String]) -> String {
    let mut out = String::new();
    out.push_str("--- Insights ---\n");
    if insights.is_empty() {
        out.push_str("(no insights: nothing comparable in the latest data)\n");
    }
    for (idx, line) in insights.iter().enumerate() {
        out.push_str(&format!("{}. {line}\n", idx + 1));
    }
    out
}

/// Group thousands for large counts ("1,380,004,385"). Values are rounded to
/// the nearest whole number first; the source columns are integral counts.
pub(crate) fn fmt_count(v: f64) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    let negative = v < 0.0;
    let digits = (v.abs().round() as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative { format!("-{grouped}") } else { grouped }
}

fn fmt_pct(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}%")
    } else {
        "n/a".to_string()
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v}"),
        None => String::new(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
