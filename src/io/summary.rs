//! Write the run summary JSON.
//!
//! The summary is the portable representation of a run:
//!
//! - where the data came from and which countries were kept
//! - row counts at each stage (read, cleaned, reported problems)
//! - the latest standing per country, the same table the report prints
//!
//! Undefined ratios serialize as `null` via `Option`, so consumers never see
//! a literal `NaN` token.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{AnalysisConfig, EntityRate, Observation};
use crate::error::AppError;
use crate::io::ingest::LoadedData;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub data_path: PathBuf,
    pub entities: Vec<String>,
    pub rows_read: usize,
    pub rows_cleaned: usize,
    pub row_problems: usize,
    /// Earliest cleaned date across all countries; `None` on an empty run.
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub latest: Vec<LatestEntry>,
}

/// One country's latest standing.
#[derive(Debug, Clone, Serialize)]
pub struct LatestEntry {
    pub entity: String,
    pub date: NaiveDate,
    pub total_cases: f64,
    pub total_deaths: f64,
    /// `None` when the ratio is undefined (no recorded cases).
    pub death_rate: Option<f64>,
    pub people_vaccinated: f64,
    /// Denominator actually used for `vaccinated_percent`.
    pub population: f64,
    /// `None` when the denominator is zero.
    pub vaccinated_percent: Option<f64>,
    pub population_overridden: bool,
}

/// Assemble the summary from pipeline outputs.
pub fn build_summary(
    config: &AnalysisConfig,
    loaded: &LoadedData,
    cleaned: &[Observation],
    latest: &BTreeMap<String, Observation>,
    rates: &[EntityRate],
) -> RunSummary {
    let latest_entries = rates
        .iter()
        .filter_map(|rate| {
            let obs = latest.get(rate.entity.as_str())?;
            Some(LatestEntry {
                entity: rate.entity.clone(),
                date: rate.date,
                total_cases: obs.total_cases,
                total_deaths: obs.total_deaths,
                death_rate: defined(obs.death_rate),
                people_vaccinated: rate.people_vaccinated,
                population: rate.population,
                vaccinated_percent: defined(rate.percent),
                population_overridden: rate.overridden,
            })
        })
        .collect();

    RunSummary {
        tool: "epi".to_string(),
        data_path: config.data_path.clone(),
        entities: config.entities.clone(),
        rows_read: loaded.rows_read,
        rows_cleaned: cleaned.len(),
        row_problems: loaded.row_errors.len(),
        first_date: cleaned.iter().map(|o| o.date).min(),
        last_date: cleaned.iter().map(|o| o.date).max(),
        latest: latest_entries,
    }
}

/// Write a summary JSON file.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::ExportFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::to_writer_pretty(file, summary).map_err(|e| AppError::ExportFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

fn defined(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
