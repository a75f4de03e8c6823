//! Shared analysis pipeline used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> clean -> latest standings -> vaccination rates
//!
//! The subcommand handlers can then focus on presentation (what to print and
//! which files to write).

use std::collections::BTreeMap;

use crate::clean;
use crate::domain::{AnalysisConfig, EntityRate, Observation};
use crate::error::AppError;
use crate::io::ingest::{self, LoadedData};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub loaded: LoadedData,
    pub cleaned: Vec<Observation>,
    /// Latest cleaned observation per country, keyed alphabetically.
    pub latest: BTreeMap<String, Observation>,
    pub latest_rates: Vec<EntityRate>,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    // 1) Load the raw dataset.
    let loaded = ingest::load_observations(&config.data_path)?;

    run_analysis_with_data(config, loaded)
}

/// Execute the pipeline on pre-loaded data.
///
/// This is the seam tests use to feed in-memory datasets.
pub fn run_analysis_with_data(
    config: &AnalysisConfig,
    loaded: LoadedData,
) -> Result<RunOutput, AppError> {
    // 2) Clean: filter, parse dates, fill gaps, derive ratios.
    let cleaned = clean::clean(&loaded.rows, &config.entities)?;
    if cleaned.is_empty() {
        return Err(AppError::EmptySelection {
            entities: config.entities.clone(),
        });
    }

    // 3) Latest standing per country, with population overrides applied.
    let latest = clean::latest(&cleaned);
    let latest_rates = clean::latest_vaccination_rates(&latest, &config.population_overrides);

    Ok(RunOutput {
        loaded,
        cleaned,
        latest,
        latest_rates,
    })
}
