//! CSV ingest.
//!
//! Turns the raw dataset into `RawObservation`s without repairing anything:
//! date parsing, gap fill, and zero fill belong to the cleaning stage, which
//! also owns the error policy for malformed dates.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (keep what is usable, report what happened)
//! - **Deterministic behavior** (no hidden repair heuristics)

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Metric, RawObservation};
use crate::error::AppError;

/// Columns the pipeline reads. All of them must be present in the header.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "location",
    "date",
    "total_cases",
    "new_cases",
    "total_deaths",
    "new_deaths",
    "total_vaccinations",
    "people_vaccinated",
    "population",
];

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub entity: Option<String>,
    pub message: String,
}

/// Ingest output: raw rows + the file's header order + row problems.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub rows: Vec<RawObservation>,
    /// Header names as they appear in the file (original case and order).
    pub columns: Vec<String>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl LoadedData {
    /// Count of missing cells per required column over the loaded rows.
    ///
    /// `location` is always 0 here because rows without one are rejected at
    /// ingest and land in `row_errors` instead.
    pub fn missing_counts(&self) -> Vec<(&'static str, usize)> {
        let mut out = Vec::with_capacity(REQUIRED_COLUMNS.len());
        out.push(("location", 0));
        out.push((
            "date",
            self.rows.iter().filter(|r| r.date.is_none()).count(),
        ));
        for metric in Metric::ALL {
            out.push((
                metric.column_name(),
                self.rows
                    .iter()
                    .filter(|r| r.metric(metric).is_none())
                    .count(),
            ));
        }
        out.push((
            "population",
            self.rows.iter().filter(|r| r.population.is_none()).count(),
        ));
        out
    }
}

/// Load the dataset into raw observations.
///
/// A missing file maps to [`AppError::DatasetNotFound`]; any other open
/// failure falls back to the catch-all kind.
pub fn load_observations(path: &Path) -> Result<LoadedData, AppError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::DatasetNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AppError::Unexpected {
                message: format!("Failed to open '{}': {e}", path.display()),
            }
        }
    })?;
    read_observations(file)
}

/// Parse raw observations from any CSV reader.
///
/// Split from [`load_observations`] so tests can feed in-memory bytes.
pub fn read_observations<R: Read>(input: R) -> Result<LoadedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::MalformedInput {
            message: format!("failed to read CSV header: {e}"),
        })?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let columns: Vec<String> = headers.iter().map(|h| strip_bom(h).to_string()).collect();

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    entity: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok((row, cell_problems)) => {
                for message in cell_problems {
                    row_errors.push(RowError {
                        line,
                        entity: Some(row.entity.clone()),
                        message,
                    });
                }
                rows.push(row);
            }
            Err(message) => row_errors.push(RowError {
                line,
                entity: None,
                message,
            }),
        }
    }

    Ok(LoadedData {
        rows,
        columns,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn strip_bom(name: &str) -> &str {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿location"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    name.trim().trim_start_matches('\u{feff}')
}

fn normalize_header_name(name: &str) -> String {
    strip_bom(name).to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::MissingColumn {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Parse one record.
///
/// A row without a `location` is unusable and rejected. Unparseable numeric
/// cells degrade to missing values and are reported, so one bad cell does not
/// cost the whole row.
fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<(RawObservation, Vec<String>), String> {
    let entity = get_required(record, header_map, "location")?.to_string();
    let date = get_optional(record, header_map, "date").map(str::to_string);

    let mut problems = Vec::new();
    let mut row = RawObservation {
        entity,
        date,
        ..RawObservation::default()
    };

    for metric in Metric::ALL {
        let name = metric.column_name();
        *row.metric_mut(metric) =
            parse_numeric(get_optional(record, header_map, name), name, &mut problems);
    }
    row.population = parse_numeric(
        get_optional(record, header_map, "population"),
        "population",
        &mut problems,
    );

    Ok((row, problems))
}

/// Parse an optional numeric cell.
///
/// An empty cell is an ordinary missing value. A non-empty cell that does not
/// parse (or is not finite) also becomes missing, but gets reported.
fn parse_numeric(cell: Option<&str>, column: &str, problems: &mut Vec<String>) -> Option<f64> {
    let s = cell?;
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(_) => {
            problems.push(format!(
                "non-finite value '{s}' in `{column}`; treated as missing"
            ));
            None
        }
        Err(_) => {
            problems.push(format!(
                "invalid numeric value '{s}' in `{column}`; treated as missing"
            ));
            None
        }
    }
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}
