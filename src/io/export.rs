//! Export the cleaned dataset to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts, and feeding it back through the pipeline reproduces itself
//! (cleaning an already-clean dataset changes nothing).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::Observation;
use crate::error::AppError;

/// Write cleaned rows to a CSV file.
pub fn write_cleaned_csv(path: &Path, rows: &[Observation]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::ExportFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_cleaned(file, rows).map_err(|e| AppError::ExportFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write cleaned rows to any writer (split out for tests).
fn write_cleaned<W: Write>(mut out: W, rows: &[Observation]) -> std::io::Result<()> {
    writeln!(
        out,
        "location,date,total_cases,new_cases,total_deaths,new_deaths,total_vaccinations,people_vaccinated,population,death_rate,vaccination_rate"
    )?;

    for row in rows {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            escape(&row.entity),
            row.date,
            row.total_cases,
            row.new_cases,
            row.total_deaths,
            row.new_deaths,
            row.total_vaccinations,
            row.people_vaccinated,
            row.population,
            fmt_ratio(row.death_rate),
            fmt_ratio(row.vaccination_rate),
        )?;
    }

    Ok(())
}

/// Undefined ratios export as empty cells, not as a literal `NaN`.
fn fmt_ratio(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v}")
    }
}

/// Quote a field when it would break the CSV shape.
///
/// Country names with commas exist ("Korea, South" in some exports).
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(entity: &str, cases: f64, deaths: f64) -> Observation {
        Observation {
            entity: entity.to_string(),
            date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            total_cases: cases,
            new_cases: 0.0,
            total_deaths: deaths,
            new_deaths: 0.0,
            total_vaccinations: 0.0,
            people_vaccinated: 0.0,
            population: 1000.0,
            death_rate: crate::clean::ratio(deaths, cases),
            vaccination_rate: 0.0,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let rows = vec![obs("Kenya", 100.0, 5.0)];
        let mut buf = Vec::new();
        write_cleaned(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("location,date,total_cases"));
        assert_eq!(
            lines.next().unwrap(),
            "Kenya,2021-06-01,100,0,5,0,0,0,1000,0.05,0"
        );
    }

    #[test]
    fn undefined_ratio_exports_as_empty_cell() {
        let rows = vec![obs("Kenya", 0.0, 0.0)];
        let mut buf = Vec::new();
        write_cleaned(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.ends_with(",,0"), "death_rate cell should be empty: {row}");
    }

    #[test]
    fn commas_in_names_are_quoted() {
        let rows = vec![obs("Korea, South", 10.0, 1.0)];
        let mut buf = Vec::new();
        write_cleaned(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"Korea, South\""));
    }
}
