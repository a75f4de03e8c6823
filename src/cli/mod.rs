//! Command-line parsing for the COVID-19 analysis pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the cleaning/charting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "epi", version, about = "COVID-19 Trend Analysis (OWID dataset)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: explore, clean, chart, and report.
    Analyze(AnalyzeArgs),
    /// Clean the dataset and export it as CSV (no charts, no insights).
    Clean(AnalyzeArgs),
    /// Print the latest per-country standing only (useful for scripting).
    Latest(AnalyzeArgs),
}

/// Common options for all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Path to the OWID-format CSV dataset.
    #[arg(short = 'd', long, default_value = "owid-covid-data.csv")]
    pub data: PathBuf,

    /// Country to include (repeat the flag for several).
    #[arg(
        long = "country",
        value_name = "NAME",
        default_values_t = ["Kenya".to_string(), "United States".to_string(), "India".to_string()]
    )]
    pub countries: Vec<String>,

    /// Override a population denominator (repeatable).
    #[arg(long = "population", value_name = "NAME=COUNT", value_parser = parse_population_override)]
    pub population_overrides: Vec<(String, f64)>,

    /// Directory for the SVG chart set.
    #[arg(long, default_value = "charts")]
    pub out_dir: PathBuf,

    /// Write the SVG chart set (enabled by default).
    #[arg(long, default_value_t = true)]
    pub charts: bool,

    /// Disable SVG chart output.
    #[arg(long)]
    pub no_charts: bool,

    /// Render ASCII charts in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the cleaned dataset to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export a machine-readable run summary to JSON.
    #[arg(long = "export-summary")]
    pub export_summary: Option<PathBuf>,
}

/// Parse a `NAME=COUNT` population override.
fn parse_population_override(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=COUNT, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("expected NAME=COUNT, got '{s}'"));
    }
    let count = value.trim();
    let population: f64 = count
        .parse()
        .map_err(|_| format!("invalid population count '{count}'"))?;
    if !population.is_finite() || population < 0.0 {
        return Err(format!(
            "population count must be a non-negative number, got '{count}'"
        ));
    }
    Ok((name.to_string(), population))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_override_parses_name_and_count() {
        let (name, count) = parse_population_override("Kenya=55000000").unwrap();
        assert_eq!(name, "Kenya");
        assert_eq!(count, 55_000_000.0);

        // Whitespace around either side is tolerated.
        let (name, count) = parse_population_override(" United States = 331900000 ").unwrap();
        assert_eq!(name, "United States");
        assert_eq!(count, 331_900_000.0);
    }

    #[test]
    fn population_override_rejects_bad_input() {
        assert!(parse_population_override("Kenya").is_err());
        assert!(parse_population_override("=55000000").is_err());
        assert!(parse_population_override("Kenya=lots").is_err());
        assert!(parse_population_override("Kenya=-1").is_err());
        assert!(parse_population_override("Kenya=inf").is_err());
    }

    #[test]
    fn analyze_defaults_select_three_countries() {
        let cli = Cli::try_parse_from(["epi", "analyze"]).unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.countries, vec!["Kenya", "United States", "India"]);
        assert_eq!(args.data, PathBuf::from("owid-covid-data.csv"));
        assert!(args.charts);
        assert!(args.plot);
    }

    #[test]
    fn explicit_countries_replace_the_defaults() {
        let cli = Cli::try_parse_from([
            "epi",
            "analyze",
            "--country",
            "Brazil",
            "--population",
            "Brazil=213000000",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.countries, vec!["Brazil"]);
        assert_eq!(
            args.population_overrides,
            vec![("Brazil".to_string(), 213_000_000.0)]
        );
    }
}
