//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads and cleans the dataset
//! - prints the exploration/cleaning/latest report
//! - renders terminal and SVG charts
//! - writes optional exports

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use crate::cli::{AnalyzeArgs, Command};
use crate::domain::{AnalysisConfig, SeriesKind};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `epi` binary.
pub fn run() -> Result<(), AppError> {
    run_from(
        std::env::args().collect(),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
}

/// Parse `argv`, dispatch, and report the outcome on the given sinks.
///
/// On failure the error line goes to `errs` first, then the completion
/// notice goes to `out`; the notice is emitted either way, and the caller
/// turns the returned error into the process exit code.
pub fn run_from<O: Write, E: Write>(
    argv: Vec<String>,
    out: &mut O,
    errs: &mut E,
) -> Result<(), AppError> {
    // We want `epi` and `epi -d data.csv` to behave like `epi analyze ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(argv);
    let cli = crate::cli::Cli::parse_from(argv);

    let result = match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Clean(args) => handle_clean(args),
        Command::Latest(args) => handle_latest(args),
    };

    if let Err(err) = &result {
        let _ = writeln!(errs, "Error: {err}");
    }
    // Printed on failure too; the exit code carries the outcome.
    let _ = writeln!(out, "\nAnalysis complete.");
    result
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let run = pipeline::run_analysis(&config)?;

    // Print terminal output.
    println!("{}", crate::report::format_banner(&config));
    println!("{}", crate::report::format_exploration(&run.loaded));
    println!(
        "{}",
        crate::report::format_clean_summary(&run.loaded, &run.cleaned)
    );
    println!(
        "{}",
        crate::report::format_latest_table(&run.latest, &run.latest_rates)
    );

    if config.plot {
        println!("--- Exploratory Data Analysis ---\n");
        for kind in SeriesKind::EXPLORATORY {
            let data = crate::plot::prepare(&run.cleaned, &config.entities, kind);
            println!(
                "{}",
                crate::plot::ascii::render_chart(&data, config.plot_width, config.plot_height)
            );
        }

        println!("--- Vaccination Analysis ---\n");
        for kind in SeriesKind::VACCINATION {
            let data = crate::plot::prepare(&run.cleaned, &config.entities, kind);
            println!(
                "{}",
                crate::plot::ascii::render_chart(&data, config.plot_width, config.plot_height)
            );
        }
        println!(
            "{}",
            crate::plot::ascii::render_bars(&run.latest_rates, config.plot_width)
        );
    }

    if let Some(dir) = &config.out_dir {
        let written =
            crate::plot::svg::write_chart_set(dir, &run.cleaned, &run.latest_rates, &config)?;
        println!("Wrote {} charts to '{}'.\n", written.len(), dir.display());
    }

    let insights = crate::report::derive_insights(&run.latest, &run.latest_rates);
    println!("{}", crate::report::format_insights(&insights));

    // Optional exports.
    if let Some(path) = &config.export {
        crate::io::export::write_cleaned_csv(path, &run.cleaned)?;
        println!("Cleaned dataset written to '{}'.", path.display());
    }
    if let Some(path) = &config.export_summary {
        let summary = crate::io::summary::build_summary(
            &config,
            &run.loaded,
            &run.cleaned,
            &run.latest,
            &run.latest_rates,
        );
        crate::io::summary::write_summary_json(path, &summary)?;
        println!("Run summary written to '{}'.", path.display());
    }

    Ok(())
}

fn handle_clean(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let run = pipeline::run_analysis(&config)?;

    println!(
        "{}",
        crate::report::format_clean_summary(&run.loaded, &run.cleaned)
    );

    let path = config
        .export
        .clone()
        .unwrap_or_else(|| PathBuf::from("cleaned.csv"));
    crate::io::export::write_cleaned_csv(&path, &run.cleaned)?;
    println!("Cleaned dataset written to '{}'.", path.display());
    Ok(())
}

fn handle_latest(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let run = pipeline::run_analysis(&config)?;

    println!(
        "{}",
        crate::report::format_latest_table(&run.latest, &run.latest_rates)
    );

    if let Some(path) = &config.export_summary {
        let summary = crate::io::summary::build_summary(
            &config,
            &run.loaded,
            &run.cleaned,
            &run.latest,
            &run.latest_rates,
        );
        crate::io::summary::write_summary_json(path, &summary)?;
        println!("Run summary written to '{}'.", path.display());
    }
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        data_path: args.data.clone(),
        entities: args.countries.clone(),
        population_overrides: args.population_overrides.iter().cloned().collect(),
        out_dir: (args.charts && !args.no_charts).then(|| args.out_dir.clone()),
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export: args.export.clone(),
        export_summary: args.export_summary.clone(),
    }
}

/// Rewrite argv so `epi` defaults to `epi analyze`.
///
/// Rules:
/// - `epi`                      -> `epi analyze`
/// - `epi -d data.csv ...`      -> `epi analyze -d data.csv ...`
/// - `epi --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "clean" | "latest");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "analyze flags".
    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
