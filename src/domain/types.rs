//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - carried through cleaning in-memory
//! - exported to CSV/JSON
//! - reused by both chart renderers without conversion

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

/// The numeric dataset columns the cleaning stage repairs.
///
/// Interpolation and residual zero-fill run over exactly this set.
/// `population` is deliberately not a metric: populations are never
/// interpolated, only zero-filled when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalCases,
    NewCases,
    TotalDeaths,
    NewDeaths,
    TotalVaccinations,
    PeopleVaccinated,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::TotalCases,
        Metric::NewCases,
        Metric::TotalDeaths,
        Metric::NewDeaths,
        Metric::TotalVaccinations,
        Metric::PeopleVaccinated,
    ];

    /// CSV column name (also the label used in report tables).
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::TotalCases => "total_cases",
            Metric::NewCases => "new_cases",
            Metric::TotalDeaths => "total_deaths",
            Metric::NewDeaths => "new_deaths",
            Metric::TotalVaccinations => "total_vaccinations",
            Metric::PeopleVaccinated => "people_vaccinated",
        }
    }
}

/// One line chart in the standard chart set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    TotalCases,
    TotalDeaths,
    NewCases,
    DeathRate,
    TotalVaccinations,
    VaccinationRate,
}

impl SeriesKind {
    /// Case/death charts shown in the exploratory section.
    pub const EXPLORATORY: [SeriesKind; 4] = [
        SeriesKind::TotalCases,
        SeriesKind::TotalDeaths,
        SeriesKind::NewCases,
        SeriesKind::DeathRate,
    ];

    /// Charts shown in the vaccination section.
    pub const VACCINATION: [SeriesKind; 2] =
        [SeriesKind::TotalVaccinations, SeriesKind::VaccinationRate];

    /// Every line chart, in presentation order.
    pub const ALL: [SeriesKind; 6] = [
        SeriesKind::TotalCases,
        SeriesKind::TotalDeaths,
        SeriesKind::NewCases,
        SeriesKind::DeathRate,
        SeriesKind::TotalVaccinations,
        SeriesKind::VaccinationRate,
    ];

    /// Chart title (also named in render error messages).
    pub fn title(self) -> &'static str {
        match self {
            SeriesKind::TotalCases => "Total COVID-19 Cases Over Time",
            SeriesKind::TotalDeaths => "Total COVID-19 Deaths Over Time",
            SeriesKind::NewCases => "Daily New COVID-19 Cases",
            SeriesKind::DeathRate => "COVID-19 Death Rate (Total Deaths / Total Cases)",
            SeriesKind::TotalVaccinations => "Total COVID-19 Vaccinations Over Time",
            SeriesKind::VaccinationRate => "Percentage of Population Vaccinated Over Time",
        }
    }

    /// Y-axis label.
    pub fn y_label(self) -> &'static str {
        match self {
            SeriesKind::TotalCases => "Total Cases",
            SeriesKind::TotalDeaths => "Total Deaths",
            SeriesKind::NewCases => "New Cases",
            SeriesKind::DeathRate => "Death Rate",
            SeriesKind::TotalVaccinations => "Total Vaccinations",
            SeriesKind::VaccinationRate => "% of Population Vaccinated",
        }
    }

    /// File stem for the SVG chart set.
    pub fn file_stem(self) -> &'static str {
        match self {
            SeriesKind::TotalCases => "total_cases_over_time",
            SeriesKind::TotalDeaths => "total_deaths_over_time",
            SeriesKind::NewCases => "daily_new_cases",
            SeriesKind::DeathRate => "death_rate_over_time",
            SeriesKind::TotalVaccinations => "total_vaccinations_over_time",
            SeriesKind::VaccinationRate => "vaccinated_percent_over_time",
        }
    }

    /// The plotted value for one cleaned row.
    ///
    /// An undefined ratio stays NaN and the renderers skip the point.
    pub fn value(self, row: &Observation) -> f64 {
        match self {
            SeriesKind::TotalCases => row.total_cases,
            SeriesKind::TotalDeaths => row.total_deaths,
            SeriesKind::NewCases => row.new_cases,
            SeriesKind::DeathRate => row.death_rate,
            SeriesKind::TotalVaccinations => row.total_vaccinations,
            SeriesKind::VaccinationRate => row.vaccination_rate,
        }
    }
}

/// A raw dataset row as loaded, before any cleaning.
///
/// Every value is optional: the loader keeps whatever the file has and leaves
/// all repair decisions to the cleaning stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObservation {
    pub entity: String,
    /// Raw date cell, trimmed; `None` when the cell is empty.
    ///
    /// Kept as text so cleaning can quote the offending value verbatim when a
    /// date does not parse.
    pub date: Option<String>,

    pub total_cases: Option<f64>,
    pub new_cases: Option<f64>,
    pub total_deaths: Option<f64>,
    pub new_deaths: Option<f64>,
    pub total_vaccinations: Option<f64>,
    pub people_vaccinated: Option<f64>,
    pub population: Option<f64>,
}

impl RawObservation {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::TotalCases => self.total_cases,
            Metric::NewCases => self.new_cases,
            Metric::TotalDeaths => self.total_deaths,
            Metric::NewDeaths => self.new_deaths,
            Metric::TotalVaccinations => self.total_vaccinations,
            Metric::PeopleVaccinated => self.people_vaccinated,
        }
    }

    pub fn metric_mut(&mut self, metric: Metric) -> &mut Option<f64> {
        match metric {
            Metric::TotalCases => &mut self.total_cases,
            Metric::NewCases => &mut self.new_cases,
            Metric::TotalDeaths => &mut self.total_deaths,
            Metric::NewDeaths => &mut self.new_deaths,
            Metric::TotalVaccinations => &mut self.total_vaccinations,
            Metric::PeopleVaccinated => &mut self.people_vaccinated,
        }
    }
}

/// A cleaned observation: dated, gap-filled, with derived ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub entity: String,
    pub date: NaiveDate,

    pub total_cases: f64,
    pub new_cases: f64,
    pub total_deaths: f64,
    pub new_deaths: f64,
    pub total_vaccinations: f64,
    pub people_vaccinated: f64,
    pub population: f64,

    /// `total_deaths / total_cases`; NaN when `total_cases` is 0.
    pub death_rate: f64,
    /// `people_vaccinated / population * 100`; NaN when `population` is 0.
    pub vaccination_rate: f64,
}

impl Observation {
    /// The cleaned value of one metric column.
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::TotalCases => self.total_cases,
            Metric::NewCases => self.new_cases,
            Metric::TotalDeaths => self.total_deaths,
            Metric::NewDeaths => self.new_deaths,
            Metric::TotalVaccinations => self.total_vaccinations,
            Metric::PeopleVaccinated => self.people_vaccinated,
        }
    }
}

/// Latest vaccination standing for one country.
#[derive(Debug, Clone)]
pub struct EntityRate {
    pub entity: String,
    /// Date of the latest cleaned observation for this country.
    pub date: NaiveDate,
    pub people_vaccinated: f64,
    /// Denominator actually used (dataset population or a CLI override).
    pub population: f64,
    /// Percent of population vaccinated; NaN when the denominator is 0.
    pub percent: f64,
    /// True when `population` came from a CLI override.
    pub overridden: bool,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub data_path: PathBuf,
    /// Countries to keep, in the order given on the command line.
    pub entities: Vec<String>,
    /// Replacement population denominators for the latest vaccination table
    /// (country name -> population).
    pub population_overrides: BTreeMap<String, f64>,

    /// Directory for the SVG chart set; `None` disables file output.
    pub out_dir: Option<PathBuf>,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export: Option<PathBuf>,
    pub export_summary: Option<PathBuf>,
}
