//! The cleaning stage: filter, date-normalize, gap-fill, derive.
//!
//! Steps, in order:
//!
//! 1. keep only rows for the selected countries (source order preserved)
//! 2. drop rows whose date cell is empty
//! 3. parse the remaining dates; any malformed value aborts the run
//! 4. per country, linearly interpolate interior gaps in each metric along
//!    the date axis
//! 5. zero-fill whatever is still missing (series edges, all-missing series)
//! 6. derive `death_rate` and `vaccination_rate`, keeping NaN where the
//!    denominator is zero
//!
//! Cleaning is pure: it never touches the filesystem, and the output order is
//! the input order of the kept rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::domain::{EntityRate, Metric, Observation, RawObservation};
use crate::error::AppError;

pub mod interpolate;

/// Date formats accepted across public COVID-19 exports, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a date cell; first matching format wins.
///
/// Day-first beats month-first for ambiguous slash dates because only the
/// day-first form is in the accepted set.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// A row mid-clean: date normalized, metrics still optional.
struct WorkRow {
    date: NaiveDate,
    raw: RawObservation,
}

/// Run the full cleaning stage over loaded rows.
///
/// Undated rows are silently dropped; a non-empty date that parses under none
/// of the accepted formats aborts with [`AppError::InvalidDate`] rather than
/// guessing.
pub fn clean(rows: &[RawObservation], entities: &[String]) -> Result<Vec<Observation>, AppError> {
    let wanted: HashSet<&str> = entities.iter().map(String::as_str).collect();

    let mut work: Vec<WorkRow> = Vec::new();
    for row in rows {
        if !wanted.contains(row.entity.as_str()) {
            continue;
        }
        let Some(raw_date) = row.date.as_deref() else {
            continue; // undated rows are unusable for a time series
        };
        let date = parse_date(raw_date).ok_or_else(|| AppError::InvalidDate {
            entity: row.entity.clone(),
            value: raw_date.to_string(),
        })?;
        work.push(WorkRow {
            date,
            raw: row.clone(),
        });
    }

    interpolate_groups(&mut work);

    Ok(work.into_iter().map(finalize).collect())
}

/// Per-country, per-metric interior gap-fill along the date axis.
///
/// Rows are viewed in date order for filling but keep their source positions,
/// so the output order of [`clean`] stays the input order.
fn interpolate_groups(work: &mut [WorkRow]) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, row) in work.iter().enumerate() {
        groups.entry(row.raw.entity.clone()).or_default().push(idx);
    }

    for indices in groups.values() {
        let mut ordered = indices.clone();
        // Stable sort: rows sharing a date keep their source order.
        ordered.sort_by_key(|&idx| work[idx].date);

        for metric in Metric::ALL {
            let series: Vec<(NaiveDate, Option<f64>)> = ordered
                .iter()
                .map(|&idx| (work[idx].date, work[idx].raw.metric(metric)))
                .collect();
            let filled = interpolate::fill_linear(&series);
            for (pos, &idx) in ordered.iter().enumerate() {
                *work[idx].raw.metric_mut(metric) = filled[pos];
            }
        }
    }
}

/// Zero-fill residual gaps and derive the ratio columns.
fn finalize(row: WorkRow) -> Observation {
    let raw = row.raw;
    let total_cases = raw.total_cases.unwrap_or(0.0);
    let new_cases = raw.new_cases.unwrap_or(0.0);
    let total_deaths = raw.total_deaths.unwrap_or(0.0);
    let new_deaths = raw.new_deaths.unwrap_or(0.0);
    let total_vaccinations = raw.total_vaccinations.unwrap_or(0.0);
    let people_vaccinated = raw.people_vaccinated.unwrap_or(0.0);
    let population = raw.population.unwrap_or(0.0);

    Observation {
        entity: raw.entity,
        date: row.date,
        total_cases,
        new_cases,
        total_deaths,
        new_deaths,
        total_vaccinations,
        people_vaccinated,
        population,
        death_rate: ratio(total_deaths, total_cases),
        vaccination_rate: ratio(people_vaccinated, population) * 100.0,
    }
}

/// Elementwise ratio that keeps "undefined" visible.
///
/// Returns NaN when the denominator is zero or not finite. Renderers and
/// formatters treat NaN as "no value".
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Latest cleaned observation per country (maximum date wins).
///
/// Ties on the maximum date resolve to the later source row. The map is keyed
/// by country name, so iteration is alphabetical regardless of CLI order.
pub fn latest(cleaned: &[Observation]) -> BTreeMap<String, Observation> {
    let mut out: BTreeMap<String, Observation> = BTreeMap::new();
    for row in cleaned {
        match out.get(row.entity.as_str()) {
            Some(current) if row.date < current.date => {}
            _ => {
                out.insert(row.entity.clone(), row.clone());
            }
        }
    }
    out
}

/// Latest vaccination standing per country, applying population overrides.
///
/// The dataset's population is the default denominator; an override replaces
/// it for that country only. Output follows the map's alphabetical order.
pub fn latest_vaccination_rates(
    latest: &BTreeMap<String, Observation>,
    overrides: &BTreeMap<String, f64>,
) -> Vec<EntityRate> {
    latest
        .values()
        .map(|row| {
            let overridden = overrides.contains_key(row.entity.as_str());
            let population = overrides
                .get(row.entity.as_str())
                .copied()
                .unwrap_or(row.population);
            EntityRate {
                entity: row.entity.clone(),
                date: row.date,
                people_vaccinated: row.people_vaccinated,
                population,
                percent: ratio(row.people_vaccinated, population) * 100.0,
                overridden,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(entity: &str, date: Option<&str>) -> RawObservation {
        RawObservation {
            entity: entity.to_string(),
            date: date.map(str::to_string),
            ..RawObservation::default()
        }
    }

    fn selection(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn nan_eq(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-9
    }

    #[test]
    fn parse_date_accepts_all_four_formats() {
        let expected = date(2021, 3, 17);
        for s in ["2021-03-17", "17/03/2021", "17-03-2021", "2021/03/17"] {
            assert_eq!(parse_date(s), Some(expected), "failed for {s}");
        }
    }

    #[test]
    fn parse_date_is_day_first_for_slash_dates() {
        assert_eq!(parse_date("03/04/2021"), Some(date(2021, 4, 3)));
    }

    #[test]
    fn parse_date_rejects_garbage_and_impossible_dates() {
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2021-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn filter_keeps_selection_in_source_order() {
        let rows = vec![
            row("Kenya", Some("2021-01-01")),
            row("France", Some("2021-01-01")),
            row("India", Some("2021-01-01")),
            row("Kenya", Some("2021-01-02")),
        ];
        let cleaned = clean(&rows, &selection(&["Kenya", "India"])).unwrap();
        let entities: Vec<&str> = cleaned.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["Kenya", "India", "Kenya"]);
    }

    #[test]
    fn undated_rows_are_dropped() {
        let rows = vec![
            row("Kenya", Some("2021-01-01")),
            row("Kenya", None),
            row("Kenya", Some("2021-01-03")),
        ];
        let cleaned = clean(&rows, &selection(&["Kenya"])).unwrap();
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn malformed_date_aborts_with_context() {
        let rows = vec![
            row("Kenya", Some("2021-01-01")),
            row("Kenya", Some("sometime in March")),
        ];
        let err = clean(&rows, &selection(&["Kenya"])).unwrap_err();
        match err {
            AppError::InvalidDate { entity, value } => {
                assert_eq!(entity, "Kenya");
                assert_eq!(value, "sometime in March");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn malformed_date_outside_selection_is_ignored() {
        let rows = vec![
            row("Kenya", Some("2021-01-01")),
            row("France", Some("not-a-date")),
        ];
        assert!(clean(&rows, &selection(&["Kenya"])).is_ok());
    }

    #[test]
    fn interior_gap_fills_between_neighbors() {
        let mut a = row("Kenya", Some("2021-01-01"));
        a.total_cases = Some(10.0);
        let b = row("Kenya", Some("2021-01-02"));
        let mut c = row("Kenya", Some("2021-01-03"));
        c.total_cases = Some(30.0);

        let cleaned = clean(&[a, b, c], &selection(&["Kenya"])).unwrap();
        assert!((cleaned[1].total_cases - 20.0).abs() < 1e-9);
    }

    #[test]
    fn interpolation_is_per_country() {
        // India's known values must not bleed into Kenya's gap.
        let mut k1 = row("Kenya", Some("2021-01-01"));
        k1.new_cases = Some(2.0);
        let k2 = row("Kenya", Some("2021-01-02"));
        let mut k3 = row("Kenya", Some("2021-01-03"));
        k3.new_cases = Some(4.0);
        let mut i1 = row("India", Some("2021-01-02"));
        i1.new_cases = Some(1000.0);

        let cleaned = clean(&[k1, i1, k2, k3], &selection(&["Kenya", "India"])).unwrap();
        let kenya_mid = cleaned
            .iter()
            .find(|r| r.entity == "Kenya" && r.date == date(2021, 1, 2))
            .unwrap();
        assert!((kenya_mid.new_cases - 3.0).abs() < 1e-9);
    }

    #[test]
    fn interpolation_orders_by_date_not_source_position() {
        // Rows arrive out of date order; the gap still fills on the date axis.
        let mut late = row("Kenya", Some("2021-01-05"));
        late.total_deaths = Some(50.0);
        let mid = row("Kenya", Some("2021-01-03"));
        let mut early = row("Kenya", Some("2021-01-01"));
        early.total_deaths = Some(10.0);

        let cleaned = clean(&[late, mid, early], &selection(&["Kenya"])).unwrap();
        let filled = cleaned
            .iter()
            .find(|r| r.date == date(2021, 1, 3))
            .unwrap();
        assert!((filled.total_deaths - 30.0).abs() < 1e-9);
        // Source order is preserved in the output.
        assert_eq!(cleaned[0].date, date(2021, 1, 5));
        assert_eq!(cleaned[2].date, date(2021, 1, 1));
    }

    #[test]
    fn leading_and_trailing_gaps_zero_fill() {
        let a = row("Kenya", Some("2021-01-01"));
        let mut b = row("Kenya", Some("2021-01-02"));
        b.total_vaccinations = Some(5.0);
        let c = row("Kenya", Some("2021-01-03"));

        let cleaned = clean(&[a, b, c], &selection(&["Kenya"])).unwrap();
        assert_eq!(cleaned[0].total_vaccinations, 0.0);
        assert_eq!(cleaned[1].total_vaccinations, 5.0);
        assert_eq!(cleaned[2].total_vaccinations, 0.0);
    }

    #[test]
    fn all_missing_metrics_zero_fill_and_death_rate_is_undefined() {
        let mut a = row("Kenya", Some("2021-01-01"));
        a.population = Some(50_000_000.0);
        let mut b = row("Kenya", Some("2021-01-02"));
        b.population = Some(50_000_000.0);

        let cleaned = clean(&[a, b], &selection(&["Kenya"])).unwrap();
        for obs in &cleaned {
            for metric in Metric::ALL {
                assert_eq!(obs.metric(metric), 0.0);
            }
            assert!(obs.death_rate.is_nan(), "0/0 must stay undefined");
            assert_eq!(obs.vaccination_rate, 0.0, "0 vaccinated of a real population");
        }
    }

    #[test]
    fn zero_population_gives_undefined_vaccination_rate() {
        let mut a = row("Narnia", Some("2021-01-01"));
        a.people_vaccinated = Some(100.0);

        let cleaned = clean(&[a], &selection(&["Narnia"])).unwrap();
        assert!(cleaned[0].vaccination_rate.is_nan());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let mut a = row("Kenya", Some("2021-01-01"));
        a.total_cases = Some(10.0);
        a.population = Some(1000.0);
        let b = row("Kenya", Some("2021-01-02"));
        let mut c = row("Kenya", Some("2021-01-04"));
        c.total_cases = Some(40.0);
        c.new_deaths = Some(2.0);

        let selection = selection(&["Kenya"]);
        let once = clean(&[a, b, c], &selection).unwrap();
        let raw_again: Vec<RawObservation> = once.iter().map(back_to_raw).collect();
        let twice = clean(&raw_again, &selection).unwrap();

        assert_eq!(once.len(), twice.len());
        for (x, y) in once.iter().zip(&twice) {
            assert_eq!(x.entity, y.entity);
            assert_eq!(x.date, y.date);
            for metric in Metric::ALL {
                assert!(nan_eq(x.metric(metric), y.metric(metric)));
            }
            assert!(nan_eq(x.population, y.population));
            assert!(nan_eq(x.death_rate, y.death_rate));
            assert!(nan_eq(x.vaccination_rate, y.vaccination_rate));
        }
    }

    fn back_to_raw(obs: &Observation) -> RawObservation {
        RawObservation {
            entity: obs.entity.clone(),
            date: Some(obs.date.to_string()),
            total_cases: Some(obs.total_cases),
            new_cases: Some(obs.new_cases),
            total_deaths: Some(obs.total_deaths),
            new_deaths: Some(obs.new_deaths),
            total_vaccinations: Some(obs.total_vaccinations),
            people_vaccinated: Some(obs.people_vaccinated),
            population: Some(obs.population),
        }
    }

    #[test]
    fn ratio_flags_zero_and_missing_denominators() {
        assert!(ratio(1.0, 0.0).is_nan());
        assert!(ratio(0.0, 0.0).is_nan());
        assert!(ratio(1.0, f64::NAN).is_nan());
        assert!((ratio(1.0, 4.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn latest_picks_max_date_per_country() {
        let rows = vec![
            row("Kenya", Some("2021-01-05")),
            row("Kenya", Some("2021-03-01")),
            row("Kenya", Some("2021-02-10")),
            row("India", Some("2021-02-28")),
        ];
        let cleaned = clean(&rows, &selection(&["Kenya", "India"])).unwrap();
        let latest = latest(&cleaned);
        assert_eq!(latest["Kenya"].date, date(2021, 3, 1));
        assert_eq!(latest["India"].date, date(2021, 2, 28));
    }

    #[test]
    fn latest_iterates_alphabetically() {
        let rows = vec![
            row("United States", Some("2021-01-01")),
            row("Kenya", Some("2021-01-01")),
            row("India", Some("2021-01-01")),
        ];
        let cleaned = clean(&rows, &selection(&["United States", "Kenya", "India"])).unwrap();
        let names: Vec<String> = latest(&cleaned).into_keys().collect();
        assert_eq!(names, vec!["India", "Kenya", "United States"]);
    }

    #[test]
    fn latest_tie_takes_later_source_row() {
        let mut first = row("Kenya", Some("2021-01-01"));
        first.total_cases = Some(1.0);
        let mut second = row("Kenya", Some("2021-01-01"));
        second.total_cases = Some(2.0);

        let cleaned = clean(&[first, second], &selection(&["Kenya"])).unwrap();
        let latest = latest(&cleaned);
        assert_eq!(latest["Kenya"].total_cases, 2.0);
    }

    #[test]
    fn overrides_replace_dataset_population() {
        let mut a = row("Kenya", Some("2021-06-01"));
        a.people_vaccinated = Some(10_000_000.0);
        a.population = Some(100_000_000.0);
        let mut b = row("India", Some("2021-06-01"));
        b.people_vaccinated = Some(700_000_000.0);
        b.population = Some(1_400_000_000.0);

        let cleaned = clean(&[a, b], &selection(&["Kenya", "India"])).unwrap();
        let latest = latest(&cleaned);

        let mut overrides = BTreeMap::new();
        overrides.insert("Kenya".to_string(), 50_000_000.0);

        let rates = latest_vaccination_rates(&latest, &overrides);
        assert_eq!(rates.len(), 2);
        // Alphabetical: India first.
        assert_eq!(rates[0].entity, "India");
        assert!(!rates[0].overridden);
        assert!((rates[0].percent - 50.0).abs() < 1e-9);
        assert_eq!(rates[1].entity, "Kenya");
        assert!(rates[1].overridden);
        assert_eq!(rates[1].population, 50_000_000.0);
        assert!((rates[1].percent - 20.0).abs() < 1e-9);
    }
}
