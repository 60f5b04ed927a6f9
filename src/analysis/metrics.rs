//! Demographic indicators for a filtered selection.
//!
//! Every indicator whose denominator can vanish is a [`Metric`], so callers
//! can tell "computed as zero" apart from "not computable".

use crate::analysis::aggregator::{aggregate, top_n, total, Filter};
use crate::error::{CensusError, Result};
use crate::models::{
    ratio, Dimension, DimensionValue, Metric, Record, Sex, Unavailable, Year, PRODUCTIVE_MAX_AGE,
    PRODUCTIVE_MIN_AGE,
};
use serde::Serialize;
use tracing::debug;

/// Number of districts listed in the ranking.
pub const TOP_DISTRICTS: usize = 3;

/// A district and its summed population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictTotal {
    pub district: String,
    pub population: u64,
}

/// All indicators for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsResult {
    pub selected_year: Year,
    pub total_population: u64,
    pub male: u64,
    pub female: u64,
    /// Ages 0-14.
    pub child_population: u64,
    /// Ages 15-64.
    pub productive_population: u64,
    /// Ages 65 and above.
    pub elderly_population: u64,
    /// Full-dataset total of the year before `selected_year`.
    pub prior_year_total: Metric<u64>,
    /// `total_population` minus the prior-year total.
    pub growth: Metric<i64>,
    /// Growth as a percentage of the prior-year total.
    pub growth_pct: Metric<f64>,
    /// Productive population as a fraction of the total.
    pub productive_share: Metric<f64>,
    /// Dependents per 100 productive-age people.
    pub dependency_ratio: Metric<f64>,
    /// Males per 100 females.
    pub sex_ratio: Metric<f64>,
    pub largest_district: Metric<DistrictTotal>,
    pub top_districts: Vec<DistrictTotal>,
}

fn sum_where(records: &[Record], pred: impl Fn(&Record) -> bool) -> u64 {
    records.iter().filter(|&r| pred(r)).map(|r| r.count).sum()
}

/// `a - b`, saturating at the bounds of `i64`.
fn signed_difference(a: u64, b: u64) -> i64 {
    let diff = i128::from(a) - i128::from(b);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}

/// The `n` most populous districts, ties broken by name.
pub fn top_districts(records: &[Record], n: usize) -> Vec<DistrictTotal> {
    let rows = aggregate(records, &[Dimension::District], &Filter::all());
    top_n(&rows, n)
        .into_iter()
        .filter_map(|row| match row.get(Dimension::District) {
            Some(DimensionValue::District(name)) => Some(DistrictTotal {
                district: name.clone(),
                population: row.count,
            }),
            _ => None,
        })
        .collect()
}

/// The most populous district of the selection.
///
/// Fails with [`CensusError::NoData`] when the selection is empty.
pub fn largest_district(records: &[Record]) -> Result<DistrictTotal> {
    top_districts(records, 1)
        .into_iter()
        .next()
        .ok_or(CensusError::NoData)
}

/// Compute all indicators.
///
/// `filtered` is the current selection of `selected_year`; `full` is the
/// unfiltered dataset, used only for the prior-year total.
pub fn metrics(filtered: &[Record], full: &[Record], selected_year: Year) -> MetricsResult {
    let total_population = total(filtered);
    let male = sum_where(filtered, |r| r.sex == Sex::Male);
    let female = sum_where(filtered, |r| r.sex == Sex::Female);
    let child_population = sum_where(filtered, |r| r.age < PRODUCTIVE_MIN_AGE);
    let productive_population = sum_where(filtered, Record::is_productive);
    let elderly_population = sum_where(filtered, |r| r.age > PRODUCTIVE_MAX_AGE);

    let prior_year = selected_year.previous();
    let prior_year_total = if full.iter().any(|r| r.year == prior_year) {
        Metric::Available(sum_where(full, |r| r.year == prior_year))
    } else {
        debug!("No data for {}, growth unavailable", prior_year);
        Metric::Unavailable(Unavailable::NoPriorYear)
    };

    let growth = prior_year_total.map(|prior| signed_difference(total_population, prior));
    let growth_pct = match (growth, prior_year_total) {
        (Metric::Available(growth), Metric::Available(prior)) if prior > 0 => {
            Metric::Available(growth as f64 / prior as f64 * 100.0)
        }
        (Metric::Available(_), _) => Metric::Unavailable(Unavailable::DivisionByZero),
        (Metric::Unavailable(reason), _) => Metric::Unavailable(reason),
    };

    let largest_district = match largest_district(filtered) {
        Ok(district) => Metric::Available(district),
        Err(_) => Metric::Unavailable(Unavailable::NoData),
    };

    MetricsResult {
        selected_year,
        total_population,
        male,
        female,
        child_population,
        productive_population,
        elderly_population,
        prior_year_total,
        growth,
        growth_pct,
        productive_share: ratio(productive_population, total_population),
        dependency_ratio: ratio(child_population + elderly_population, productive_population)
            .map(|r| r * 100.0),
        sex_ratio: ratio(male, female).map(|r| r * 100.0),
        largest_district,
        top_districts: top_districts(filtered, TOP_DISTRICTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::filter;

    fn record(year: i32, district: &str, sex: Sex, age: u8, count: u64) -> Record {
        Record {
            year: Year(year),
            district: district.to_string(),
            subdistrict: "X".to_string(),
            sex,
            age,
            count,
        }
    }

    fn dataset() -> Vec<Record> {
        vec![
            record(2022, "Ulu", Sex::Male, 30, 50),
            record(2022, "Ulu", Sex::Female, 30, 50),
            record(2023, "Ulu", Sex::Male, 10, 10),
            record(2023, "Ulu", Sex::Female, 30, 60),
            record(2023, "Ilir", Sex::Male, 40, 20),
            record(2023, "Ilir", Sex::Female, 70, 20),
        ]
    }

    fn approx(metric: &Metric<f64>, expected: f64) -> bool {
        metric.value().map_or(false, |v| (v - expected).abs() < 1e-9)
    }

    #[test]
    fn test_full_metrics() {
        let full = dataset();
        let selected = filter(&full, &Filter::all().with_year(Year(2023)));
        let m = metrics(&selected, &full, Year(2023));

        assert_eq!(m.total_population, 110);
        assert_eq!(m.male, 30);
        assert_eq!(m.female, 80);
        assert_eq!(m.productive_population, 80);
        assert_eq!(m.child_population, 10);
        assert_eq!(m.elderly_population, 20);
        assert_eq!(m.prior_year_total, Metric::Available(100));
        assert_eq!(m.growth, Metric::Available(10));
        assert!(approx(&m.growth_pct, 10.0));
        assert!(approx(&m.productive_share, 80.0 / 110.0));
        assert!(approx(&m.dependency_ratio, 37.5));
        assert!(approx(&m.sex_ratio, 37.5));
        assert_eq!(
            m.largest_district,
            Metric::Available(DistrictTotal {
                district: "Ulu".to_string(),
                population: 70,
            })
        );
        assert_eq!(m.top_districts.len(), 2);
    }

    #[test]
    fn test_growth_uses_full_prior_year_total() {
        let full = dataset();
        let selected = filter(
            &full,
            &Filter::all().with_year(Year(2023)).with_district("Ilir"),
        );
        let m = metrics(&selected, &full, Year(2023));

        assert_eq!(m.prior_year_total, Metric::Available(100));
        assert_eq!(m.growth, Metric::Available(-60));
    }

    #[test]
    fn test_growth_unavailable_without_prior_year() {
        let full = dataset();
        let selected = filter(&full, &Filter::all().with_year(Year(2022)));
        let m = metrics(&selected, &full, Year(2022));

        assert_eq!(m.growth, Metric::Unavailable(Unavailable::NoPriorYear));
        assert_eq!(m.growth_pct, Metric::Unavailable(Unavailable::NoPriorYear));
        assert_ne!(m.growth, Metric::Available(0));
    }

    #[test]
    fn test_zero_prior_total_keeps_absolute_growth() {
        let mut full = dataset();
        full.push(record(2021, "Ulu", Sex::Male, 30, 0));
        let selected = filter(&full, &Filter::all().with_year(Year(2022)));
        let m = metrics(&selected, &full, Year(2022));

        assert_eq!(m.growth, Metric::Available(100));
        assert_eq!(m.growth_pct, Metric::Unavailable(Unavailable::DivisionByZero));
    }

    #[test]
    fn test_dependency_ratio_without_productive_population() {
        let full = vec![
            record(2023, "Ulu", Sex::Male, 5, 10),
            record(2023, "Ulu", Sex::Female, 75, 4),
        ];
        let m = metrics(&full, &full, Year(2023));

        assert_eq!(m.dependency_ratio, Metric::Unavailable(Unavailable::DivisionByZero));
        assert_eq!(m.productive_share, Metric::Available(0.0));
    }

    #[test]
    fn test_empty_selection() {
        let full = dataset();
        let m = metrics(&[], &full, Year(2023));

        assert_eq!(m.total_population, 0);
        assert_eq!(m.productive_share, Metric::Unavailable(Unavailable::DivisionByZero));
        assert_eq!(m.sex_ratio, Metric::Unavailable(Unavailable::DivisionByZero));
        assert_eq!(m.largest_district, Metric::Unavailable(Unavailable::NoData));
        assert!(m.top_districts.is_empty());
        assert!(matches!(largest_district(&[]), Err(CensusError::NoData)));
    }

    #[test]
    fn test_growth_does_not_wrap_on_large_totals() {
        let full = vec![
            record(2022, "Ulu", Sex::Male, 30, 1),
            record(2023, "Ulu", Sex::Male, 30, u64::MAX),
        ];
        let selected = filter(&full, &Filter::all().with_year(Year(2023)));
        let m = metrics(&selected, &full, Year(2023));

        assert_eq!(m.growth, Metric::Available(i64::MAX));
        assert_eq!(signed_difference(3, 5), -2);
        assert_eq!(signed_difference(0, u64::MAX), i64::MIN);
        assert_eq!(signed_difference(u64::MAX, u64::MAX - 7), 7);
    }

    #[test]
    fn test_largest_district_tie_break() {
        let records = vec![
            record(2023, "Zeta", Sex::Male, 30, 5),
            record(2023, "Alpha", Sex::Male, 30, 5),
        ];
        assert_eq!(largest_district(&records).unwrap().district, "Alpha");
    }
}
