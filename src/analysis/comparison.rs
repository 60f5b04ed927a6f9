//! Year-over-year comparison.

use crate::models::{round1, Metric, Record, Sex, Unavailable, Year};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Summary of one selected year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub year: Year,
    pub total: u64,
    pub male: u64,
    pub female: u64,
    pub districts: usize,
    pub subdistricts: usize,
    /// Percentage change against the previous row, one decimal.
    pub change_pct: Metric<f64>,
}

#[derive(Default)]
struct YearAccumulator<'a> {
    male: u64,
    female: u64,
    districts: BTreeSet<&'a str>,
    subdistricts: BTreeSet<&'a str>,
}

/// Summarize each selected year, ascending by year.
///
/// Years are sorted before percentage changes are computed, so the input
/// order of `years` does not matter. Duplicates are ignored and years with
/// no records produce no row.
pub fn compare_years(records: &[Record], years: &[Year]) -> Vec<ComparisonRow> {
    let selected: BTreeSet<Year> = years.iter().copied().collect();
    let mut by_year: BTreeMap<Year, YearAccumulator<'_>> = BTreeMap::new();

    for record in records.iter().filter(|r| selected.contains(&r.year)) {
        let acc = by_year.entry(record.year).or_default();
        match record.sex {
            Sex::Male => acc.male += record.count,
            Sex::Female => acc.female += record.count,
        }
        acc.districts.insert(&record.district);
        acc.subdistricts.insert(&record.subdistrict);
    }

    for year in selected.iter().filter(|&y| !by_year.contains_key(y)) {
        warn!("Selected year {} has no records, skipping", year);
    }

    let mut rows = Vec::with_capacity(by_year.len());
    let mut previous: Option<u64> = None;

    for (year, acc) in by_year {
        let total = acc.male + acc.female;
        let change_pct = match previous {
            None => Metric::Unavailable(Unavailable::NoPriorYear),
            Some(0) => Metric::Unavailable(Unavailable::DivisionByZero),
            Some(prev) => Metric::Available(round1(
                (total as f64 - prev as f64) / prev as f64 * 100.0,
            )),
        };
        previous = Some(total);

        rows.push(ComparisonRow {
            year,
            total,
            male: acc.male,
            female: acc.female,
            districts: acc.districts.len(),
            subdistricts: acc.subdistricts.len(),
            change_pct,
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(year: i32, district: &str, sub: &str, sex: Sex, count: u64) -> Record {
        Record {
            year: Year(year),
            district: district.to_string(),
            subdistrict: sub.to_string(),
            sex,
            age: 30,
            count,
        }
    }

    fn dataset() -> Vec<Record> {
        vec![
            record(2022, "A", "X", Sex::Male, 60),
            record(2022, "A", "Y", Sex::Female, 40),
            record(2023, "A", "X", Sex::Male, 50),
            record(2023, "B", "Z", Sex::Female, 60),
            record(2024, "A", "X", Sex::Female, 99),
        ]
    }

    fn changes(rows: &[ComparisonRow]) -> Vec<Metric<f64>> {
        rows.iter().map(|r| r.change_pct).collect()
    }

    #[test]
    fn test_percentage_change_scenario() {
        let rows = compare_years(&dataset(), &[Year(2022), Year(2023), Year(2024)]);

        assert_eq!(
            rows.iter().map(|r| r.total).collect::<Vec<_>>(),
            vec![100, 110, 99]
        );
        assert_eq!(
            changes(&rows),
            vec![
                Metric::Unavailable(Unavailable::NoPriorYear),
                Metric::Available(10.0),
                Metric::Available(-10.0),
            ]
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let sorted = compare_years(&dataset(), &[Year(2022), Year(2023), Year(2024)]);
        let shuffled = compare_years(&dataset(), &[Year(2024), Year(2022), Year(2023), Year(2022)]);
        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn test_row_details() {
        let rows = compare_years(&dataset(), &[Year(2023), Year(2022)]);
        assert_eq!(
            rows[0],
            ComparisonRow {
                year: Year(2022),
                total: 100,
                male: 60,
                female: 40,
                districts: 1,
                subdistricts: 2,
                change_pct: Metric::Unavailable(Unavailable::NoPriorYear),
            }
        );
        assert_eq!(rows[1].districts, 2);
        assert_eq!(rows[1].subdistricts, 2);
    }

    #[test]
    fn test_gap_in_selection_compares_with_previous_selected() {
        let rows = compare_years(&dataset(), &[Year(2022), Year(2024)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].change_pct, Metric::Available(-1.0));
    }

    #[test]
    fn test_missing_and_empty_selection() {
        assert!(compare_years(&dataset(), &[]).is_empty());
        let rows = compare_years(&dataset(), &[Year(1990), Year(2024)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].change_pct, Metric::Unavailable(Unavailable::NoPriorYear));
    }

    #[test]
    fn test_zero_previous_total() {
        let records = vec![
            record(2022, "A", "X", Sex::Male, 0),
            record(2023, "A", "X", Sex::Male, 5),
        ];
        let rows = compare_years(&records, &[Year(2022), Year(2023)]);
        assert_eq!(rows[1].change_pct, Metric::Unavailable(Unavailable::DivisionByZero));
    }
}
