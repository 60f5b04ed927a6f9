//! Record filtering and aggregation.
//!
//! This module provides grouping of canonical records along arbitrary
//! dimension combinations, plus the shaped tables built on top of it.

use crate::error::{CensusError, Result};
use crate::ingest::normalizer::title_case;
use crate::models::{AggregateRow, Dimension, DimensionValue, Record, Sex, Year, AGE_CEILING};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Inclusive age range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl AgeRange {
    pub fn new(min: u8, max: u8) -> Result<Self> {
        if min > max {
            return Err(CensusError::InvalidSelection(format!(
                "age range {}-{} is empty",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, age: u8) -> bool {
        (self.min..=self.max).contains(&age)
    }

    /// Whether this range covers every clamped age.
    pub fn is_full(&self) -> bool {
        self.min == 0 && self.max >= AGE_CEILING
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: AGE_CEILING,
        }
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max >= AGE_CEILING {
            write!(f, "{}-{}+", self.min, AGE_CEILING)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Conjunction of record predicates. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub year: Option<Year>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub sex: Option<Sex>,
    pub age_range: Option<AgeRange>,
}

impl Filter {
    /// A filter matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: Year) -> Self {
        self.year = Some(year);
        self
    }

    /// Restrict to a district. The name is cleaned like source data.
    pub fn with_district(mut self, district: &str) -> Self {
        self.district = Some(title_case(district.trim()));
        self
    }

    /// Restrict to a subdistrict. The name is cleaned like source data.
    pub fn with_subdistrict(mut self, subdistrict: &str) -> Self {
        self.subdistrict = Some(title_case(subdistrict.trim()));
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn with_age_range(mut self, range: AgeRange) -> Self {
        self.age_range = Some(range);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.year.map_or(true, |y| record.year == y)
            && self
                .district
                .as_deref()
                .map_or(true, |d| record.district == d)
            && self
                .subdistrict
                .as_deref()
                .map_or(true, |s| record.subdistrict == s)
            && self.sex.map_or(true, |s| record.sex == s)
            && self.age_range.map_or(true, |r| r.contains(record.age))
    }
}

/// Records matching `filter`.
pub fn filter(records: &[Record], filter: &Filter) -> Vec<Record> {
    records.iter().filter(|r| filter.matches(r)).cloned().collect()
}

/// Sum of counts.
pub fn total(records: &[Record]) -> u64 {
    records.iter().map(|r| r.count).sum()
}

fn dedup_dimensions(dimensions: &[Dimension]) -> Vec<Dimension> {
    let mut seen = Vec::with_capacity(dimensions.len());
    for dimension in dimensions {
        if !seen.contains(dimension) {
            seen.push(*dimension);
        }
    }
    seen
}

/// Group filtered records by `dimensions` and sum their counts.
///
/// Rows carry exactly the requested keys in the requested order (repeated
/// dimensions are ignored) and are sorted ascending by key. Grouping by no
/// dimension yields a single grand-total row when anything matches.
pub fn aggregate(records: &[Record], dimensions: &[Dimension], filter: &Filter) -> Vec<AggregateRow> {
    let dimensions = dedup_dimensions(dimensions);
    let mut groups: BTreeMap<Vec<DimensionValue>, u64> = BTreeMap::new();

    for record in records.iter().filter(|r| filter.matches(r)) {
        let key = dimensions.iter().map(|d| d.value_of(record)).collect();
        *groups.entry(key).or_default() += record.count;
    }

    groups
        .into_iter()
        .map(|(key, count)| AggregateRow { key, count })
        .collect()
}

/// Re-aggregate rows onto a subset of the dimensions they carry.
///
/// Gives the same totals as grouping the records by `dimensions` directly.
pub fn rollup(rows: &[AggregateRow], dimensions: &[Dimension]) -> Result<Vec<AggregateRow>> {
    let dimensions = dedup_dimensions(dimensions);
    let mut groups: BTreeMap<Vec<DimensionValue>, u64> = BTreeMap::new();

    for row in rows {
        let key = dimensions
            .iter()
            .map(|d| row.get(*d).cloned().ok_or(CensusError::MissingDimension(*d)))
            .collect::<Result<Vec<_>>>()?;
        *groups.entry(key).or_default() += row.count;
    }

    Ok(groups
        .into_iter()
        .map(|(key, count)| AggregateRow { key, count })
        .collect())
}

/// Keep the `n` largest rows: count descending, ties by key ascending.
pub fn top_n(rows: &[AggregateRow], n: usize) -> Vec<AggregateRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    sorted.truncate(n);
    sorted
}

/// Male/female split for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SexBreakdown {
    pub key: DimensionValue,
    pub male: u64,
    pub female: u64,
    pub total: u64,
}

/// Split each value of `dimension` by sex.
///
/// Sorted by total descending, ties by key ascending.
pub fn sex_breakdown(records: &[Record], dimension: Dimension) -> Vec<SexBreakdown> {
    let rows = aggregate(records, &[dimension, Dimension::Sex], &Filter::all());
    let mut by_key: BTreeMap<DimensionValue, (u64, u64)> = BTreeMap::new();

    for row in rows {
        let Some(key) = row.get(dimension).cloned() else {
            continue;
        };
        let entry = by_key.entry(key).or_default();
        if let Some(DimensionValue::Sex(sex)) = row.get(Dimension::Sex) {
            match sex {
                Sex::Male => entry.0 += row.count,
                Sex::Female => entry.1 += row.count,
            }
        }
    }

    let mut breakdown: Vec<SexBreakdown> = by_key
        .into_iter()
        .map(|(key, (male, female))| SexBreakdown {
            key,
            male,
            female,
            total: male + female,
        })
        .collect();

    breakdown.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    breakdown
}

/// The `n` most populous subdistricts with their sex split.
pub fn top_subdistricts(records: &[Record], n: usize) -> Vec<SexBreakdown> {
    let mut breakdown = sex_breakdown(records, Dimension::Subdistrict);
    breakdown.truncate(n);
    breakdown
}

/// Population of one year, split by sex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub year: Year,
    pub male: u64,
    pub female: u64,
    pub total: u64,
}

/// Per-year totals, ascending by year.
pub fn yearly_trend(records: &[Record]) -> Vec<TrendPoint> {
    let mut points: BTreeMap<Year, (u64, u64)> = BTreeMap::new();

    for row in aggregate(records, &[Dimension::Year, Dimension::Sex], &Filter::all()) {
        if let (Some(DimensionValue::Year(year)), Some(DimensionValue::Sex(sex))) =
            (row.get(Dimension::Year), row.get(Dimension::Sex))
        {
            let entry = points.entry(*year).or_default();
            match sex {
                Sex::Male => entry.0 += row.count,
                Sex::Female => entry.1 += row.count,
            }
        }
    }

    points
        .into_iter()
        .map(|(year, (male, female))| TrendPoint {
            year,
            male,
            female,
            total: male + female,
        })
        .collect()
}
