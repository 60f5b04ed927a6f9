//! Record normalization.
//!
//! Turns loosely-typed raw rows into canonical [`Record`]s: column names are
//! matched case-insensitively, text is cleaned, ages are clamped to
//! [`AGE_CEILING`], and rows that collide after clamping are summed.

use crate::error::{CensusError, Result};
use crate::models::{Record, Sex, Year, AGE_CEILING, MAX_COUNT};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Source column holding the year.
pub const COL_YEAR: &str = "tahun";
/// Source column holding the district (kecamatan).
pub const COL_DISTRICT: &str = "kecamatan";
/// Source column holding the subdistrict (kelurahan).
pub const COL_SUBDISTRICT: &str = "kelurahan";
/// Source column holding the sex code.
pub const COL_SEX: &str = "kelamin";
/// Source column holding the age.
pub const COL_AGE: &str = "umur";
/// Source column holding the population count.
pub const COL_COUNT: &str = "jumlah";

/// A single cell of raw input.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Null,
}

impl RawValue {
    fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                Some(format!("{}", *n as i64))
            }
            RawValue::Number(n) if n.is_finite() => Some(n.to_string()),
            _ => None,
        }
    }

    /// Non-negative whole number. Integer text is parsed exactly; other
    /// numbers must be finite, integral, and within `u64`.
    fn as_whole(&self) -> Option<u64> {
        match self {
            RawValue::Text(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<u64>() {
                    Ok(n) => Some(n),
                    Err(_) => whole_from_float(trimmed.parse::<f64>().ok()?),
                }
            }
            RawValue::Number(n) => whole_from_float(*n),
            RawValue::Null => None,
        }
    }
}

fn whole_from_float(value: f64) -> Option<u64> {
    (value.fract() == 0.0 && value >= 0.0 && value < u64::MAX as f64).then_some(value as u64)
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n as f64)
    }
}

/// One raw input row: column name to value.
///
/// Column names are stored trimmed and lower-cased, so lookups are
/// case and whitespace insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: HashMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: &str, value: impl Into<RawValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<RawValue>) {
        self.fields.insert(normalize_column(column), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.fields.get(&normalize_column(column))
    }

    fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(RawValue::as_text)
    }

    fn whole(&self, column: &str) -> Option<u64> {
        self.get(column).and_then(RawValue::as_whole)
    }
}

impl<K: AsRef<str>, V: Into<RawValue>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (column, value) in iter {
            row.insert(column.as_ref(), value);
        }
        row
    }
}

fn normalize_column(column: &str) -> String {
    column.trim().to_lowercase()
}

/// Title-case a name: the first letter of every alphabetic run is
/// upper-cased and the rest lower-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Clamp an age to the ceiling.
pub fn clamp_age(age: u64) -> u8 {
    age.min(AGE_CEILING as u64) as u8
}

fn name(row: &RawRow, column: &str) -> Option<String> {
    let cleaned = title_case(row.text(column)?.trim());
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Convert one raw row into a record, or `None` if any field is missing
/// or unparseable, or the count exceeds [`MAX_COUNT`]. Ages are clamped here.
pub fn parse_row(row: &RawRow) -> Option<Record> {
    let year: Year = row.text(COL_YEAR)?.parse().ok()?;
    let district = name(row, COL_DISTRICT)?;
    let subdistrict = name(row, COL_SUBDISTRICT)?;
    let sex = Sex::parse_label(&row.text(COL_SEX)?)?;
    let age = row.whole(COL_AGE)?;
    let count = row.whole(COL_COUNT).filter(|&count| count <= MAX_COUNT)?;

    Some(Record {
        year,
        district,
        subdistrict,
        sex,
        age: clamp_age(age),
        count,
    })
}

/// Merge records sharing (year, district, subdistrict, sex, age) by summing
/// their counts. Output is sorted by that key.
pub fn collapse(records: impl IntoIterator<Item = Record>) -> Vec<Record> {
    let mut merged: BTreeMap<(Year, String, String, Sex, u8), u64> = BTreeMap::new();

    for record in records {
        *merged
            .entry((
                record.year,
                record.district,
                record.subdistrict,
                record.sex,
                record.age,
            ))
            .or_default() += record.count;
    }

    merged
        .into_iter()
        .map(|((year, district, subdistrict, sex, age), count)| Record {
            year,
            district,
            subdistrict,
            sex,
            age,
            count,
        })
        .collect()
}

/// Clamp every record's age to the ceiling and re-collapse.
///
/// Applying this to already-normalized records returns them unchanged.
pub fn clamp_records(records: &[Record]) -> Vec<Record> {
    collapse(records.iter().cloned().map(|mut record| {
        record.age = record.age.min(AGE_CEILING);
        record
    }))
}

/// Normalize raw rows into canonical records.
///
/// Invalid rows are dropped. Fails with [`CensusError::EmptyDataset`] when
/// nothing survives.
pub fn normalize(rows: &[RawRow]) -> Result<Vec<Record>> {
    let mut dropped = 0usize;
    let parsed: Vec<Record> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let record = parse_row(row);
            if record.is_none() {
                debug!("Dropping invalid row {}: {:?}", index, row);
                dropped += 1;
            }
            record
        })
        .collect();

    if parsed.is_empty() {
        return Err(CensusError::EmptyDataset {
            raw_rows: rows.len(),
        });
    }

    let valid = parsed.len();
    let records = collapse(parsed);

    info!(
        "Normalized {} raw rows: {} invalid, {} canonical records",
        rows.len(),
        dropped,
        records.len()
    );
    debug!("Collapsed {} valid rows into {}", valid, records.len());

    Ok(records)
}
