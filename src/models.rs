//! Data models for census statistics.
//!
//! This module contains the core data structures used throughout
//! the pipeline for representing records, grouping keys, and metric values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ages at or above this value are clamped to it ("75 and above").
pub const AGE_CEILING: u8 = 75;

/// First age of the productive (working-age) band.
pub const PRODUCTIVE_MIN_AGE: u8 = 15;

/// Last age of the productive (working-age) band.
pub const PRODUCTIVE_MAX_AGE: u8 = 64;

/// Largest population count accepted for a single source row.
///
/// Any in-memory record set sums without overflowing `u64`.
pub const MAX_COUNT: u64 = u32::MAX as u64;

/// Census year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(pub i32);

impl Year {
    /// Returns the year immediately before this one.
    pub fn previous(self) -> Year {
        Year(self.0 - 1)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Year {
    type Err = String;

    /// Parses `"2023"` as well as spreadsheet-style `"2023.0"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(year) = trimmed.parse::<i32>() {
            return Ok(Year(year));
        }
        match trimmed.parse::<f64>() {
            Ok(value)
                if value.fract() == 0.0
                    && value >= i32::MIN as f64
                    && value <= i32::MAX as f64 =>
            {
                Ok(Year(value as i32))
            }
            _ => Err(format!("invalid year: '{}'", s)),
        }
    }
}

/// Sex of a population group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Canonicalize a free-text sex value.
    ///
    /// The value is trimmed and upper-cased first. Accepts the source codes
    /// `L`/`P`, the full words `LAKI-LAKI`/`PEREMPUAN`, and `MALE`/`FEMALE`.
    pub fn parse_label(raw: &str) -> Option<Sex> {
        match raw.trim().to_uppercase().as_str() {
            "L" | "LAKI-LAKI" | "LAKI LAKI" | "MALE" => Some(Sex::Male),
            "P" | "PEREMPUAN" | "FEMALE" => Some(Sex::Female),
            _ => None,
        }
    }

    /// Returns the single-letter code used in the source data.
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "L",
            Sex::Female => "P",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "Male"),
            Sex::Female => write!(f, "Female"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sex::parse_label(s).ok_or_else(|| format!("invalid sex: '{}'", s))
    }
}

/// Five-year age group, with a terminal `75+` bin.
///
/// The partition is fixed: 15 right-open bins `[0,5)` … `[70,75)` and
/// `[75,∞)`. The wrapped value is the bin index, so the derived ordering
/// is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeGroup(u8);

impl AgeGroup {
    /// Width of every bounded bin.
    pub const WIDTH: u8 = 5;

    /// Number of groups, the terminal bin included.
    pub const COUNT: usize = 16;

    /// Labels in display order.
    pub const LABELS: [&'static str; AgeGroup::COUNT] = [
        "0-4", "5-9", "10-14", "15-19", "20-24", "25-29", "30-34", "35-39", "40-44", "45-49",
        "50-54", "55-59", "60-64", "65-69", "70-74", "75+",
    ];

    /// Returns the group containing `age`.
    pub fn of(age: u8) -> AgeGroup {
        AgeGroup((age / Self::WIDTH).min(Self::COUNT as u8 - 1))
    }

    /// All groups in display order.
    pub fn all() -> impl Iterator<Item = AgeGroup> {
        (0..Self::COUNT as u8).map(AgeGroup)
    }

    /// Position of this group in display order.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn label(&self) -> &'static str {
        Self::LABELS[self.index()]
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AgeGroup {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One canonical census row.
///
/// After normalization exactly one record exists per
/// (year, district, subdistrict, sex, age).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Record {
    pub year: Year,
    pub district: String,
    pub subdistrict: String,
    pub sex: Sex,
    /// Age in years, clamped to [`AGE_CEILING`].
    pub age: u8,
    /// At most [`MAX_COUNT`] for records read from a source.
    pub count: u64,
}

impl Record {
    /// Returns the identity tuple of this record.
    pub fn key(&self) -> (Year, &str, &str, Sex, u8) {
        (self.year, &self.district, &self.subdistrict, self.sex, self.age)
    }

    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::of(self.age)
    }

    pub fn is_productive(&self) -> bool {
        (PRODUCTIVE_MIN_AGE..=PRODUCTIVE_MAX_AGE).contains(&self.age)
    }
}

/// A dimension records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    District,
    Subdistrict,
    Sex,
    AgeGroup,
}

impl Dimension {
    /// Extract this dimension's value from a record.
    pub fn value_of(&self, record: &Record) -> DimensionValue {
        match self {
            Dimension::Year => DimensionValue::Year(record.year),
            Dimension::District => DimensionValue::District(record.district.clone()),
            Dimension::Subdistrict => DimensionValue::Subdistrict(record.subdistrict.clone()),
            Dimension::Sex => DimensionValue::Sex(record.sex),
            Dimension::AgeGroup => DimensionValue::AgeGroup(record.age_group()),
        }
    }

    /// Column name used in exports.
    pub fn column_name(&self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::District => "district",
            Dimension::Subdistrict => "subdistrict",
            Dimension::Sex => "sex",
            Dimension::AgeGroup => "age_group",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// The value of one grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Year(Year),
    District(String),
    Subdistrict(String),
    Sex(Sex),
    AgeGroup(AgeGroup),
}

impl DimensionValue {
    pub fn dimension(&self) -> Dimension {
        match self {
            DimensionValue::Year(_) => Dimension::Year,
            DimensionValue::District(_) => Dimension::District,
            DimensionValue::Subdistrict(_) => Dimension::Subdistrict,
            DimensionValue::Sex(_) => Dimension::Sex,
            DimensionValue::AgeGroup(_) => Dimension::AgeGroup,
        }
    }
}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionValue::Year(year) => write!(f, "{}", year),
            DimensionValue::District(name) | DimensionValue::Subdistrict(name) => {
                write!(f, "{}", name)
            }
            DimensionValue::Sex(sex) => write!(f, "{}", sex.code()),
            DimensionValue::AgeGroup(group) => write!(f, "{}", group),
        }
    }
}

/// Result of grouping records: key values in grouping order plus a summed count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<DimensionValue>,
    pub count: u64,
}

impl AggregateRow {
    /// Returns the key value for `dimension`, if the row carries it.
    pub fn get(&self, dimension: Dimension) -> Option<&DimensionValue> {
        self.key.iter().find(|v| v.dimension() == dimension)
    }

    /// Dimensions carried by this row, in grouping order.
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.key.iter().map(DimensionValue::dimension).collect()
    }
}

/// Why a metric could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    /// The year before the selected one is absent from the dataset.
    NoPriorYear,
    /// The denominator summed to zero.
    DivisionByZero,
    /// The filtered selection holds no records.
    NoData,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::NoPriorYear => write!(f, "no prior-year data"),
            Unavailable::DivisionByZero => write!(f, "zero denominator"),
            Unavailable::NoData => write!(f, "no data"),
        }
    }
}

/// A derived value that is either computed or explicitly not computable.
///
/// `Available(0.0)` and `Unavailable(_)` are distinct states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric<T> {
    Available(T),
    Unavailable(Unavailable),
}

impl<T> Metric<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Available(v) => Some(v),
            Metric::Unavailable(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Metric::Available(v) => Metric::Available(f(v)),
            Metric::Unavailable(reason) => Metric::Unavailable(reason),
        }
    }
}

/// Divide two sums, reporting a zero denominator as unavailable.
pub fn ratio(numerator: u64, denominator: u64) -> Metric<f64> {
    if denominator == 0 {
        Metric::Unavailable(Unavailable::DivisionByZero)
    } else {
        Metric::Available(numerator as f64 / denominator as f64)
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
