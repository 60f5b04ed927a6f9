//! The canonical record set of one snapshot.

use crate::error::Result;
use crate::ingest::loader::SourceSnapshot;
use crate::ingest::normalizer::normalize;
use crate::models::{Record, Year};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Normalized records of a snapshot together with its source identity.
///
/// A dataset is never mutated after construction; reloading a source
/// produces a new one.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Checksum of the source content.
    pub source_id: String,
    /// Where the snapshot was read from.
    pub origin: PathBuf,
    /// Number of raw rows before normalization.
    pub raw_rows: usize,
    records: Vec<Record>,
}

impl Dataset {
    /// Parse and normalize a snapshot.
    pub fn from_snapshot(snapshot: &SourceSnapshot) -> Result<Self> {
        let rows = snapshot.rows()?;
        let records = normalize(&rows)?;

        Ok(Self {
            source_id: snapshot.checksum(),
            origin: snapshot.origin.clone(),
            raw_rows: rows.len(),
            records,
        })
    }

    /// Wrap records that are already canonical.
    pub fn from_records(source_id: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            source_id: source_id.into(),
            origin: PathBuf::new(),
            raw_rows: records.len(),
            records,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Years present, most recent first.
    pub fn years(&self) -> Vec<Year> {
        let years: BTreeSet<Year> = self.records.iter().map(|r| r.year).collect();
        years.into_iter().rev().collect()
    }

    pub fn latest_year(&self) -> Option<Year> {
        self.records.iter().map(|r| r.year).max()
    }

    pub fn contains_year(&self, year: Year) -> bool {
        self.records.iter().any(|r| r.year == year)
    }

    /// Districts present in `year` (all years if `None`), sorted.
    pub fn districts(&self, year: Option<Year>) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| year.map_or(true, |y| r.year == y))
            .map(|r| r.district.as_str())
            .collect();
        names.into_iter().map(String::from).collect()
    }

    /// Subdistricts present in `year` and `district`, sorted.
    pub fn subdistricts(&self, year: Option<Year>, district: Option<&str>) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| year.map_or(true, |y| r.year == y))
            .filter(|r| district.map_or(true, |d| r.district == d))
            .map(|r| r.subdistrict.as_str())
            .collect();
        names.into_iter().map(String::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;

    fn record(year: i32, district: &str, sub: &str) -> Record {
        Record {
            year: Year(year),
            district: district.to_string(),
            subdistrict: sub.to_string(),
            sex: Sex::Male,
            age: 20,
            count: 1,
        }
    }

    #[test]
    fn test_filter_option_cascade() {
        let dataset = Dataset::from_records(
            "test",
            vec![
                record(2022, "B", "Y"),
                record(2023, "A", "X"),
                record(2023, "A", "W"),
                record(2023, "B", "Z"),
            ],
        );

        assert_eq!(dataset.years(), vec![Year(2023), Year(2022)]);
        assert_eq!(dataset.latest_year(), Some(Year(2023)));
        assert_eq!(dataset.districts(Some(Year(2022))), vec!["B"]);
        assert_eq!(dataset.districts(None), vec!["A", "B"]);
        assert_eq!(
            dataset.subdistricts(Some(Year(2023)), Some("A")),
            vec!["W", "X"]
        );
        assert_eq!(dataset.subdistricts(Some(Year(2023)), None), vec!["W", "X", "Z"]);
        assert!(!dataset.contains_year(Year(2021)));
    }

    #[test]
    fn test_from_snapshot() {
        let csv = "tahun,kecamatan,kelurahan,kelamin,umur,jumlah\n\
                   2023,a,x,L,80,5\n\
                   2023,a,x,L,76,3\n\
                   2023,a,x,?,20,1\n";
        let snapshot = SourceSnapshot::from_bytes("inline.csv", csv.as_bytes().to_vec());
        let dataset = Dataset::from_snapshot(&snapshot).unwrap();

        assert_eq!(dataset.raw_rows, 3);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].count, 8);
        assert_eq!(dataset.source_id, snapshot.checksum());
    }
}
