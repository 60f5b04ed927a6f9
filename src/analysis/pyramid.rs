//! Age bucketing and population pyramids.

use crate::models::{AgeGroup, Record, Sex};
use serde::Serialize;

/// Map an age to its five-year group.
pub fn age_group_of(age: u8) -> AgeGroup {
    AgeGroup::of(age)
}

/// One bar pair of a population pyramid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PyramidRow {
    pub age_group: AgeGroup,
    pub male: u64,
    pub female: u64,
}

impl PyramidRow {
    pub fn total(&self) -> u64 {
        self.male + self.female
    }
}

/// Male and female totals for every age group, youngest first.
///
/// Always returns [`AgeGroup::COUNT`] rows; empty groups are zero.
pub fn pyramid(records: &[Record]) -> Vec<PyramidRow> {
    let mut rows: Vec<PyramidRow> = AgeGroup::all()
        .map(|age_group| PyramidRow {
            age_group,
            male: 0,
            female: 0,
        })
        .collect();

    for record in records {
        let row = &mut rows[record.age_group().index()];
        match record.sex {
            Sex::Male => row.male += record.count,
            Sex::Female => row.female += record.count,
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Year;

    fn record(sex: Sex, age: u8, count: u64) -> Record {
        Record {
            year: Year(2023),
            district: "A".to_string(),
            subdistrict: "X".to_string(),
            sex,
            age,
            count,
        }
    }

    #[test]
    fn test_pyramid_complete_when_empty() {
        let rows = pyramid(&[]);
        assert_eq!(rows.len(), 16);
        assert!(rows.iter().all(|r| r.total() == 0));
        let labels: Vec<&str> = rows.iter().map(|r| r.age_group.label()).collect();
        assert_eq!(labels, AgeGroup::LABELS.to_vec());
    }

    #[test]
    fn test_pyramid_sparse_input() {
        let rows = pyramid(&[
            record(Sex::Male, 0, 3),
            record(Sex::Female, 4, 2),
            record(Sex::Male, 75, 6),
            record(Sex::Female, 72, 1),
            record(Sex::Male, 75, 1),
        ]);

        assert_eq!(rows.len(), 16);
        assert_eq!(rows[0], PyramidRow { age_group: age_group_of(0), male: 3, female: 2 });
        assert_eq!(rows[14].female, 1);
        assert_eq!(rows[15].male, 7);
        assert_eq!(rows[15].age_group.label(), "75+");
        assert_eq!(rows[7].total(), 0);
    }
}
