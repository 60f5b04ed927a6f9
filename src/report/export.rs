//! CSV export of records and aggregate tables.
//!
//! Output is UTF-8, comma-separated, with a header row and one data row per
//! record or aggregate row.

use crate::error::{CensusError, Result};
use crate::models::{AggregateRow, Dimension, Record};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Header of a record export.
pub const RECORD_HEADER: [&str; 6] = ["tahun", "kecamatan", "kelurahan", "kelamin", "umur", "jumlah"];

/// Write records using the source column names, so an export can be loaded
/// back as a snapshot.
pub fn write_records<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(RECORD_HEADER)?;

    for record in records {
        csv.write_record([
            record.year.to_string(),
            record.district.clone(),
            record.subdistrict.clone(),
            record.sex.code().to_string(),
            record.age.to_string(),
            record.count.to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Write aggregate rows with one column per dimension plus `count`.
///
/// Rows missing one of `dimensions` are rejected.
pub fn write_aggregate<W: Write>(
    rows: &[AggregateRow],
    dimensions: &[Dimension],
    writer: W,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = dimensions.iter().map(Dimension::column_name).collect();
    header.push("count");
    csv.write_record(&header)?;

    for row in rows {
        let mut fields = Vec::with_capacity(dimensions.len() + 1);
        for dimension in dimensions {
            let value = row
                .get(*dimension)
                .ok_or(CensusError::MissingDimension(*dimension))?;
            fields.push(value.to_string());
        }
        fields.push(row.count.to_string());
        csv.write_record(&fields)?;
    }

    csv.flush()?;
    Ok(())
}

/// Export records to a file.
pub fn export_records(records: &[Record], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_records(records, file)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}
