//! Error types for the census pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Dimension;

/// Error type for loading, normalization, and query failures.
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("source '{path}' could not be read: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },
    #[error("no valid records in dataset ({raw_rows} raw rows read)")]
    EmptyDataset { raw_rows: usize },
    #[error("no data for the current selection")]
    NoData,
    #[error("rows are not grouped by '{0}'")]
    MissingDimension(Dimension),
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CensusError>;
