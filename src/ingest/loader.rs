//! Snapshot loading.
//!
//! Resolves where the census snapshot lives and reads its CSV files into
//! [`RawRow`]s. A source is either a single file or a directory, in which
//! case every `*.csv` beneath it is read in path order.

use crate::error::{CensusError, Result};
use crate::ingest::normalizer::{RawRow, RawValue};
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Raw bytes of a snapshot, read once so the checksum and the parse see
/// the same content.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    /// Path the snapshot was resolved from.
    pub origin: PathBuf,
    /// Files making up the snapshot, with their contents.
    pub files: Vec<(PathBuf, Vec<u8>)>,
}

impl SourceSnapshot {
    /// Read every CSV file under `path`.
    pub fn read(path: &Path, show_progress: bool) -> Result<Self> {
        let paths = discover_files(path)?;

        let pb = if show_progress && paths.len() > 1 {
            let pb = ProgressBar::new(paths.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut files = Vec::with_capacity(paths.len());
        for file in paths {
            if let Some(ref pb) = pb {
                pb.set_message(file.display().to_string());
            }
            let bytes = std::fs::read(&file).map_err(|e| CensusError::SourceUnreadable {
                path: file.clone(),
                reason: e.to_string(),
            })?;
            debug!("Read {} bytes from {}", bytes.len(), file.display());
            files.push((file, bytes));
            if let Some(ref pb) = pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("Snapshot read");
        }

        Ok(Self {
            origin: path.to_path_buf(),
            files,
        })
    }

    /// Build a snapshot from in-memory CSV content.
    pub fn from_bytes(origin: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let origin = origin.into();
        Self {
            files: vec![(origin.clone(), bytes)],
            origin,
        }
    }

    /// SHA-256 over the content of every file, hex encoded.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for (_, bytes) in &self.files {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Parse all files into raw rows.
    pub fn rows(&self) -> Result<Vec<RawRow>> {
        let mut rows = Vec::new();
        for (path, bytes) in &self.files {
            let parsed = parse_csv(bytes).map_err(|e| CensusError::SourceUnreadable {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            debug!("Parsed {} rows from {}", parsed.len(), path.display());
            rows.extend(parsed);
        }
        Ok(rows)
    }
}

/// Return the first candidate path that exists.
pub fn resolve_source(candidates: &[PathBuf]) -> Result<PathBuf> {
    for candidate in candidates {
        if candidate.exists() {
            info!("Using data source: {}", candidate.display());
            return Ok(candidate.clone());
        }
        debug!("Data source candidate not found: {}", candidate.display());
    }

    Err(CensusError::SourceUnreadable {
        path: candidates.first().cloned().unwrap_or_default(),
        reason: format!(
            "none of the candidate paths exist: {}",
            candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

/// List the CSV files making up a source.
pub fn discover_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        return Err(CensusError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: "path does not exist".to_string(),
        });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();

    files.sort();

    if files.is_empty() {
        return Err(CensusError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: "directory contains no .csv files".to_string(),
        });
    }

    Ok(files)
}

/// Parse CSV content with a header row into raw rows.
///
/// Empty cells become [`RawValue::Null`]; malformed records are skipped.
pub fn parse_csv(bytes: &[u8]) -> std::result::Result<Vec<RawRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed CSV record {}: {}", index + 1, e);
                continue;
            }
        };

        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let value = match record.get(i) {
                    Some(cell) if !cell.trim().is_empty() => RawValue::Text(cell.to_string()),
                    _ => RawValue::Null,
                };
                (column, value)
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}
