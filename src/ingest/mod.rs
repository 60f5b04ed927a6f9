//! Snapshot ingestion: loading, normalization, and caching.

pub mod cache;
pub mod loader;
pub mod normalizer;

pub use cache::SnapshotCache;
pub use loader::{discover_files, resolve_source, SourceSnapshot};
pub use normalizer::{normalize, RawRow, RawValue};
