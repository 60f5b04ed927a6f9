//! In-memory snapshot cache.
//!
//! Datasets are keyed by the checksum of their source content. Entries are
//! only dropped through [`SnapshotCache::invalidate`] or
//! [`SnapshotCache::clear`]; nothing here touches the aggregation logic.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::ingest::loader::SourceSnapshot;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: HashMap<String, Arc<Dataset>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the source at `path` and return its dataset, normalizing only
    /// when the content has not been seen before.
    pub fn load_path(&mut self, path: &Path, show_progress: bool) -> Result<Arc<Dataset>> {
        let snapshot = SourceSnapshot::read(path, show_progress)?;
        self.load(&snapshot)
    }

    /// Return the dataset for `snapshot`, normalizing on a miss.
    pub fn load(&mut self, snapshot: &SourceSnapshot) -> Result<Arc<Dataset>> {
        let checksum = snapshot.checksum();

        if let Some(dataset) = self.entries.get(&checksum) {
            debug!("Snapshot cache hit: {}", checksum);
            return Ok(Arc::clone(dataset));
        }

        info!("Loading snapshot {} from {}", checksum, snapshot.origin.display());
        let dataset = Arc::new(Dataset::from_snapshot(snapshot)?);
        self.entries.insert(checksum, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn get(&self, checksum: &str) -> Option<Arc<Dataset>> {
        self.entries.get(checksum).cloned()
    }

    /// Drop one entry. Returns whether it was cached.
    pub fn invalidate(&mut self, checksum: &str) -> bool {
        let removed = self.entries.remove(checksum).is_some();
        if removed {
            debug!("Invalidated snapshot {}", checksum);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
