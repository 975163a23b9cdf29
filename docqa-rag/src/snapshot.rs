//! JSON snapshots of an in-memory vector index.
//!
//! A snapshot records the dimensionality and metric once in its header,
//! followed by every entry as (vector, segment, sequence). Snapshots carry no
//! durability guarantees; they exist so a session can skip re-embedding.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::distance::DistanceMetric;
use crate::error::{RagError, Result};
use crate::vectorindex::IndexEntry;

/// Current snapshot layout version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A serializable copy of a vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSnapshot {
    /// Layout version, checked on load.
    pub format_version: u32,
    /// Metric the index ranks by.
    pub metric: DistanceMetric,
    /// Length of every vector in `entries`; `None` for an empty index.
    pub dimensions: Option<usize>,
    /// Stored entries.
    pub entries: Vec<IndexEntry>,
}

impl IndexSnapshot {
    pub(crate) fn new(
        metric: DistanceMetric,
        dimensions: Option<usize>,
        entries: Vec<IndexEntry>,
    ) -> Self {
        Self { format_version: SNAPSHOT_FORMAT_VERSION, metric, dimensions, entries }
    }

    /// Check the header against the entries.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Snapshot`] for an unknown version, a missing
    /// dimensionality or duplicate sequences, and
    /// [`RagError::DimensionMismatch`] for a vector of the wrong length.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(RagError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.entries.is_empty() {
            return Ok(());
        }

        let expected = self.dimensions.ok_or_else(|| {
            RagError::Snapshot("snapshot has entries but no dimensionality".to_string())
        })?;

        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.vector.len() != expected {
                return Err(RagError::DimensionMismatch { expected, actual: entry.vector.len() });
            }
            if !seen.insert(entry.sequence) {
                return Err(RagError::Snapshot(format!(
                    "duplicate insertion sequence {}",
                    entry.sequence
                )));
            }
        }
        Ok(())
    }

    /// Write the snapshot as JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Snapshot`] if the file cannot be created or written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write = || -> std::io::Result<()> {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()
        };

        write().map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to write index snapshot");
            RagError::Snapshot(format!("failed to write '{}': {e}", path.display()))
        })?;

        info!(path = %path.display(), entry_count = self.entries.len(), "saved index snapshot");
        Ok(())
    }

    /// Read and validate a snapshot from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Snapshot`] if the file cannot be read or parsed, or
    /// any error from [`validate`](IndexSnapshot::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            RagError::Snapshot(format!("failed to open '{}': {e}", path.display()))
        })?;

        let snapshot: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to parse index snapshot");
            RagError::Snapshot(format!("failed to parse '{}': {e}", path.display()))
        })?;

        snapshot.validate()?;
        info!(path = %path.display(), entry_count = snapshot.entries.len(), "loaded index snapshot");
        Ok(snapshot)
    }
}
