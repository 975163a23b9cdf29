//! In-memory vector index using brute-force exact search.
//!
//! This module provides [`InMemoryVectorIndex`], a vector index backed by a
//! `Vec` protected by a `tokio::sync::RwLock`. Inserts take the write lock and
//! assign the insertion sequence inside it; searches share the read lock and
//! scan every entry, so rankings are exact and reproducible.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::distance::{DistanceMetric, compare_distances};
use crate::document::{SearchResult, Segment};
use crate::error::{RagError, Result};
use crate::snapshot::IndexSnapshot;
use crate::vectorindex::{IndexEntry, VectorIndex};

#[derive(Debug, Default)]
struct IndexState {
    dimensions: Option<usize>,
    entries: Vec<IndexEntry>,
    next_sequence: u64,
}

impl IndexState {
    /// Check a vector against the established dimensionality, or against the
    /// first vector of a pending batch when none is established yet.
    fn check(&self, expected: Option<usize>, vector: &[f32]) -> Result<()> {
        match expected.or(self.dimensions) {
            Some(expected) if expected != vector.len() => {
                Err(RagError::DimensionMismatch { expected, actual: vector.len() })
            }
            _ if vector.is_empty() => Err(RagError::DimensionMismatch { expected: 1, actual: 0 }),
            _ => Ok(()),
        }
    }

    fn push(&mut self, vector: Vec<f32>, segment: Segment) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.dimensions.get_or_insert(vector.len());
        self.entries.push(IndexEntry { vector, segment, sequence });
        sequence
    }
}

/// An in-memory vector index with exact, deterministic k-NN search.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{DistanceMetric, InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::with_metric(DistanceMetric::Euclidean);
/// index.insert(vec![0.0, 1.0], segment).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    metric: DistanceMetric,
    state: RwLock<IndexState>,
}

impl InMemoryVectorIndex {
    /// Create an empty index ranking by cosine distance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index ranking by the given metric.
    pub fn with_metric(metric: DistanceMetric) -> Self {
        Self { metric, state: RwLock::default() }
    }

    /// Copy the current contents into a serializable snapshot.
    pub async fn snapshot(&self) -> IndexSnapshot {
        let state = self.state.read().await;
        IndexSnapshot::new(self.metric, state.dimensions, state.entries.clone())
    }

    /// Rebuild an index from a snapshot.
    ///
    /// New inserts continue numbering after the highest restored sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if any vector disagrees with the
    /// snapshot header, or [`RagError::Snapshot`] if sequences are duplicated.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self> {
        snapshot.validate()?;
        let IndexSnapshot { metric, dimensions, mut entries, .. } = snapshot;
        entries.sort_by_key(|entry| entry.sequence);
        let next_sequence = entries.last().map_or(0, |entry| entry.sequence + 1);
        let dimensions = if entries.is_empty() { None } else { dimensions };

        Ok(Self {
            metric,
            state: RwLock::new(IndexState { dimensions, entries, next_sequence }),
        })
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn insert(&self, vector: Vec<f32>, segment: Segment) -> Result<u64> {
        let mut state = self.state.write().await;
        state.check(None, &vector)?;
        Ok(state.push(vector, segment))
    }

    async fn insert_batch(&self, entries: Vec<(Vec<f32>, Segment)>) -> Result<Vec<u64>> {
        let mut state = self.state.write().await;
        let batch_dimensions = entries.first().map(|(vector, _)| vector.len());
        for (vector, _) in &entries {
            state.check(state.dimensions.or(batch_dimensions), vector)?;
        }

        let sequences: Vec<u64> =
            entries.into_iter().map(|(vector, segment)| state.push(vector, segment)).collect();
        debug!(inserted = sequences.len(), total = state.entries.len(), "index batch insert");
        Ok(sequences)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::InvalidConfig("k must be greater than zero".to_string()));
        }

        let state = self.state.read().await;
        let Some(dimensions) = state.dimensions else {
            return Ok(Vec::new());
        };
        if query.len() != dimensions {
            return Err(RagError::DimensionMismatch { expected: dimensions, actual: query.len() });
        }

        let mut scored: Vec<(f32, &IndexEntry)> = state
            .entries
            .iter()
            .map(|entry| (self.metric.distance(&entry.vector, query), entry))
            .collect();

        let order = |a: &(f32, &IndexEntry), b: &(f32, &IndexEntry)| {
            compare_distances(a.0, b.0).then(a.1.sequence.cmp(&b.1.sequence))
        };
        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, order);
            scored.truncate(k);
        }
        scored.sort_by(order);

        Ok(scored
            .into_iter()
            .map(|(distance, entry)| SearchResult {
                segment: entry.segment.clone(),
                distance,
                sequence: entry.sequence,
            })
            .collect())
    }

    async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    async fn dimensions(&self) -> Option<usize> {
        self.state.read().await.dimensions
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.dimensions = None;
    }
}
