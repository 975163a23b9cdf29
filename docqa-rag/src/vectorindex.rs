//! Vector index trait for storing segment embeddings and ranking them by distance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::document::{SearchResult, Segment};
use crate::error::Result;

/// A stored embedding, its segment, and the order in which it was inserted.
///
/// Entries are never mutated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The segment's embedding.
    pub vector: Vec<f32>,
    /// The embedded segment.
    pub segment: Segment,
    /// Monotonically increasing insertion number, used to break distance ties.
    pub sequence: u64,
}

/// A collection of embedded segments supporting exact k-nearest-neighbor search.
///
/// The first insert establishes the index dimensionality; every later vector
/// must match it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// index.insert(vector, segment).await?;
/// let results = index.search(&query_vector, 3).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Append one entry and return its insertion sequence.
    ///
    /// Fails with [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// if the vector length differs from the established dimensionality.
    async fn insert(&self, vector: Vec<f32>, segment: Segment) -> Result<u64>;

    /// Append several entries in order.
    ///
    /// The default implementation inserts one at a time and may leave a prefix
    /// applied on failure; implementations should override it to validate all
    /// vectors first.
    async fn insert_batch(&self, entries: Vec<(Vec<f32>, Segment)>) -> Result<Vec<u64>> {
        let mut sequences = Vec::with_capacity(entries.len());
        for (vector, segment) in entries {
            sequences.push(self.insert(vector, segment).await?);
        }
        Ok(sequences)
    }

    /// Return at most `k` entries ordered by ascending distance to `query`,
    /// ties broken by ascending insertion sequence.
    ///
    /// An empty index yields an empty result.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored entries.
    async fn len(&self) -> usize;

    /// Whether the index holds no entries.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Dimensionality established by the first insert, if any.
    async fn dimensions(&self) -> Option<usize>;

    /// The metric used to rank entries.
    fn metric(&self) -> DistanceMetric;

    /// Remove every entry and forget the established dimensionality.
    async fn clear(&self);
}
