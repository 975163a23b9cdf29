//! Query-time retrieval: embed the question, then search the index.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::SearchResult;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vectorindex::VectorIndex;

/// Finds the stored segments most relevant to a query text.
///
/// Errors from the embedder or the index are returned unchanged.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    /// Create a retriever over the given embedder and index.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Return up to `k` segments ranked by ascending distance to `query`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_vector = self.embedder.embed(query).await.inspect_err(|e| {
            error!(embedder = self.embedder.name(), error = %e, "query embedding failed");
        })?;

        let results = self.index.search(&query_vector, k).await.inspect_err(|e| {
            error!(error = %e, "vector index search failed");
        })?;

        debug!(k, result_count = results.len(), "retrieved segments");
        Ok(results)
    }
}
