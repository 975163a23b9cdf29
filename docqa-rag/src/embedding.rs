//! Embedder trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A model that maps text to a fixed-length vector.
///
/// Implementations must be deterministic: embedding byte-identical text twice
/// within one process yields identical vectors. The default
/// [`embed_batch`](Embedder::embed_batch) calls [`embed`](Embedder::embed)
/// sequentially; backends with native batching should override it.
///
/// Failures to load or call the model surface as
/// [`RagError::EmbeddingUnavailable`](crate::RagError::EmbeddingUnavailable).
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Embedder, HashEmbedder};
///
/// let embedder = HashEmbedder::new(384);
/// let embedding = embedder.embed("hello world").await?;
/// assert_eq!(embedding.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this embedder.
    fn dimensions(&self) -> usize;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str;
}
