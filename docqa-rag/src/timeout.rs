//! Deadlines for slow embedding and generation calls.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::answerer::Answerer;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};

/// Wraps an [`Embedder`] or [`Answerer`] so each call fails once `timeout`
/// elapses.
///
/// An elapsed embedding call becomes [`RagError::EmbeddingUnavailable`]; an
/// elapsed generation call becomes [`RagError::GenerationUnavailable`].
/// Nothing is retried.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use docqa_rag::{HashEmbedder, WithTimeout};
///
/// let embedder = WithTimeout::new(HashEmbedder::default(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct WithTimeout<T> {
    inner: T,
    timeout: Duration,
}

impl<T> WithTimeout<T> {
    /// Wrap `inner` with the given per-call deadline.
    pub fn new(inner: T, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The wrapped collaborator.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Embedder> Embedder for WithTimeout<T> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tokio::time::timeout(self.timeout, self.inner.embed(text)).await.map_err(|_| {
            warn!(embedder = self.inner.name(), timeout = ?self.timeout, "embedding timed out");
            RagError::embedding(self.inner.name(), format!("timed out after {:?}", self.timeout))
        })?
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        tokio::time::timeout(self.timeout, self.inner.embed_batch(texts)).await.map_err(|_| {
            warn!(
                embedder = self.inner.name(),
                batch_size = texts.len(),
                timeout = ?self.timeout,
                "batch embedding timed out"
            );
            RagError::embedding(self.inner.name(), format!("timed out after {:?}", self.timeout))
        })?
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[async_trait]
impl<T: Answerer> Answerer for WithTimeout<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tokio::time::timeout(self.timeout, self.inner.generate(prompt)).await.map_err(|_| {
            warn!(answerer = self.inner.name(), timeout = ?self.timeout, "generation timed out");
            RagError::generation(self.inner.name(), format!("timed out after {:?}", self.timeout))
        })?
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
