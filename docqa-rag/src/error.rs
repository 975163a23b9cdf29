//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// Chunking or retrieval parameters are invalid, or a required component
    /// was not supplied. Raised before any processing happens.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The embedding model could not be loaded or invoked.
    #[error("Embedding unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedder that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The answer generator could not be invoked.
    #[error("Generation unavailable ({provider}): {message}")]
    GenerationUnavailable {
        /// The answerer that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector's length differs from the dimensionality of the index.
    #[error("Dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch {
        /// The dimensionality established by the index.
        expected: usize,
        /// The length of the offending vector.
        actual: usize,
    },

    /// A question was asked before any segment was indexed.
    #[error("No documents have been indexed yet")]
    NotReady,

    /// An index snapshot could not be read or written.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl RagError {
    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable { provider: provider.into(), message: message.into() }
    }

    pub(crate) fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationUnavailable { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
