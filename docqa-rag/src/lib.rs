//! # docqa-rag
//!
//! Retrieval-augmented question answering over an in-memory vector index.
//!
//! Documents are split into overlapping fixed-size [`Segment`]s by a
//! [`Chunker`], embedded by an [`Embedder`], and stored in a [`VectorIndex`].
//! At question time the [`Retriever`] finds the nearest segments, the
//! [`ContextAssembler`] turns them into a prompt, and an [`Answerer`]
//! generates the reply. [`QaOrchestrator`] ties the steps together for one
//! session and keeps its interaction history.
//!
//! ## Feature flags
//!
//! | Feature | Provides |
//! |---------|----------|
//! | `onnx` | [`onnx::OnnxEmbedder`] (local `all-MiniLM-L6-v2` through ONNX Runtime) |
//! | `openai` | [`openai::OpenAIEmbedder`], [`openai::ChatCompletionsAnswerer`] (OpenAI and Azure OpenAI) |
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{Document, HashEmbedder, QaOrchestrator};
//!
//! let orchestrator = QaOrchestrator::builder()
//!     .embedder(Arc::new(HashEmbedder::default()))
//!     .answerer(answerer)
//!     .build()?;
//!
//! orchestrator.ingest(&[Document::new("handbook", handbook_text)]).await;
//! let answer = orchestrator.ask_with_defaults("How many days of leave?").await?;
//! ```

pub mod answerer;
pub mod chunking;
pub mod config;
pub mod context;
pub mod distance;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashed;
pub mod inmemory;
pub mod orchestrator;
pub mod retriever;
pub mod snapshot;
pub mod timeout;
pub mod vectorindex;

#[cfg(feature = "onnx")]
pub mod onnx;
#[cfg(feature = "openai")]
pub mod openai;

pub use answerer::Answerer;
pub use chunking::{Chunker, FixedSizeChunker, split};
pub use config::{RagConfig, RagConfigBuilder};
pub use context::{ContextAssembler, TRUNCATION_MARKER, assemble};
pub use distance::DistanceMetric;
pub use document::{Document, InteractionRecord, SearchResult, Segment};
pub use embedding::Embedder;
pub use error::{RagError, Result};
pub use hashed::HashEmbedder;
pub use inmemory::InMemoryVectorIndex;
pub use orchestrator::{
    DocumentOutcome, IngestReport, QaOrchestrator, QaOrchestratorBuilder, SessionState,
};
pub use retriever::Retriever;
pub use snapshot::IndexSnapshot;
pub use timeout::WithTimeout;
pub use vectorindex::{IndexEntry, VectorIndex};

#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;
#[cfg(feature = "openai")]
pub use openai::{ChatCompletionsAnswerer, ChatEndpoint, OpenAIEmbedder};
