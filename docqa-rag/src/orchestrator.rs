//! Question-answering session orchestrator.
//!
//! The [`QaOrchestrator`] coordinates ingestion (chunk → embed → insert) and
//! question answering (retrieve → assemble context → generate → record) for
//! one logical session, and owns that session's interaction history.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{Document, HashEmbedder, QaOrchestrator, RagConfig};
//!
//! let orchestrator = QaOrchestrator::builder()
//!     .config(RagConfig::default())
//!     .embedder(Arc::new(HashEmbedder::default()))
//!     .answerer(Arc::new(my_answerer))
//!     .build()?;
//!
//! let report = orchestrator.ingest(&[Document::new("guide", text)]).await;
//! let answer = orchestrator.ask_with_defaults("What gear is required?").await?;
//! ```

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::answerer::Answerer;
use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::context::ContextAssembler;
use crate::document::{Document, InteractionRecord, SearchResult};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorIndex;
use crate::retriever::Retriever;
use crate::vectorindex::VectorIndex;

/// Whether the session has anything to answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No segment has been indexed.
    Empty,
    /// At least one segment is indexed.
    Indexed,
}

/// Result of ingesting one document.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// The document's ID.
    pub document_id: String,
    /// Number of segments stored, or why the document was skipped.
    pub result: Result<usize>,
}

/// Per-document results of an [`QaOrchestrator::ingest`] call, in input order.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// One outcome per input document.
    pub outcomes: Vec<DocumentOutcome>,
}

impl IngestReport {
    /// Total segments stored across all documents.
    pub fn segment_count(&self) -> usize {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok()).sum()
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Whether every document was ingested.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Ingests documents and answers questions grounded in them.
///
/// A failed call leaves the orchestrator usable: ingestion failures are
/// reported per document and a failed [`ask`](QaOrchestrator::ask) records no
/// history. Construct one via [`QaOrchestrator::builder()`].
pub struct QaOrchestrator {
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    answerer: Arc<dyn Answerer>,
    retriever: Retriever,
    history: RwLock<Vec<InteractionRecord>>,
}

impl QaOrchestrator {
    /// Create a new [`QaOrchestratorBuilder`].
    pub fn builder() -> QaOrchestratorBuilder {
        QaOrchestratorBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Current session state.
    pub async fn state(&self) -> SessionState {
        if self.index.is_empty().await { SessionState::Empty } else { SessionState::Indexed }
    }

    /// Chunk, embed, and index each document in order.
    ///
    /// A document that fails to embed or insert is recorded in the report and
    /// the remaining documents are still attempted. Each document's segments
    /// are inserted all-or-nothing.
    pub async fn ingest(&self, documents: &[Document]) -> IngestReport {
        let mut report = IngestReport::default();
        for document in documents {
            let result = self.ingest_document(document).await;
            if let Err(e) = &result {
                warn!(document.id = %document.id, error = %e, "document skipped");
            }
            report.outcomes.push(DocumentOutcome { document_id: document.id.clone(), result });
        }

        info!(
            document_count = documents.len(),
            segment_count = report.segment_count(),
            failed = report.failures().count(),
            "ingestion finished"
        );
        report
    }

    async fn ingest_document(&self, document: &Document) -> Result<usize> {
        // 1. Chunk the document
        let segments = self.chunker.chunk(document);
        if segments.is_empty() {
            info!(document.id = %document.id, segment_count = 0, "ingested document (empty)");
            return Ok(0);
        }

        // 2. Embed all segment texts; no index lock is held here
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts).await.inspect_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during ingestion");
        })?;
        if vectors.len() != segments.len() {
            return Err(RagError::embedding(
                self.embedder.name(),
                format!("expected {} embeddings, got {}", segments.len(), vectors.len()),
            ));
        }

        // 3. Insert every (vector, segment) pair in order
        let segment_count = segments.len();
        self.index.insert_batch(vectors.into_iter().zip(segments).collect()).await.inspect_err(
            |e| error!(document.id = %document.id, error = %e, "insert failed during ingestion"),
        )?;

        info!(document.id = %document.id, segment_count, "ingested document");
        Ok(segment_count)
    }

    /// Return up to `k` stored segments ranked by relevance to `query`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.retriever.retrieve(query, k).await
    }

    /// Answer `query` from the top `k` segments, each trimmed to
    /// `max_chars_per_segment` characters in the prompt.
    ///
    /// On success the round is appended to the history. On any failure
    /// nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `k` or `max_chars_per_segment`
    /// is zero, [`RagError::NotReady`] before any successful ingestion, and
    /// otherwise whatever retrieval or the answerer fails with.
    pub async fn ask(&self, query: &str, k: usize, max_chars_per_segment: usize) -> Result<String> {
        if max_chars_per_segment == 0 {
            return Err(RagError::InvalidConfig(
                "max_chars_per_segment must be greater than zero".to_string(),
            ));
        }
        if self.state().await == SessionState::Empty {
            return Err(RagError::NotReady);
        }

        let results = self.retriever.retrieve(query, k).await?;
        let context = ContextAssembler::new(max_chars_per_segment)
            .assemble(results.iter().map(|r| &r.segment));
        let prompt = ContextAssembler::build_prompt(&context, query);

        let answer = self.answerer.generate(&prompt).await.inspect_err(|e| {
            error!(answerer = self.answerer.name(), error = %e, "answer generation failed");
        })?;

        let mut history = self.history.write().await;
        history.push(InteractionRecord {
            query: query.to_string(),
            answer: answer.clone(),
            recorded_at: Utc::now(),
        });
        info!(result_count = results.len(), history_len = history.len(), "question answered");

        Ok(answer)
    }

    /// [`ask`](QaOrchestrator::ask) with the configured `retrieval_k` and
    /// `max_chars_per_segment`.
    pub async fn ask_with_defaults(&self, query: &str) -> Result<String> {
        self.ask(query, self.config.retrieval_k, self.config.max_chars_per_segment).await
    }

    /// Completed rounds, oldest first.
    pub async fn history(&self) -> Vec<InteractionRecord> {
        self.history.read().await.clone()
    }

    /// Drop every indexed segment, returning to [`SessionState::Empty`].
    /// History is kept.
    pub async fn reset(&self) {
        self.index.clear().await;
        info!("index cleared");
    }
}

/// Builder for constructing a [`QaOrchestrator`].
///
/// `embedder` and `answerer` are required. Without a `config` the defaults
/// are used, taking the metric from the injected index if there is one;
/// without a `chunker` a [`FixedSizeChunker`] is built from the config;
/// without an `index` an [`InMemoryVectorIndex`] using the configured metric
/// is created.
#[derive(Default)]
pub struct QaOrchestratorBuilder {
    config: Option<RagConfig>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<dyn VectorIndex>>,
    answerer: Option<Arc<dyn Answerer>>,
}

impl QaOrchestratorBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the chunker built from the configuration.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedder.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Use an existing vector index, e.g. one restored from a snapshot.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the answerer.
    pub fn answerer(mut self, answerer: Arc<dyn Answerer>) -> Self {
        self.answerer = Some(answerer);
        self
    }

    /// Build the [`QaOrchestrator`], validating the configuration and that
    /// all required collaborators are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if the configuration is invalid, a
    /// required field is missing, or an injected index ranks by a different
    /// metric than the configuration names.
    pub fn build(self) -> Result<QaOrchestrator> {
        let config = match (self.config, &self.index) {
            (Some(config), _) => config,
            (None, Some(index)) => {
                RagConfig { distance_metric: index.metric(), ..RagConfig::default() }
            }
            (None, None) => RagConfig::default(),
        };
        config.validate()?;
        if let Some(index) = &self.index {
            if index.metric() != config.distance_metric {
                return Err(RagError::InvalidConfig(format!(
                    "index ranks by {} but distance_metric is {}",
                    index.metric(),
                    config.distance_metric
                )));
            }
        }

        let embedder = self
            .embedder
            .ok_or_else(|| RagError::InvalidConfig("embedder is required".to_string()))?;
        let answerer = self
            .answerer
            .ok_or_else(|| RagError::InvalidConfig("answerer is required".to_string()))?;
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };
        let index: Arc<dyn VectorIndex> = match self.index {
            Some(index) => index,
            None => Arc::new(InMemoryVectorIndex::with_metric(config.distance_metric)),
        };

        Ok(QaOrchestrator {
            retriever: Retriever::new(Arc::clone(&embedder), Arc::clone(&index)),
            config,
            chunker,
            embedder,
            index,
            answerer,
            history: RwLock::default(),
        })
    }
}
