//! Wiring one question-answering session from configuration and files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use docqa_rag::{
    Answerer, Embedder, IndexSnapshot, IngestReport, InMemoryVectorIndex, QaOrchestrator,
    RagConfig, VectorIndex,
};
use tracing::{debug, warn};

use crate::loader;

/// What happened to a batch of files: those that could not be read, and the
/// ingestion report for those that could.
#[derive(Debug, Default)]
pub struct FileReport {
    pub unreadable: Vec<(PathBuf, anyhow::Error)>,
    pub ingest: IngestReport,
}

impl FileReport {
    pub fn segment_count(&self) -> usize {
        self.ingest.segment_count()
    }

    /// Files unreadable plus documents that failed to ingest.
    pub fn skipped_count(&self) -> usize {
        self.unreadable.len() + self.ingest.failures().count()
    }

    /// Whether every file was read and ingested.
    pub fn is_complete(&self) -> bool {
        self.unreadable.is_empty() && self.ingest.is_complete()
    }
}

/// An orchestrator plus a concrete handle on its index for snapshotting.
pub struct Session {
    pub qa: QaOrchestrator,
    index: Arc<InMemoryVectorIndex>,
}

impl Session {
    /// Build a session, restoring the index from `snapshot` when given.
    ///
    /// A restored index must match the embedder's dimensionality and the
    /// configured distance metric.
    pub fn open(
        config: RagConfig,
        embedder: Arc<dyn Embedder>,
        answerer: Arc<dyn Answerer>,
        snapshot: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let index = match snapshot {
            Some(path) => {
                let snapshot = IndexSnapshot::load(path)?;
                match snapshot.dimensions {
                    Some(dims) if dims != embedder.dimensions() => bail!(
                        "snapshot '{}' holds {dims}-dimensional vectors but embedder '{}' produces {}",
                        path.display(),
                        embedder.name(),
                        embedder.dimensions()
                    ),
                    _ => {}
                }
                if snapshot.metric != config.distance_metric {
                    bail!(
                        "snapshot '{}' was built for {} distance but the configured metric is {}",
                        path.display(),
                        snapshot.metric,
                        config.distance_metric
                    );
                }
                InMemoryVectorIndex::from_snapshot(snapshot)?
            }
            None => InMemoryVectorIndex::with_metric(config.distance_metric),
        };
        let index = Arc::new(index);

        let qa = QaOrchestrator::builder()
            .config(config)
            .embedder(embedder)
            .answerer(answerer)
            .index(Arc::clone(&index) as Arc<dyn VectorIndex>)
            .build()?;
        Ok(Self { qa, index })
    }

    /// Load and ingest `paths`. Files that cannot be read and documents that
    /// fail to ingest are skipped and listed in the report.
    pub async fn ingest_files(&self, paths: &[PathBuf]) -> FileReport {
        let mut report = FileReport::default();
        if paths.is_empty() {
            return report;
        }

        let mut documents = Vec::new();
        for (path, outcome) in loader::load_documents(paths) {
            match outcome {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!(path = %path.display(), error = format!("{e:#}"), "skipping unreadable file");
                    report.unreadable.push((path, e));
                }
            }
        }

        report.ingest = self.qa.ingest(&documents).await;
        debug!(
            file_count = paths.len(),
            document_count = documents.len(),
            unreadable = report.unreadable.len(),
            "files ingested"
        );
        report
    }

    /// Write the current index to `path` as a JSON snapshot.
    pub async fn save_snapshot(&self, path: &Path) -> anyhow::Result<()> {
        self.index.snapshot().await.save(path)?;
        Ok(())
    }
}
