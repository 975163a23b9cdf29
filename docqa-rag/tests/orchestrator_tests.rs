//! Tests for the question-answering orchestrator: ingestion, asking, and history.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use docqa_rag::{
    Answerer, DistanceMetric, Document, Embedder, HashEmbedder, InMemoryVectorIndex, QaOrchestrator,
    RagConfig, RagError, SessionState, VectorIndex,
};

/// Records every prompt and answers with a fixed reply, or fails while `down` is set.
#[derive(Default)]
struct ScriptedAnswerer {
    prompts: Mutex<Vec<String>>,
    down: AtomicBool,
}

impl ScriptedAnswerer {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Answerer for ScriptedAnswerer {
    async fn generate(&self, prompt: &str) -> docqa_rag::Result<String> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RagError::GenerationUnavailable {
                provider: "Scripted".into(),
                message: "service down".into(),
            });
        }
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        Ok(format!("answer #{}", prompts.len()))
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// Two-dimensional embedder that fails on "POISON" and widens on "WIDE".
struct PickyEmbedder;

#[async_trait]
impl Embedder for PickyEmbedder {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        if text.contains("POISON") {
            return Err(RagError::EmbeddingUnavailable {
                provider: "Picky".into(),
                message: "model rejected input".into(),
            });
        }
        if text.contains("WIDE") {
            return Ok(vec![1.0, 1.0, 1.0]);
        }
        Ok(vec![text.len() as f32, 1.0])
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "Picky"
    }
}

/// Returns one vector too few for any batch.
struct ShortBatchEmbedder;

#[async_trait]
impl Embedder for ShortBatchEmbedder {
    async fn embed(&self, _text: &str) -> docqa_rag::Result<Vec<f32>> {
        Ok(vec![1.0])
    }

    async fn embed_batch(&self, texts: &[&str]) -> docqa_rag::Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0]; texts.len().saturating_sub(1)])
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "ShortBatch"
    }
}

fn orchestrator(embedder: Arc<dyn Embedder>, answerer: Arc<ScriptedAnswerer>) -> QaOrchestrator {
    QaOrchestrator::builder()
        .config(RagConfig::default())
        .embedder(embedder)
        .answerer(answerer)
        .build()
        .unwrap()
}

/// Exactly `len` characters of distinct words.
fn distinct_text(len: usize) -> String {
    let mut text = String::new();
    let mut i = 0;
    while text.len() < len {
        text.push_str(&format!("token{i} "));
        i += 1;
    }
    text.truncate(len);
    text
}

#[tokio::test]
async fn middle_segment_text_retrieves_middle_segment() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(HashEmbedder::default()), Arc::clone(&answerer));

    let text = distinct_text(1200);
    let report = qa.ingest(&[Document::new("guide", text.clone())]).await;
    assert!(report.is_complete());
    assert_eq!(report.segment_count(), 3);

    let middle = &text[450..950];
    let results = qa.retrieve(middle, 3).await.unwrap();
    assert_eq!(results[0].segment.ordinal, 1);
    assert_eq!((results[0].segment.start_offset, results[0].segment.end_offset), (450, 950));
    assert!(results[0].distance.abs() < 1e-6);
    assert!(results[1].distance > results[0].distance);
}

#[tokio::test]
async fn ask_before_ingest_is_not_ready() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(HashEmbedder::default()), Arc::clone(&answerer));

    assert_eq!(qa.state().await, SessionState::Empty);
    assert!(matches!(qa.ask_with_defaults("anything?").await, Err(RagError::NotReady)));
    assert!(qa.history().await.is_empty());
    assert!(answerer.prompts().is_empty());
}

#[tokio::test]
async fn empty_document_leaves_session_empty() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(HashEmbedder::default()), answerer);

    let report = qa.ingest(&[Document::new("blank", "")]).await;
    assert!(matches!(report.outcomes[0].result, Ok(0)));
    assert_eq!(qa.state().await, SessionState::Empty);
    assert!(matches!(qa.ask_with_defaults("q").await, Err(RagError::NotReady)));
}

#[tokio::test]
async fn successful_ask_records_history_and_sends_grounded_prompt() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(HashEmbedder::default()), Arc::clone(&answerer));

    qa.ingest(&[
        Document::new("ppe", "Hard hats and steel-toe boots are required on site."),
        Document::new("hours", "The site is open from 7am to 5pm on weekdays."),
    ])
    .await;
    assert_eq!(qa.state().await, SessionState::Indexed);

    let answer = qa.ask("What boots are required?", 1, 300).await.unwrap();
    assert_eq!(answer, "answer #1");

    let prompts = answerer.prompts();
    assert_eq!(
        prompts[0],
        "Context:\n- Hard hats and steel-toe boots are required on site.\n\n\
         Question:\nWhat boots are required?"
    );

    let history = qa.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].query, "What boots are required?");
    assert_eq!(history[0].answer, "answer #1");
}

#[tokio::test]
async fn prompt_uses_configured_k_and_segment_limit() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let config = RagConfig::builder()
        .chunk_size(20)
        .chunk_overlap(5)
        .retrieval_k(2)
        .max_chars_per_segment(8)
        .build()
        .unwrap();
    let qa = QaOrchestrator::builder()
        .config(config)
        .embedder(Arc::new(HashEmbedder::new(64)))
        .answerer(Arc::clone(&answerer) as Arc<dyn Answerer>)
        .build()
        .unwrap();

    qa.ingest(&[Document::new("doc", distinct_text(100))]).await;
    qa.ask_with_defaults("token3").await.unwrap();

    let prompt = &answerer.prompts()[0];
    let context = prompt.strip_prefix("Context:\n").unwrap().split("\n\nQuestion:\n").next().unwrap();
    let bullets: Vec<&str> = context.split("\n\n").collect();
    assert_eq!(bullets.len(), 2);
    for bullet in bullets {
        assert!(bullet.starts_with("- "));
        assert!(bullet.ends_with("..."));
        assert_eq!(bullet.chars().count(), 2 + 8 + 3);
    }
}

#[tokio::test]
async fn failed_answer_records_nothing() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(HashEmbedder::default()), Arc::clone(&answerer));
    qa.ingest(&[Document::new("doc", "Fire extinguishers are checked monthly.")]).await;

    qa.ask_with_defaults("How often are extinguishers checked?").await.unwrap();
    assert_eq!(qa.history().await.len(), 1);

    answerer.down.store(true, Ordering::SeqCst);
    let err = qa.ask_with_defaults("Who checks them?").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationUnavailable { .. }));
    assert_eq!(qa.history().await.len(), 1);

    // The session stays usable once the service recovers.
    answerer.down.store(false, Ordering::SeqCst);
    qa.ask_with_defaults("Who checks them?").await.unwrap();
    let history = qa.history().await;
    assert_eq!(history.len(), 2);
    assert!(history[0].recorded_at <= history[1].recorded_at);
}

#[tokio::test]
async fn failing_document_does_not_block_the_batch() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(PickyEmbedder), answerer);

    let report = qa
        .ingest(&[
            Document::new("first", "fine text"),
            Document::new("second", "POISON text"),
            Document::new("third", "WIDE text"),
            Document::new("fourth", "more fine text"),
        ])
        .await;

    let ids: Vec<&str> = report.failures().map(|o| o.document_id.as_str()).collect();
    assert_eq!(ids, vec!["second", "third"]);
    assert!(matches!(report.outcomes[1].result, Err(RagError::EmbeddingUnavailable { .. })));
    assert!(matches!(
        report.outcomes[2].result,
        Err(RagError::DimensionMismatch { expected: 2, actual: 3 })
    ));
    assert_eq!(report.segment_count(), 2);
    assert_eq!(qa.index().len().await, 2);
}

#[tokio::test]
async fn short_embedding_batch_is_reported() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(ShortBatchEmbedder), answerer);

    let report = qa.ingest(&[Document::new("doc", "some text")]).await;
    assert!(matches!(report.outcomes[0].result, Err(RagError::EmbeddingUnavailable { .. })));
    assert_eq!(qa.state().await, SessionState::Empty);
}

#[tokio::test]
async fn ingestion_is_additive_and_reset_empties_the_index() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(HashEmbedder::default()), answerer);

    qa.ingest(&[Document::new("a", "alpha")]).await;
    qa.ingest(&[Document::new("b", "beta")]).await;
    assert_eq!(qa.index().len().await, 2);
    qa.ask_with_defaults("alpha?").await.unwrap();

    qa.reset().await;
    assert_eq!(qa.state().await, SessionState::Empty);
    assert_eq!(qa.history().await.len(), 1);
}

#[tokio::test]
async fn builder_requires_collaborators_and_valid_config() {
    let missing = QaOrchestrator::builder().answerer(Arc::new(ScriptedAnswerer::default())).build();
    assert!(matches!(missing, Err(RagError::InvalidConfig(_))));

    let bad_config = RagConfig { chunk_overlap: 500, ..RagConfig::default() };
    let invalid = QaOrchestrator::builder()
        .config(bad_config)
        .embedder(Arc::new(HashEmbedder::default()))
        .answerer(Arc::new(ScriptedAnswerer::default()))
        .build();
    assert!(matches!(invalid, Err(RagError::InvalidConfig(_))));
}

#[tokio::test]
async fn zero_segment_limit_is_rejected_before_answering() {
    let answerer = Arc::new(ScriptedAnswerer::default());
    let qa = orchestrator(Arc::new(HashEmbedder::default()), Arc::clone(&answerer));
    qa.ingest(&[Document::new("ppe", "Hard hats are required on site.")]).await;

    assert!(matches!(qa.ask("hard hats?", 1, 0).await, Err(RagError::InvalidConfig(_))));
    assert!(qa.history().await.is_empty());
    assert!(answerer.prompts().is_empty());
}

#[tokio::test]
async fn injected_index_must_match_configured_metric() {
    let euclidean: Arc<dyn VectorIndex> =
        Arc::new(InMemoryVectorIndex::with_metric(DistanceMetric::Euclidean));

    let mismatched = QaOrchestrator::builder()
        .config(RagConfig::default())
        .embedder(Arc::new(HashEmbedder::default()))
        .answerer(Arc::new(ScriptedAnswerer::default()))
        .index(Arc::clone(&euclidean))
        .build();
    assert!(matches!(mismatched, Err(RagError::InvalidConfig(ref message)) if message.contains("euclidean")));

    let adopted = QaOrchestrator::builder()
        .embedder(Arc::new(HashEmbedder::default()))
        .answerer(Arc::new(ScriptedAnswerer::default()))
        .index(euclidean)
        .build()
        .unwrap();
    assert_eq!(adopted.config().distance_metric, DistanceMetric::Euclidean);
    assert_eq!(adopted.index().metric(), DistanceMetric::Euclidean);
}
