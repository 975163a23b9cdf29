//! Construction of embedding and chat providers from flags and environment.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::ValueEnum;
use docqa_rag::onnx::DEFAULT_MODEL;
use docqa_rag::{
    Answerer, ChatCompletionsAnswerer, Embedder, HashEmbedder, OnnxEmbedder, OpenAIEmbedder,
    RagError, WithTimeout,
};
use tracing::info;

/// Which embedder to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EmbedderKind {
    /// Offline feature-hashing embedder
    #[default]
    Hash,
    /// OpenAI embeddings API (`OPENAI_API_KEY`)
    Openai,
    /// Local all-MiniLM-L6-v2 through ONNX Runtime, downloaded into `--model-dir` on first use
    Onnx,
}

/// Construct the embedder selected by `kind`. Remote and model-backed
/// embedders are wrapped in `timeout`.
pub async fn build_embedder(
    kind: EmbedderKind,
    model_dir: &Path,
    timeout: Duration,
) -> docqa_rag::Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match kind {
        EmbedderKind::Hash => Arc::new(HashEmbedder::default()),
        EmbedderKind::Openai => Arc::new(WithTimeout::new(OpenAIEmbedder::from_env()?, timeout)),
        EmbedderKind::Onnx => {
            let onnx = OnnxEmbedder::from_pretrained(DEFAULT_MODEL, model_dir).await?;
            Arc::new(WithTimeout::new(onnx, timeout))
        }
    };
    info!(embedder = embedder.name(), dimensions = embedder.dimensions(), "embedder ready");
    Ok(embedder)
}

/// Export the variables in a dotenv file, keeping any already set.
pub fn load_env_file(path: &Path) -> anyhow::Result<()> {
    dotenvy::from_path(path).with_context(|| format!("failed to load '{}'", path.display()))?;
    info!(path = %path.display(), "environment file loaded");
    Ok(())
}

/// Azure OpenAI when `AZURE_OPENAI_KEY` is set, plain OpenAI otherwise.
pub fn answerer_from_env(timeout: Duration) -> docqa_rag::Result<Arc<dyn Answerer>> {
    let answerer = if std::env::var_os("AZURE_OPENAI_KEY").is_some() {
        ChatCompletionsAnswerer::azure_from_env()?
    } else {
        ChatCompletionsAnswerer::openai_from_env()?
    };
    info!(answerer = answerer.name(), "answerer ready");
    Ok(Arc::new(WithTimeout::new(answerer, timeout)))
}

/// Answerer for commands that never generate; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnswerer;

#[async_trait]
impl Answerer for NoAnswerer {
    async fn generate(&self, _prompt: &str) -> docqa_rag::Result<String> {
        Err(RagError::GenerationUnavailable {
            provider: self.name().to_string(),
            message: "no chat provider configured".to_string(),
        })
    }

    fn name(&self) -> &str {
        "none"
    }
}
