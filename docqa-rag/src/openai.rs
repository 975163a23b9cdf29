//! OpenAI and Azure OpenAI providers over their REST APIs.
//!
//! This module is only available when the `openai` feature is enabled. It
//! provides [`OpenAIEmbedder`] for the embeddings endpoint and
//! [`ChatCompletionsAnswerer`] for chat completions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::answerer::Answerer;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// The default model for OpenAI embeddings.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// System instruction sent ahead of every prompt.
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Sampling temperature for answers.
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Upper bound on generated answer length.
const DEFAULT_MAX_TOKENS: u32 = 500;

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-success response into its most useful error text.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`Embedder`] backed by the OpenAI embeddings API.
///
/// # Configuration
///
/// - `model` – defaults to `text-embedding-3-small`.
/// - `dimensions` – optional Matryoshka dimension override.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIEmbedder;
///
/// let embedder = OpenAIEmbedder::new("sk-...")?;
/// let embedding = embedder.embed("hello world").await?;
/// ```
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbedder {
    /// Create a new embedder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::embedding("OpenAI", "API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_BASE_URL.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create a new embedder using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::embedding("OpenAI", "OPENAI_API_KEY environment variable not set")
        })?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at an OpenAI-compatible server instead of api.openai.com.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the output dimensions (Matryoshka support).
    ///
    /// This also updates the value returned by [`dimensions()`](Embedder::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(embedder = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("OpenAI", "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(embedder = "OpenAI", batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(embedder = "OpenAI", error = %e, "request failed");
                RagError::embedding("OpenAI", format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(embedder = "OpenAI", %message, "API error");
            return Err(RagError::embedding("OpenAI", message));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(embedder = "OpenAI", error = %e, "failed to parse response");
            RagError::embedding("OpenAI", format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(RagError::embedding(
                "OpenAI",
                format!("expected {} embeddings, got {}", texts.len(), parsed.data.len()),
            ));
        }

        // The API documents `index` as the input position; do not rely on array order.
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// Where a [`ChatCompletionsAnswerer`] sends its requests.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEndpoint {
    /// api.openai.com or a compatible server, authenticated with a bearer token.
    OpenAI {
        /// API base URL, e.g. `https://api.openai.com/v1`.
        base_url: String,
        /// Model name sent in the request body.
        model: String,
    },
    /// An Azure OpenAI deployment, authenticated with an `api-key` header.
    Azure {
        /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
        endpoint: String,
        /// Deployment name.
        deployment: String,
        /// REST API version, e.g. `2024-02-01`.
        api_version: String,
    },
}

impl ChatEndpoint {
    fn url(&self) -> String {
        match self {
            Self::OpenAI { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
            Self::Azure { endpoint, deployment, api_version } => format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
                endpoint.trim_end_matches('/')
            ),
        }
    }

    fn model(&self) -> Option<&str> {
        match self {
            Self::OpenAI { model, .. } => Some(model),
            Self::Azure { .. } => None,
        }
    }

    fn provider(&self) -> &'static str {
        match self {
            Self::OpenAI { .. } => "OpenAI",
            Self::Azure { .. } => "AzureOpenAI",
        }
    }
}

/// An [`Answerer`] that posts the prompt as a single user message to a
/// chat-completions endpoint, after a fixed helpful-assistant system message.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::ChatCompletionsAnswerer;
///
/// let answerer = ChatCompletionsAnswerer::azure_from_env()?;
/// let answer = answerer.generate("Context:\n- ...\n\nQuestion:\nWhy?").await?;
/// ```
pub struct ChatCompletionsAnswerer {
    client: reqwest::Client,
    api_key: String,
    endpoint: ChatEndpoint,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsAnswerer {
    /// Create an answerer for the given endpoint.
    pub fn new(api_key: impl Into<String>, endpoint: ChatEndpoint) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::generation(endpoint.provider(), "API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Create an OpenAI answerer for `model`.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new(
            api_key,
            ChatEndpoint::OpenAI { base_url: OPENAI_BASE_URL.into(), model: model.into() },
        )
    }

    /// Create an OpenAI answerer from `OPENAI_API_KEY` and, optionally,
    /// `OPENAI_MODEL` (default `gpt-4o-mini`) and `OPENAI_BASE_URL`.
    pub fn openai_from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::generation("OpenAI", "OPENAI_API_KEY environment variable not set")
        })?;
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_BASE_URL.into());
        Self::new(api_key, ChatEndpoint::OpenAI { base_url, model })
    }

    /// Create an Azure OpenAI answerer from `AZURE_OPENAI_KEY`,
    /// `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_DEPLOYMENT`, and
    /// `AZURE_OPENAI_API_VERSION`.
    pub fn azure_from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| {
                RagError::generation("AzureOpenAI", format!("{name} environment variable not set"))
            })
        };
        let endpoint = ChatEndpoint::Azure {
            endpoint: var("AZURE_OPENAI_ENDPOINT")?,
            deployment: var("AZURE_OPENAI_DEPLOYMENT")?,
            api_version: var("AZURE_OPENAI_API_VERSION")?,
        };
        Self::new(var("AZURE_OPENAI_KEY")?, endpoint)
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl Answerer for ChatCompletionsAnswerer {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let provider = self.endpoint.provider();
        debug!(answerer = provider, prompt_len = prompt.len(), "requesting chat completion");

        let request_body = ChatRequest {
            model: self.endpoint.model(),
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let request = self.client.post(self.endpoint.url()).json(&request_body);
        let request = match &self.endpoint {
            ChatEndpoint::OpenAI { .. } => request.bearer_auth(&self.api_key),
            ChatEndpoint::Azure { .. } => request.header("api-key", &self.api_key),
        };

        let response = request.send().await.map_err(|e| {
            error!(answerer = provider, error = %e, "request failed");
            RagError::generation(provider, format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(answerer = provider, %message, "API error");
            return Err(RagError::generation(provider, message));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(answerer = provider, error = %e, "failed to parse response");
            RagError::generation(provider, format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::generation(provider, "API returned no answer"))
    }

    fn name(&self) -> &str {
        self.endpoint.provider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azure_url_includes_deployment_and_version() {
        let endpoint = ChatEndpoint::Azure {
            endpoint: "https://res.openai.azure.com/".into(),
            deployment: "gpt4".into(),
            api_version: "2024-02-01".into(),
        };
        assert_eq!(
            endpoint.url(),
            "https://res.openai.azure.com/openai/deployments/gpt4/chat/completions?api-version=2024-02-01"
        );
        assert_eq!(endpoint.model(), None);
    }

    #[test]
    fn openai_url_appends_chat_path() {
        let endpoint = ChatEndpoint::OpenAI {
            base_url: "http://localhost:8080/v1/".into(),
            model: "local".into(),
        };
        assert_eq!(endpoint.url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(endpoint.model(), Some("local"));
    }

    #[test]
    fn empty_api_keys_are_rejected() {
        assert!(matches!(
            OpenAIEmbedder::new(""),
            Err(RagError::EmbeddingUnavailable { .. })
        ));
        assert!(matches!(
            ChatCompletionsAnswerer::openai("", "gpt-4o-mini"),
            Err(RagError::GenerationUnavailable { .. })
        ));
    }
}
