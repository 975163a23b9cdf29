//! Local sentence embeddings from an ONNX export of `all-MiniLM-L6-v2`.
//!
//! [`OnnxEmbedder`] runs a sentence-transformers model with ONNX Runtime:
//! texts are tokenized, passed through the model, mean-pooled over the
//! attention mask and L2-normalized. Inference is CPU-bound, so it runs on
//! tokio's blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, error, info};

use crate::embedding::Embedder;
use crate::error::{RagError, Result};

const PROVIDER: &str = "Onnx";

/// The sentence-transformers model used when none is named.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Output width of `all-MiniLM-L6-v2`.
pub const MINILM_DIMENSIONS: usize = 384;

const DEFAULT_MAX_LENGTH: usize = 256;
const DEFAULT_BATCH_SIZE: usize = 32;
const INTRA_THREADS: usize = 4;

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

struct OnnxModel {
    session: Session,
    tokenizer: Tokenizer,
}

/// An [`Embedder`] backed by a local ONNX sentence-transformer.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::onnx::{DEFAULT_MODEL, OnnxEmbedder};
///
/// let embedder = OnnxEmbedder::from_pretrained(DEFAULT_MODEL, "models/minilm").await?;
/// let vector = embedder.embed("Hard hats are required.").await?;
/// assert_eq!(vector.len(), 384);
/// ```
pub struct OnnxEmbedder {
    model: Arc<Mutex<OnnxModel>>,
    dimensions: usize,
    max_length: usize,
    batch_size: usize,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingUnavailable`] if either file is missing or
    /// cannot be loaded.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let model_path = dir.join(MODEL_FILE);
        let tokenizer_path = dir.join(TOKENIZER_FILE);

        for path in [&model_path, &tokenizer_path] {
            if !path.is_file() {
                return Err(RagError::embedding(
                    PROVIDER,
                    format!("model file not found: {}", path.display()),
                ));
            }
        }

        let session = Session::builder()
            .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|builder| builder.with_intra_threads(INTRA_THREADS))
            .and_then(|builder| builder.commit_from_file(&model_path))
            .map_err(|e| {
                error!(path = %model_path.display(), error = %e, "failed to load ONNX model");
                RagError::embedding(PROVIDER, format!("failed to load model: {e}"))
            })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            error!(path = %tokenizer_path.display(), error = %e, "failed to load tokenizer");
            RagError::embedding(PROVIDER, format!("failed to load tokenizer: {e}"))
        })?;

        info!(dir = %dir.display(), "ONNX embedder initialized");
        Ok(Self {
            model: Arc::new(Mutex::new(OnnxModel { session, tokenizer })),
            dimensions: MINILM_DIMENSIONS,
            max_length: DEFAULT_MAX_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Download a sentence-transformers model from Hugging Face into
    /// `cache_dir` unless already present, then load it.
    pub async fn from_pretrained(model: &str, cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        std::fs::create_dir_all(cache_dir).map_err(|e| {
            RagError::embedding(
                PROVIDER,
                format!("failed to create cache directory '{}': {e}", cache_dir.display()),
            )
        })?;

        for (remote, local) in [("onnx/model.onnx", MODEL_FILE), ("tokenizer.json", TOKENIZER_FILE)]
        {
            let path = cache_dir.join(local);
            if !path.exists() {
                download(model, remote, &path).await?;
            }
        }

        Self::from_dir(cache_dir)
    }

    /// Declare a different output width, for models other than MiniLM.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Truncate inputs to at most `max_length` tokens.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length.max(1);
        self
    }

    /// Run inference over at most `batch_size` texts at a time.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

async fn download(model: &str, remote: &str, path: &Path) -> Result<()> {
    let url = format!("https://huggingface.co/sentence-transformers/{model}/resolve/main/{remote}");
    info!(%url, "downloading model file");

    let response = reqwest::get(&url)
        .await
        .map_err(|e| RagError::embedding(PROVIDER, format!("failed to download {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(RagError::embedding(
            PROVIDER,
            format!("download of {url} failed: HTTP {}", response.status()),
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| RagError::embedding(PROVIDER, format!("failed to read {url}: {e}")))?;
    std::fs::write(path, &bytes).map_err(|e| {
        RagError::embedding(PROVIDER, format!("failed to save '{}': {e}", path.display()))
    })?;

    info!(path = %path.display(), bytes = bytes.len(), "model file downloaded");
    Ok(())
}

impl OnnxModel {
    fn infer(&mut self, texts: &[String], max_length: usize, dimensions: usize) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| RagError::embedding(PROVIDER, format!("tokenization failed: {e}")))?;

        let batch = texts.len();
        let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0).min(max_length);
        if seq_len == 0 {
            return Ok(vec![vec![0.0; dimensions]; batch]);
        }

        let mut input_ids = vec![0i64; batch * seq_len];
        let mut attention_mask = vec![0i64; batch * seq_len];
        let mut token_type_ids = vec![0i64; batch * seq_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();
            for col in 0..ids.len().min(seq_len) {
                let at = row * seq_len + col;
                input_ids[at] = i64::from(ids[col]);
                attention_mask[at] = i64::from(mask[col]);
                token_type_ids[at] = i64::from(types[col]);
            }
        }

        let tensor = |name: &str, data: Vec<i64>| {
            Tensor::from_array((vec![batch, seq_len], data.into_boxed_slice())).map_err(|e| {
                RagError::embedding(PROVIDER, format!("failed to build {name} tensor: {e}"))
            })
        };
        let inputs = vec![
            ("input_ids", tensor("input_ids", input_ids)?.into_dyn()),
            ("attention_mask", tensor("attention_mask", attention_mask.clone())?.into_dyn()),
            ("token_type_ids", tensor("token_type_ids", token_type_ids)?.into_dyn()),
        ];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| RagError::embedding(PROVIDER, format!("inference failed: {e}")))?;

        let named: Vec<_> = outputs.iter().collect();
        let (_, hidden_states) = named
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| named.first())
            .ok_or_else(|| RagError::embedding(PROVIDER, "model produced no output"))?;
        let (shape, states) = hidden_states
            .try_extract_tensor::<f32>()
            .map_err(|e| RagError::embedding(PROVIDER, format!("unexpected output tensor: {e}")))?;

        let hidden = shape.get(2).map_or(0, |&d| d as usize);
        if hidden != dimensions {
            return Err(RagError::DimensionMismatch { expected: dimensions, actual: hidden });
        }

        Ok(mean_pool(states, &attention_mask, batch, seq_len, hidden))
    }
}

/// Average token states where the attention mask is set, then L2-normalize
/// each row. `states` is laid out as `[batch, seq_len, hidden]`.
fn mean_pool(states: &[f32], mask: &[i64], batch: usize, seq_len: usize, hidden: usize) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|row| {
            let mut pooled = vec![0.0f32; hidden];
            let mut count = 0.0f32;
            for col in 0..seq_len {
                if mask[row * seq_len + col] == 0 {
                    continue;
                }
                let offset = (row * seq_len + col) * hidden;
                for (acc, value) in pooled.iter_mut().zip(&states[offset..offset + hidden]) {
                    *acc += value;
                }
                count += 1.0;
            }

            if count > 0.0 {
                pooled.iter_mut().for_each(|x| *x /= count);
            }
            let norm = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                pooled.iter_mut().for_each(|x| *x /= norm);
            }
            pooled
        })
        .collect()
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "empty embedding result"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(embedder = PROVIDER, batch_size = texts.len(), "embedding batch");

        let model = Arc::clone(&self.model);
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let (max_length, dimensions, batch_size) = (self.max_length, self.dimensions, self.batch_size);

        tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
            let mut model = model
                .lock()
                .map_err(|_| RagError::embedding(PROVIDER, "model lock poisoned"))?;
            let mut vectors = Vec::with_capacity(texts.len());
            for chunk in texts.chunks(batch_size) {
                vectors.extend(model.infer(chunk, max_length, dimensions)?);
            }
            Ok(vectors)
        })
        .await
        .map_err(|e| RagError::embedding(PROVIDER, format!("inference task failed: {e}")))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
