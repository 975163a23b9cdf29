//! Configuration for chunking, retrieval, and context assembly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;
use crate::error::{RagError, Result};

/// Configuration parameters for the question-answering pipeline.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// chunk_size = 800
/// distance_metric = "euclidean"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum segment size in characters.
    pub chunk_size: usize,
    /// Number of characters shared by consecutive segments.
    pub chunk_overlap: usize,
    /// Number of segments retrieved per question.
    pub retrieval_k: usize,
    /// Per-segment character limit inside the prompt context.
    pub max_chars_per_segment: usize,
    /// Metric used to rank stored segments.
    pub distance_metric: DistanceMetric,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            retrieval_k: 3,
            max_chars_per_segment: 300,
            distance_metric: DistanceMetric::Cosine,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `retrieval_k == 0`
    /// - `max_chars_per_segment == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfig("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.retrieval_k == 0 {
            return Err(RagError::InvalidConfig(
                "retrieval_k must be greater than zero".to_string(),
            ));
        }
        if self.max_chars_per_segment == 0 {
            return Err(RagError::InvalidConfig(
                "max_chars_per_segment must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| RagError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if the file cannot be read, parsed,
    /// or validated.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RagError::InvalidConfig(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn from_config(config: RagConfig) -> Self {
        Self { config }
    }

    /// Set the maximum segment size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive segments in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of segments retrieved per question.
    pub fn retrieval_k(mut self, k: usize) -> Self {
        self.config.retrieval_k = k;
        self
    }

    /// Set the per-segment character limit in the prompt context.
    pub fn max_chars_per_segment(mut self, max_chars: usize) -> Self {
        self.config.max_chars_per_segment = max_chars;
        self
    }

    /// Set the distance metric.
    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.config.distance_metric = metric;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
