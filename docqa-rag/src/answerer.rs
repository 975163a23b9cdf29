//! Answerer trait for the external text-generation service.

use async_trait::async_trait;

use crate::error::Result;

/// A service that turns a grounded prompt into an answer.
///
/// Failures surface as
/// [`RagError::GenerationUnavailable`](crate::RagError::GenerationUnavailable).
/// Retries, if any, belong inside the implementation.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Generate an answer for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str;
}
