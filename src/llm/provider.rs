use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Seam over the language-model service. Covers the two operations the
/// RAG pipeline needs: prompt completion and embedding generation.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// text completion for a fully rendered prompt (non-streaming)
    async fn generate(&self, prompt: &str, model_id: &str) -> Result<String, ApiError>;

    /// generate embeddings
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}
