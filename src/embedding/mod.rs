//! Embedding providers.
//!
//! The pipeline depends only on the [`Embedder`] trait; the concrete
//! provider is chosen once at startup from configuration.

mod ollama;
mod openai;

pub use ollama::{OllamaConfig, OllamaEmbedder};
pub use openai::{OpenAiConfig, OpenAiEmbedder};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, PROVIDER_OPENAI};

/// Error type for embedding operations.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The provider could not be reached or the request failed in transit.
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with an error or an unparseable payload.
    #[error("embedding API error: {0}")]
    Api(String),

    /// The provider answered successfully but returned no embedding.
    #[error("no embedding returned")]
    Empty,
}

/// A capability that turns text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError>;

    /// Generate embeddings for multiple texts, one vector per input in
    /// order. An empty input succeeds with an empty result.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError>;

    /// Dimensionality of the vectors this embedder produces.
    fn dimensions(&self) -> usize;

    /// Model name used for embeddings.
    fn model(&self) -> &str;
}

/// Build the embedder selected by the configuration.
///
/// Assumes the configuration has been validated; an unknown provider
/// falls back to Ollama.
pub fn from_config(cfg: &Config) -> Arc<dyn Embedder> {
    if cfg.embedding_provider == PROVIDER_OPENAI {
        let embedder = OpenAiEmbedder::new(OpenAiConfig {
            api_key: cfg.openai_api_key.clone(),
            base_url: cfg.openai_base_url.clone(),
            model: cfg.embedding_model.clone(),
            ..Default::default()
        });
        tracing::info!(
            model = embedder.model(),
            dimensions = embedder.dimensions(),
            "initialized OpenAI embedder"
        );
        Arc::new(embedder)
    } else {
        let embedder = OllamaEmbedder::new(OllamaConfig {
            base_url: cfg.ollama_base_url.clone(),
            model: cfg.embedding_model.clone(),
            ..Default::default()
        });
        tracing::info!(
            base_url = %cfg.ollama_base_url,
            model = embedder.model(),
            dimensions = embedder.dimensions(),
            "initialized Ollama embedder"
        );
        Arc::new(embedder)
    }
}
