//! OpenAI embeddings API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Embedder, EmbeddingError};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Configuration for [`OpenAiEmbedder`]. Empty fields take defaults.
#[derive(Debug, Clone, Default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

/// Generates embeddings via the OpenAI embeddings API, batching inputs
/// into a single request.
pub struct OpenAiEmbedder {
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(mut cfg: OpenAiConfig) -> Self {
        if cfg.base_url.is_empty() {
            cfg.base_url = "https://api.openai.com/v1".to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = "text-embedding-3-small".to_string();
        }
        let timeout = cfg.timeout.unwrap_or(Duration::from_secs(30));

        let dimensions = match cfg.model.as_str() {
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536, // text-embedding-3-small
        };

        Self {
            api_key: cfg.api_key,
            base_url: cfg.base_url,
            model: cfg.model,
            dimensions,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings.into_iter().next().ok_or(EmbeddingError::Empty)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { input: texts, model: &self.model })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("status {status}"));
            return Err(EmbeddingError::Api(message));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Api(format!("failed to parse response: {e}")))?;

        // Providers may return data out of order; place by index.
        let mut result = vec![Vec::new(); parsed.data.len()];
        for item in parsed.data {
            match result.get_mut(item.index) {
                Some(slot) => *slot = item.embedding,
                None => {
                    return Err(EmbeddingError::Api(format!(
                        "embedding index {} out of range",
                        item.index
                    )))
                }
            }
        }

        Ok(result)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}
