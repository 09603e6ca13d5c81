//! Ollama embeddings API client.
//!
//! Ollama's embeddings endpoint takes one prompt per call, so batches are
//! embedded sequentially with positional mapping.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Embedder, EmbeddingError};

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    embedding: Vec<f64>,
}

/// Configuration for [`OllamaEmbedder`]. Empty fields take defaults.
#[derive(Debug, Clone, Default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

/// Generates embeddings via a local or remote Ollama server.
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    dimensions: usize,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn new(mut cfg: OllamaConfig) -> Self {
        if cfg.base_url.is_empty() {
            cfg.base_url = "http://localhost:11434".to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = "nomic-embed-text".to_string();
        }
        let timeout = cfg.timeout.unwrap_or(Duration::from_secs(30));

        let dimensions = match cfg.model.as_str() {
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            _ => 768, // nomic-embed-text and unknown models
        };

        Self {
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
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&OllamaRequest { model: &self.model, prompt: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("status {status}: {body}")));
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Api(format!("failed to parse response: {e}")))?;

        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::Empty);
        }

        Ok(parsed.embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_defaults() {
        let embedder = OllamaEmbedder::new(OllamaConfig::default());
        assert_eq!(embedder.base_url, "http://localhost:11434");
        assert_eq!(embedder.model(), "nomic-embed-text");
        assert_eq!(embedder.dimensions(), 768);
    }

    #[test]
    fn test_model_dimensions() {
        let cases = [
            ("nomic-embed-text", 768),
            ("mxbai-embed-large", 1024),
            ("all-minilm", 384),
            ("unknown-model", 768),
        ];
        for (model, dimensions) in cases {
            let embedder = OllamaEmbedder::new(OllamaConfig {
                model: model.to_string(),
                ..Default::default()
            });
            assert_eq!(embedder.dimensions(), dimensions, "model {model}");
        }
    }

    #[tokio::test]
    async fn test_embed() {
        let app = Router::new().route(
            "/api/embeddings",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["model"], "nomic-embed-text");
                assert_eq!(body["prompt"], "test text");
                Json(serde_json::json!({ "embedding": [0.1, 0.2, 0.3, 0.4, 0.5] }))
            }),
        );
        let base_url = serve(app).await;

        let embedder = OllamaEmbedder::new(OllamaConfig { base_url, ..Default::default() });
        let embedding = embedder.embed("test text").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3, 0.4, 0.5]);
    }

    #[tokio::test]
    async fn test_embed_batch_sequential() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/api/embeddings",
            post(move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Json(serde_json::json!({ "embedding": [n as f64, 0.2, 0.3] }))
                }
            }),
        );
        let base_url = serve(app).await;

        let embedder = OllamaEmbedder::new(OllamaConfig { base_url, ..Default::default() });
        let texts = vec!["text1".to_string(), "text2".to_string(), "text3".to_string()];
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        for (i, embedding) in embeddings.iter().enumerate() {
            assert_eq!(embedding[0], (i + 1) as f64);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_embedding_is_error() {
        let app = Router::new().route(
            "/api/embeddings",
            post(|| async { Json(serde_json::json!({ "embedding": [] })) }),
        );
        let base_url = serve(app).await;

        let embedder = OllamaEmbedder::new(OllamaConfig { base_url, ..Default::default() });
        let err = embedder.embed("test").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Empty));
    }

    #[tokio::test]
    async fn test_server_error() {
        let app = Router::new().route(
            "/api/embeddings",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "internal error") }),
        );
        let base_url = serve(app).await;

        let embedder = OllamaEmbedder::new(OllamaConfig { base_url, ..Default::default() });
        let err = embedder.embed("test").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Api(_)));
    }

    #[tokio::test]
    async fn test_connection_error() {
        let embedder = OllamaEmbedder::new(OllamaConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let err = embedder.embed("test").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Transport(_)));
    }
}
