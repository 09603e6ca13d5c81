//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{MemoryCache, Options};
use crate::config::Config;
use crate::embedding::Embedder;
use crate::reports::Collector;

/// Shared state: the cache, the embedder, the metrics collector, and the
/// upstream HTTP client.
pub struct AppState {
    /// Configuration.
    pub config: Config,

    /// Semantic response cache.
    pub cache: Arc<MemoryCache>,

    /// Embedding provider, chosen at startup.
    pub embedder: Arc<dyn Embedder>,

    /// Metrics collector backing /reports.
    pub collector: Collector,

    /// HTTP client for upstream forwarding.
    pub upstream: reqwest::Client,
}

impl AppState {
    /// Create application state with the given embedder.
    pub fn new(config: Config, embedder: Arc<dyn Embedder>) -> Self {
        let cache = MemoryCache::new(Options {
            max_size: config.max_cache_size,
            default_ttl: config.cache_ttl,
            similarity_threshold: config.similarity_threshold,
            ..Options::default()
        });

        Self {
            config,
            cache,
            embedder,
            collector: Collector::new(),
            upstream: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}
