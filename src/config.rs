//! Application configuration, loaded from the environment.

use std::time::Duration;

/// Embedding provider selector.
pub const PROVIDER_OLLAMA: &str = "ollama";
/// Embedding provider selector.
pub const PROVIDER_OPENAI: &str = "openai";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,

    /// Host to bind.
    pub host: String,

    /// Emit logs as JSON instead of text.
    pub log_json: bool,

    /// Embedding provider: "openai" or "ollama".
    pub embedding_provider: String,

    /// Model name passed to the embedder.
    pub embedding_model: String,

    /// OpenAI API key, used for the embedder and injected upstream when
    /// the client supplied no Authorization header.
    pub openai_api_key: String,

    /// Upstream base URL (also the OpenAI embedder endpoint).
    pub openai_base_url: String,

    /// Ollama endpoint (when the provider is "ollama").
    pub ollama_base_url: String,

    /// Minimum cosine similarity for a cache hit, in [0, 1].
    pub similarity_threshold: f64,

    /// Cache entry lifetime.
    pub cache_ttl: Duration,

    /// Maximum number of cache entries.
    pub max_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            log_json: false,
            // Default to free local embeddings.
            embedding_provider: PROVIDER_OLLAMA.to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            openai_api_key: String::new(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            similarity_threshold: 0.95,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            max_cache_size: 10_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(port) = env_parse("KALLM_PORT") {
            cfg.port = port;
        }
        if let Ok(host) = std::env::var("KALLM_HOST") {
            if !host.is_empty() {
                cfg.host = host;
            }
        }
        cfg.log_json = env_bool("KALLM_LOG_JSON");

        let explicit_provider = std::env::var("KALLM_EMBEDDING_PROVIDER").ok();
        if let Some(provider) = &explicit_provider {
            if !provider.is_empty() {
                cfg.embedding_provider = provider.clone();
            }
        }
        let explicit_model = std::env::var("KALLM_EMBEDDING_MODEL").ok();
        if let Some(model) = &explicit_model {
            if !model.is_empty() {
                cfg.embedding_model = model.clone();
            }
        }

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.is_empty() {
                cfg.openai_api_key = api_key;
                // Auto-switch to OpenAI when a key is provided and the
                // provider was not explicitly chosen.
                if explicit_provider.as_deref().unwrap_or("").is_empty() {
                    cfg.embedding_provider = PROVIDER_OPENAI.to_string();
                    if explicit_model.as_deref().unwrap_or("").is_empty() {
                        cfg.embedding_model = "text-embedding-3-small".to_string();
                    }
                }
            }
        }

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.is_empty() {
                cfg.openai_base_url = base_url;
            }
        }
        if let Ok(ollama_url) = std::env::var("OLLAMA_BASE_URL") {
            if !ollama_url.is_empty() {
                cfg.ollama_base_url = ollama_url;
            }
        }

        if let Some(threshold) = env_parse("KALLM_SIMILARITY_THRESHOLD") {
            cfg.similarity_threshold = threshold;
        }
        if let Some(secs) = env_parse::<u64>("KALLM_CACHE_TTL_SECS") {
            cfg.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(size) = env_parse("KALLM_MAX_CACHE_SIZE") {
            cfg.max_cache_size = size;
        }

        cfg
    }

    /// Validate the configuration. A failure here is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_provider != PROVIDER_OPENAI
            && self.embedding_provider != PROVIDER_OLLAMA
        {
            return Err(ConfigError {
                field: "KALLM_EMBEDDING_PROVIDER",
                message: "must be 'openai' or 'ollama'".to_string(),
            });
        }
        if self.embedding_provider == PROVIDER_OPENAI && self.openai_api_key.is_empty() {
            return Err(ConfigError {
                field: "OPENAI_API_KEY",
                message: "required when using the OpenAI provider".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError {
                field: "KALLM_SIMILARITY_THRESHOLD",
                message: "must be between 0 and 1".to_string(),
            });
        }
        if self.max_cache_size < 1 {
            return Err(ConfigError {
                field: "KALLM_MAX_CACHE_SIZE",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// A configuration validation error.
#[derive(Debug, thiserror::Error)]
#[error("config error: {field} {message}")]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.embedding_provider, PROVIDER_OLLAMA);
        assert_eq!(cfg.embedding_model, "nomic-embed-text");
        assert_eq!(cfg.openai_base_url, "https://api.openai.com/v1");
        assert!((cfg.similarity_threshold - 0.95).abs() < f64::EPSILON);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.max_cache_size, 10_000);
        assert!(!cfg.log_json);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let cfg = Config {
            embedding_provider: "cohere".to_string(),
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.field, "KALLM_EMBEDDING_PROVIDER");
    }

    #[test]
    fn test_validate_requires_openai_key() {
        let cfg = Config {
            embedding_provider: PROVIDER_OPENAI.to_string(),
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.field, "OPENAI_API_KEY");

        let cfg = Config {
            embedding_provider: PROVIDER_OPENAI.to_string(),
            openai_api_key: "sk-test".to_string(),
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_threshold_bounds() {
        for bad in [-0.1, 1.1] {
            let cfg = Config {
                similarity_threshold: bad,
                ..Config::default()
            };
            assert!(cfg.validate().is_err(), "threshold {bad} should be rejected");
        }
        for ok in [0.0, 0.5, 1.0] {
            let cfg = Config {
                similarity_threshold: ok,
                ..Config::default()
            };
            assert!(cfg.validate().is_ok(), "threshold {ok} should be accepted");
        }
    }

    #[test]
    fn test_validate_cache_size() {
        let cfg = Config {
            max_cache_size: 0,
            ..Config::default()
        };
        assert_eq!(cfg.validate().unwrap_err().field, "KALLM_MAX_CACHE_SIZE");
    }
}
