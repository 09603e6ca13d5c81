//! Shared API and cache data types.

pub mod openai;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::openai::{ChatCompletionRequest, ChatCompletionResponse};

/// A cached chat completion, keyed by the embedding of its request.
///
/// Entries are handed back to callers as owned snapshots; hit accounting
/// mutates only the copy inside the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The original request that produced this response.
    pub request: ChatCompletionRequest,

    /// The upstream response being cached.
    pub response: ChatCompletionResponse,

    /// The embedding the entry was admitted under.
    pub embedding: Vec<f64>,

    /// When the entry was admitted.
    pub created_at: DateTime<Utc>,

    /// When the entry stops being served. Must be after `created_at`.
    pub expires_at: DateTime<Utc>,

    /// Number of cache hits served from this entry.
    pub hit_count: u64,

    /// Last time this entry was served (or admitted, before any hit).
    pub last_hit_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry has passed its expiry at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
