//! In-memory semantic cache with TTL expiry and capacity eviction.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use xxhash_rust::xxh3::xxh3_64;

use super::PRICE_PER_TOKEN_USD;
use crate::types::CacheEntry;
use crate::vector::cosine;

/// Cache construction options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum number of entries before eviction kicks in.
    pub max_size: usize,

    /// Default entry lifetime (informational; entries carry their own
    /// `expires_at`).
    pub default_ttl: Duration,

    /// How often the background sweeper removes expired entries.
    /// Zero disables the sweeper.
    pub cleanup_interval: Duration,

    /// Similarity threshold the owning pipeline will pass to lookups.
    pub similarity_threshold: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            default_ttl: Duration::from_secs(24 * 60 * 60),
            cleanup_interval: Duration::from_secs(5 * 60),
            similarity_threshold: 0.95,
        }
    }
}

/// Errors from cache mutations. Only structurally invalid input fails.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache entry has an empty embedding")]
    EmptyEmbedding,
}

/// Snapshot of cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    /// Fraction in [0, 1]; 0 when no lookups have happened.
    pub hit_rate: f64,
    pub estimated_saved_usd: f64,
}

#[derive(Default)]
struct Store {
    entries: HashMap<u64, CacheEntry>,
    total_hits: u64,
    total_misses: u64,
    saved_usd: f64,
}

/// In-memory semantic cache.
///
/// Lookups scan all live entries under the read lock and escalate to a
/// brief write-lock acquisition for hit/miss accounting, so concurrent
/// readers are never blocked for longer than a counter update. Entries
/// are returned as owned snapshots.
pub struct MemoryCache {
    store: RwLock<Store>,
    opts: Options,
    sweeper: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl MemoryCache {
    /// Create a cache and launch its background sweeper.
    ///
    /// The sweeper holds only a weak reference, so dropping the last
    /// `Arc` stops it; [`MemoryCache::shutdown`] stops it explicitly.
    pub fn new(opts: Options) -> Arc<Self> {
        let cache = Arc::new(Self {
            store: RwLock::new(Store::default()),
            opts,
            sweeper: parking_lot::Mutex::new(None),
        });

        if !cache.opts.cleanup_interval.is_zero() {
            let handle = tokio::spawn(Self::sweep_loop(
                Arc::downgrade(&cache),
                cache.opts.cleanup_interval,
            ));
            *cache.sweeper.lock() = Some(handle);
        }

        cache
    }

    async fn sweep_loop(cache: Weak<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh cache
        // is not swept at construction.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(cache) = cache.upgrade() else { break };
            let removed = cache.cleanup().await;
            if removed > 0 {
                tracing::debug!(removed, "sweeper removed expired cache entries");
            }
        }
    }

    /// Stop the background sweeper.
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }

    /// Stable identifier for an embedding, so admitting the same exact
    /// vector twice replaces instead of duplicating.
    fn entry_id(embedding: &[f64]) -> u64 {
        let mut bytes = Vec::with_capacity(embedding.len() * 8);
        for value in embedding {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        xxh3_64(&bytes)
    }

    /// Admit or replace an entry.
    ///
    /// When the store is at capacity and the entry is new, the entry with
    /// the smallest `last_hit_at` is evicted first (ties broken by the
    /// smallest identifier). Updates to an existing identifier never
    /// evict.
    pub async fn set(&self, entry: CacheEntry) -> Result<(), CacheError> {
        if entry.embedding.is_empty() {
            return Err(CacheError::EmptyEmbedding);
        }

        let id = Self::entry_id(&entry.embedding);
        let mut store = self.store.write().await;

        if !store.entries.contains_key(&id) && store.entries.len() >= self.opts.max_size {
            let victim = store
                .entries
                .iter()
                .min_by_key(|(vid, v)| (v.last_hit_at, **vid))
                .map(|(vid, _)| *vid);
            if let Some(victim) = victim {
                store.entries.remove(&victim);
                tracing::debug!(id = victim, "evicted least recently used cache entry");
            }
        }

        store.entries.insert(id, entry);
        Ok(())
    }

    /// Find the best live entry at least `threshold`-similar to the query.
    ///
    /// Returns the entry snapshot and its similarity. Expired entries are
    /// skipped (the sweeper removes them later). Ties on similarity prefer
    /// the entry with the larger `last_hit_at`, then the first encountered
    /// in store order (implementation-defined but stable within a run).
    pub async fn get(&self, query: &[f64], threshold: f64) -> Option<(CacheEntry, f64)> {
        let now = Utc::now();

        let winner = {
            let store = self.store.read().await;

            let mut best: Option<(u64, f64)> = None;
            for (id, entry) in &store.entries {
                if entry.is_expired(now) {
                    continue;
                }
                let similarity = cosine(query, &entry.embedding);
                if similarity < threshold {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_id, best_sim)) => {
                        similarity > best_sim
                            || (similarity == best_sim
                                && entry.last_hit_at
                                    > store.entries[&best_id].last_hit_at)
                    }
                };
                if better {
                    best = Some((*id, similarity));
                }
            }
            best
        };

        match winner {
            Some((id, similarity)) => {
                let mut store = self.store.write().await;
                // The winner may have been deleted between the scan and
                // the escalation; with nothing left to serve the caller
                // sees a miss, so count it as one.
                let Some(entry) = store.entries.get_mut(&id) else {
                    store.total_misses += 1;
                    return None;
                };
                entry.hit_count += 1;
                entry.last_hit_at = Utc::now();
                let snapshot = entry.clone();
                store.total_hits += 1;
                store.saved_usd +=
                    f64::from(snapshot.response.usage.total_tokens) * PRICE_PER_TOKEN_USD;
                Some((snapshot, similarity))
            }
            None => {
                let mut store = self.store.write().await;
                store.total_misses += 1;
                None
            }
        }
    }

    /// Remove the entry whose identifier matches the exact embedding.
    pub async fn delete(&self, embedding: &[f64]) {
        let id = Self::entry_id(embedding);
        let mut store = self.store.write().await;
        store.entries.remove(&id);
    }

    /// Drop all entries and reset aggregate counters.
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        *store = Store::default();
    }

    /// Live entry count, including expired entries not yet swept.
    pub async fn size(&self) -> usize {
        self.store.read().await.entries.len()
    }

    /// Aggregate statistics snapshot.
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let lookups = store.total_hits + store.total_misses;
        CacheStats {
            total_entries: store.entries.len(),
            total_hits: store.total_hits,
            total_misses: store.total_misses,
            hit_rate: if lookups > 0 {
                store.total_hits as f64 / lookups as f64
            } else {
                0.0
            },
            estimated_saved_usd: store.saved_usd,
        }
    }

    /// Remove all expired entries, returning how many were removed.
    pub async fn cleanup(&self) -> usize {
        let now = Utc::now();
        let mut store = self.store.write().await;
        let before = store.entries.len();
        store.entries.retain(|_, entry| !entry.is_expired(now));
        before - store.entries.len()
    }
}
