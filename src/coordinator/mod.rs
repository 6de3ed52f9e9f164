// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cache engine coordinator.
//!
//! The [`CacheEngine`] ties the components together: canonical key
//! construction over the keyword pipeline, the exact → fuzzy → miss lookup
//! chain, writes with TTL and eviction checks, and invalidation.
//!
//! ```text
//! get(query, page, size)
//!       │ extract + sort keywords
//!       ▼
//! ┌─────────────────────────────┐
//! │ Exact tier                  │  search:<kw…>:<page>:<size>
//! │  hit? → record access       │──→ HitKind::Normalized
//! │  expired/corrupt? → delete  │──→ miss
//! └─────────────────────────────┘
//!       │ not found
//!       ▼
//! ┌─────────────────────────────┐
//! │ Fuzzy tier (optional)       │  keyword:keys:<kw> candidates
//! │  Jaccard ≥ threshold?       │──→ HitKind::Fuzzy { similarity, … }
//! └─────────────────────────────┘
//!       │ nothing over threshold
//!       ▼
//!     miss (caller searches and calls set)
//! ```
//!
//! # Failure posture
//!
//! The cache is an accelerator, never a dependency: every public method
//! degrades a store failure to its safe default (miss / false / zero /
//! empty) with a warning. Nothing here is fatal to the host.

mod lookup;
mod types;

pub use types::{CacheEnvelope, CacheHit, CacheMetrics, HitKind};

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CacheEngineConfig;
use crate::eviction::{CacheInfo, EvictionCandidate, EvictionManager, EvictionStrategy, KeywordStats};
use crate::keyspace;
use crate::keywords::extract_keywords;
use crate::metrics;
use crate::store::{KeyValueStore, StoreError};

/// Main cache orchestrator.
///
/// Holds no mutable in-process state beyond configuration — all durable
/// state lives in the store, so the engine is freely shareable across tasks.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use semantic_cache::{CacheEngine, CacheEngineConfig, InMemoryStore};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = Arc::new(InMemoryStore::new());
/// let engine = CacheEngine::new(store, CacheEngineConfig::default());
///
/// engine.set("laptop chargers", 1, 10, json!({"results": []}), None).await;
/// assert!(engine.exists("charger laptop", 1, 10).await);
/// # }
/// ```
pub struct CacheEngine {
    store: Arc<dyn KeyValueStore>,
    eviction: EvictionManager,
    config: CacheEngineConfig,
}

impl CacheEngine {
    /// Build an engine over an already-connected store.
    ///
    /// The eviction strategy is resolved from `config.strategy`; unknown
    /// names fall back to hybrid with a warning.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheEngineConfig) -> Self {
        let strategy = EvictionStrategy::from_name(
            &config.strategy,
            config.hybrid_freq_weight,
            config.hybrid_recency_weight,
        );
        let eviction = EvictionManager::new(
            store.clone(),
            strategy,
            config.max_entries,
            config.eviction_batch_size,
        );
        info!(
            strategy = strategy.name(),
            max_entries = config.max_entries,
            fuzzy = config.fuzzy_enabled,
            "Cache engine initialized"
        );
        Self {
            store,
            eviction,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CacheEngineConfig {
        &self.config
    }

    /// Name of the active eviction strategy: "LFU", "LRU" or "Hybrid".
    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.eviction.strategy_name()
    }

    /// Canonical key for a query: keywords extracted, sorted, space-joined,
    /// framed with the page window. Word order, case, stopwords and plural
    /// variation all collapse to the same key.
    #[must_use]
    pub fn canonical_key(&self, query: &str, page: u32, size: u32) -> String {
        let mut keywords = extract_keywords(query);
        keywords.sort();
        keyspace::canonical_key(&keywords, page, size)
    }

    /// Store a search result under the query's canonical key.
    ///
    /// Registers the entry with the eviction manager and immediately runs an
    /// eviction check. `ttl` falls back to the configured default.
    pub async fn set(&self, query: &str, page: u32, size: u32, data: Value, ttl: Option<u64>) {
        let _timer = metrics::LatencyTimer::new("set");
        if let Err(e) = self.try_set(query, page, size, data, ttl).await {
            metrics::record_store_error("set");
            warn!(query, error = %e, "Cache write failed, result not cached");
        }
    }

    async fn try_set(
        &self,
        query: &str,
        page: u32,
        size: u32,
        data: Value,
        ttl: Option<u64>,
    ) -> Result<(), StoreError> {
        let keywords = extract_keywords(query);
        let mut sorted = keywords.clone();
        sorted.sort();
        let key = keyspace::canonical_key(&sorted, page, size);

        let ttl_seconds = ttl.unwrap_or(self.config.default_ttl_secs);
        let encoded = CacheEnvelope::new(data, ttl_seconds).encode()?;

        self.store.set(&key, &encoded, Some(ttl_seconds)).await?;
        self.eviction
            .register_entry(&key, &keywords, encoded.len() as u64)
            .await?;
        metrics::record_write(encoded.len());
        debug!(key, ttl_seconds, "Cached search result");

        self.eviction.check_and_evict().await?;
        Ok(())
    }

    /// Whether an exact canonical-key entry exists. Fuzzy matches are not
    /// considered.
    pub async fn exists(&self, query: &str, page: u32, size: u32) -> bool {
        let key = self.canonical_key(query, page, size);
        match self.store.exists(&key).await {
            Ok(found) => found,
            Err(e) => {
                metrics::record_store_error("exists");
                warn!(key, error = %e, "Existence check failed, reporting absent");
                false
            }
        }
    }

    /// Drop a single query's canonical-key entry.
    ///
    /// Only the payload key is deleted; keyword-index residue for the key is
    /// left behind and skipped by later fuzzy lookups. Use
    /// [`invalidate_all`](Self::invalidate_all) for full cleanup.
    pub async fn invalidate(&self, query: &str, page: u32, size: u32) {
        let key = self.canonical_key(query, page, size);
        if let Err(e) = self.store.del(&key).await {
            metrics::record_store_error("invalidate");
            warn!(key, error = %e, "Invalidation failed");
        } else {
            debug!(key, "Invalidated cache entry");
        }
    }

    /// Flush the store and reset all eviction bookkeeping.
    pub async fn invalidate_all(&self) {
        if let Err(e) = self.try_invalidate_all().await {
            metrics::record_store_error("invalidate_all");
            warn!(error = %e, "Full invalidation failed");
        }
    }

    async fn try_invalidate_all(&self) -> Result<(), StoreError> {
        self.store.flush().await?;
        self.eviction.clear_all().await?;
        info!("Cache flushed");
        Ok(())
    }

    /// Run one eviction pass of up to `count` entries regardless of
    /// occupancy. Returns the evicted keys.
    pub async fn manual_eviction(&self, count: usize) -> Vec<String> {
        match self.try_manual_eviction(count).await {
            Ok(keys) => keys,
            Err(e) => {
                metrics::record_store_error("evict");
                warn!(error = %e, "Manual eviction failed");
                Vec::new()
            }
        }
    }

    async fn try_manual_eviction(&self, count: usize) -> Result<Vec<String>, StoreError> {
        let candidates: Vec<EvictionCandidate> =
            self.eviction.find_eviction_candidates(count).await?;
        let keys = candidates.iter().map(|c| c.key.clone()).collect();
        self.eviction.evict(&candidates).await;
        Ok(keys)
    }

    /// Top keywords by accumulated frequency.
    pub async fn keyword_statistics(&self, limit: usize) -> Vec<KeywordStats> {
        self.eviction.keyword_stats(limit).await.unwrap_or_else(|e| {
            metrics::record_store_error("keyword_stats");
            warn!(error = %e, "Keyword statistics unavailable");
            Vec::new()
        })
    }

    /// Occupancy snapshot: totals, utilization, top keywords, strategy.
    pub async fn cache_info(&self) -> CacheInfo {
        match self.eviction.cache_info().await {
            Ok(info) => info,
            Err(e) => {
                metrics::record_store_error("cache_info");
                warn!(error = %e, "Cache info unavailable");
                CacheInfo {
                    total_entries: 0,
                    max_entries: self.config.max_entries,
                    utilization_percentage: 0.0,
                    top_keywords: Vec::new(),
                    strategy_name: self.strategy_name().to_string(),
                }
            }
        }
    }

    /// Durable hit-type tallies and overall hit rate.
    pub async fn cache_metrics(&self) -> CacheMetrics {
        match self.try_cache_metrics().await {
            Ok(metrics) => metrics,
            Err(e) => {
                metrics::record_store_error("cache_metrics");
                warn!(error = %e, "Cache metrics unavailable");
                CacheMetrics::default()
            }
        }
    }

    async fn try_cache_metrics(&self) -> Result<CacheMetrics, StoreError> {
        let tally = |member: &'static str| async move {
            self.store
                .zscore(keyspace::HIT_TYPE_TALLIES, member)
                .await
                .map(|score| score.unwrap_or(0.0) as u64)
        };
        let normalized_hits = tally(keyspace::HIT_NORMALIZED).await?;
        let fuzzy_hits = tally(keyspace::HIT_FUZZY).await?;
        let misses = tally(keyspace::HIT_MISS).await?;

        let hits = normalized_hits + fuzzy_hits;
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        Ok(CacheMetrics {
            normalized_hits,
            fuzzy_hits,
            misses,
            hit_rate,
        })
    }

    pub(crate) fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub(crate) fn eviction(&self) -> &EvictionManager {
        &self.eviction
    }
}
