// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the cache engine.
//!
//! # Example
//!
//! ```
//! use semantic_cache::CacheEngineConfig;
//!
//! // Minimal config (uses defaults)
//! let config = CacheEngineConfig::default();
//! assert_eq!(config.max_entries, 1000);
//! assert_eq!(config.fuzzy_similarity_threshold, 0.7);
//!
//! // Full config
//! let config = CacheEngineConfig {
//!     redis_url: Some("redis://localhost:6379".into()),
//!     max_entries: 500,
//!     strategy: "lfu".into(),
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Configuration for the cache engine.
///
/// Every field has a working default; a missing value never fails
/// construction. At minimum, production deployments configure `redis_url`
/// (without it the embedded in-memory backend is the natural choice).
#[derive(Debug, Clone, Deserialize)]
pub struct CacheEngineConfig {
    /// Redis connection string (e.g., "redis://localhost:6379")
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Key prefix for namespacing when sharing a store with other tenants
    #[serde(default)]
    pub key_prefix: Option<String>,

    /// Maximum live entries before eviction kicks in (default: 1000)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Entries removed per eviction pass (default: 10)
    #[serde(default = "default_eviction_batch_size")]
    pub eviction_batch_size: usize,

    /// Eviction strategy name: "lfu", "lru" or "hybrid" (default: "hybrid").
    /// Unknown names fall back to "hybrid" with a warning.
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Hybrid strategy weights
    #[serde(default = "default_hybrid_freq_weight")]
    pub hybrid_freq_weight: f64,
    #[serde(default = "default_hybrid_recency_weight")]
    pub hybrid_recency_weight: f64,

    /// Whether lookups fall back to keyword-similarity matching
    #[serde(default = "default_fuzzy_enabled")]
    pub fuzzy_enabled: bool,

    /// Minimum Jaccard similarity for a fuzzy hit (default: 0.7)
    #[serde(default = "default_fuzzy_similarity_threshold")]
    pub fuzzy_similarity_threshold: f64,

    /// Candidates scored per fuzzy lookup before giving up (default: 25)
    #[serde(default = "default_fuzzy_max_candidates")]
    pub fuzzy_max_candidates: usize,

    /// TTL applied to writes that don't specify one (default: 1 hour)
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

fn default_max_entries() -> usize { 1000 }
fn default_eviction_batch_size() -> usize { 10 }
fn default_strategy() -> String { "hybrid".to_string() }
fn default_hybrid_freq_weight() -> f64 { 0.6 }
fn default_hybrid_recency_weight() -> f64 { 0.4 }
fn default_fuzzy_enabled() -> bool { true }
fn default_fuzzy_similarity_threshold() -> f64 { 0.7 }
fn default_fuzzy_max_candidates() -> usize { 25 }
fn default_ttl_secs() -> u64 { 3600 }

impl Default for CacheEngineConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: None,
            max_entries: default_max_entries(),
            eviction_batch_size: default_eviction_batch_size(),
            strategy: default_strategy(),
            hybrid_freq_weight: default_hybrid_freq_weight(),
            hybrid_recency_weight: default_hybrid_recency_weight(),
            fuzzy_enabled: default_fuzzy_enabled(),
            fuzzy_similarity_threshold: default_fuzzy_similarity_threshold(),
            fuzzy_max_candidates: default_fuzzy_max_candidates(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}
