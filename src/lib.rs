//! # Semantic Cache
//!
//! A search-result cache that understands what a query *means*, not just how
//! it is spelled, over any Redis-compatible key-value store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CacheEngine                             │
//! │  • Canonical keys: order/case/morphology-invariant          │
//! │  • Lookup chain: exact → fuzzy (Jaccard ≥ 0.7) → miss       │
//! │  • Writes: TTL envelope + registration + eviction check     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//! ┌──────────────────┐ ┌──────────────┐ ┌─────────────────────┐
//! │ Keyword pipeline │ │ EvictionMgr  │ │ KeyValueStore       │
//! │ stem + stopwords │ │ LFU/LRU/     │ │ Redis or in-memory  │
//! │ + Jaccard        │ │ Hybrid       │ │ strings/sets/zsets  │
//! └──────────────────┘ └──────────────┘ └─────────────────────┘
//! ```
//!
//! Two queries like `"laptop chargers"` and `"charger for laptops"` collapse
//! to the same canonical key; a query sharing enough keywords with a cached
//! one (Jaccard similarity over the configured threshold) is served from that
//! entry as a fuzzy hit. An eviction manager keeps occupancy bounded with a
//! pluggable LFU / LRU / hybrid strategy and maintains the keyword index the
//! fuzzy tier searches.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use semantic_cache::{CacheEngine, CacheEngineConfig, InMemoryStore};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::new());
//! let engine = CacheEngine::new(store, CacheEngineConfig::default());
//!
//! // Cache a search result
//! engine.set("laptop chargers", 1, 10, json!({"results": ["usb-c 65w"]}), None).await;
//!
//! // Word order and plural variation don't matter
//! let hit = engine.get("charger for laptops", 1, 10).await.expect("cache hit");
//! assert_eq!(hit.data["results"][0], "usb-c 65w");
//! # }
//! ```
//!
//! For production use, connect a [`RedisStore`] instead:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use semantic_cache::{CacheEngine, CacheEngineConfig, RedisStore};
//! # async fn example() -> Result<(), semantic_cache::StoreError> {
//! let store = Arc::new(RedisStore::connect("redis://localhost:6379").await?);
//! let engine = CacheEngine::new(store, CacheEngineConfig::default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure posture
//!
//! The cache is an optional accelerator: store outages, corrupt records and
//! missing configuration all degrade to cache-miss behavior with a warning.
//! No path through this crate is fatal to the host process.
//!
//! ## Modules
//!
//! - [`coordinator`]: the [`CacheEngine`] orchestrator
//! - [`eviction`]: LFU / LRU / hybrid strategies and the eviction manager
//! - [`keywords`]: extraction, normalization and Jaccard similarity
//! - [`store`]: the [`KeyValueStore`] boundary with Redis and in-memory backends
//! - [`keyspace`]: persisted key-name conventions
//! - [`resilience`]: retry with exponential backoff
//! - [`metrics`]: in-process instrumentation

pub mod config;
pub mod coordinator;
pub mod eviction;
pub mod keyspace;
pub mod keywords;
pub mod metrics;
pub mod resilience;
pub mod store;

pub use config::CacheEngineConfig;
pub use coordinator::{CacheEngine, CacheEnvelope, CacheHit, CacheMetrics, HitKind};
pub use eviction::{CacheInfo, EvictionManager, EvictionStrategy, KeywordStats};
pub use keywords::{extract_keywords, jaccard_similarity, normalize_keyword};
pub use store::{InMemoryStore, KeyValueStore, RedisStore, StoreError};
