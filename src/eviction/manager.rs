// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Store-facing eviction manager.
//!
//! Owns every durable bookkeeping structure around the cached payloads:
//! per-entry metadata, the live-entries set, keyword membership sets, keyword
//! frequency counters, and the global keyword ranking. All state lives in the
//! [`KeyValueStore`]; the manager holds only configuration, so one instance
//! serves any number of concurrent tasks without locking.
//!
//! # Consistency
//!
//! Metadata and index cleanup form one logical unit: [`evict_entry`]
//! dismantles the keyword index *before* deleting the metadata record and the
//! payload, so a payload without metadata is never observable. A keyword
//! counter decremented to zero is deleted rather than stored as zero. Two
//! concurrent writers may double-bump a counter; that inaccuracy is bounded
//! and self-correcting, and is accepted in exchange for lock-free access.
//!
//! [`evict_entry`]: EvictionManager::evict_entry

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::keyspace;
use crate::keywords::normalize_keyword;
use crate::metrics;
use crate::store::{KeyValueStore, StoreError};

use super::policy::{now_millis, EntryMetadata, EvictionCandidate, EvictionStrategy};

/// Per-keyword usage statistics, ranked by global frequency.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordStats {
    pub keyword: String,
    pub frequency: u64,
    pub associated_entry_count: usize,
    /// Epoch millis of the most recent access among member entries.
    pub most_recent_access: Option<u64>,
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub total_entries: usize,
    pub max_entries: usize,
    pub utilization_percentage: f64,
    pub top_keywords: Vec<String>,
    pub strategy_name: String,
}

/// Eviction manager over a shared key-value store.
pub struct EvictionManager {
    store: Arc<dyn KeyValueStore>,
    strategy: EvictionStrategy,
    max_entries: usize,
    batch_size: usize,
}

impl EvictionManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        strategy: EvictionStrategy,
        max_entries: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            strategy,
            max_entries,
            batch_size,
        }
    }

    /// Reported name of the active strategy.
    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Register a freshly written cache entry.
    ///
    /// Writes metadata with frequency 1, adds the key to the live-entries
    /// set, and threads the key through every keyword's membership set,
    /// frequency counter, and the global ranking.
    pub async fn register_entry(
        &self,
        key: &str,
        keywords: &[String],
        size_bytes: u64,
    ) -> Result<(), StoreError> {
        let meta = EntryMetadata::new(key.to_string(), keywords.to_vec(), size_bytes);
        self.write_meta(&meta).await?;
        self.store.sadd(keyspace::ENTRIES_SET, key).await?;

        for keyword in keywords {
            let indexed = normalize_keyword(keyword);
            self.store
                .sadd(&keyspace::keyword_keys_key(&indexed), key)
                .await?;
            self.bump_keyword(&indexed).await?;
        }
        debug!(key, keywords = keywords.len(), "Registered cache entry");
        Ok(())
    }

    /// Record a cache hit on `key`.
    ///
    /// A missing entry is a no-op, never an error. Every strategy refreshes
    /// the last-access stamp and re-heats the keyword counters; the LRU
    /// strategy leaves the per-entry frequency untouched.
    pub async fn record_access(&self, key: &str) -> Result<(), StoreError> {
        let Some(mut meta) = self.load_meta(key).await? else {
            return Ok(());
        };

        meta.last_access = now_millis();
        if self.strategy.counts_frequency() {
            meta.frequency += 1;
        }
        self.write_meta(&meta).await?;

        for keyword in &meta.keywords {
            self.bump_keyword(&normalize_keyword(keyword)).await?;
        }
        Ok(())
    }

    /// Load metadata for a fuzzy-candidate key.
    ///
    /// Corrupt records self-heal (deleted, reported as absent); store errors
    /// propagate.
    pub async fn entry_metadata(&self, key: &str) -> Result<Option<EntryMetadata>, StoreError> {
        self.load_meta(key).await
    }

    /// Scan all live entries and rank eviction candidates, highest score
    /// first, truncated to `count`.
    ///
    /// A record that cannot be read or parsed is logged and skipped; a single
    /// bad entry never aborts the scan.
    pub async fn find_eviction_candidates(
        &self,
        count: usize,
    ) -> Result<Vec<EvictionCandidate>, StoreError> {
        let keys = self.store.smembers(keyspace::ENTRIES_SET).await?;
        let mut entries = Vec::with_capacity(keys.len());

        for key in keys {
            match self.load_meta(&key).await {
                Ok(Some(meta)) => entries.push(meta),
                Ok(None) => {
                    debug!(key, "Entry without metadata during eviction scan, skipping");
                }
                Err(e) => {
                    warn!(key, error = %e, "Failed to read entry during eviction scan, skipping");
                }
            }
        }

        Ok(self.strategy.select_victims(&entries, count))
    }

    /// Evict if the live-entry count exceeds the configured maximum.
    ///
    /// Returns whether an eviction pass ran. Each pass removes at most one
    /// batch; a large excess drains over successive writes.
    pub async fn check_and_evict(&self) -> Result<bool, StoreError> {
        let total = self.store.smembers(keyspace::ENTRIES_SET).await?.len();
        metrics::set_entry_count(total);

        if total <= self.max_entries {
            return Ok(false);
        }

        let excess = total - self.max_entries;
        let eviction_count = (excess + self.batch_size).min(self.batch_size);

        info!(
            total,
            max = self.max_entries,
            evicting = eviction_count,
            strategy = self.strategy.name(),
            "Cache over capacity, running eviction"
        );

        let candidates = self.find_eviction_candidates(eviction_count).await?;
        self.evict(&candidates).await;
        Ok(true)
    }

    /// Evict a ranked batch of candidates. Per-entry failures are logged and
    /// do not stop the batch.
    pub async fn evict(&self, candidates: &[EvictionCandidate]) {
        let mut evicted = 0usize;
        for candidate in candidates {
            match self.evict_entry(&candidate.key).await {
                Ok(()) => evicted += 1,
                Err(e) => warn!(key = candidate.key, error = %e, "Failed to evict entry"),
            }
        }
        if evicted > 0 {
            metrics::record_eviction(evicted);
            debug!(evicted, "Eviction batch complete");
        }
    }

    /// Remove one entry and all its index bookkeeping.
    ///
    /// Index cleanup runs before the metadata record and primary payload are
    /// deleted, so a payload without metadata is never observable; a
    /// momentarily missing index entry for a still-live key is the accepted
    /// trade.
    pub async fn evict_entry(&self, key: &str) -> Result<(), StoreError> {
        if let Some(meta) = self.load_meta(key).await? {
            for keyword in &meta.keywords {
                let indexed = normalize_keyword(keyword);
                self.store
                    .srem(&keyspace::keyword_keys_key(&indexed), key)
                    .await?;
                self.release_keyword(&indexed).await?;
            }
        }

        self.store.del(&keyspace::meta_key(key)).await?;
        self.store.srem(keyspace::ENTRIES_SET, key).await?;
        self.store.del(key).await?;
        debug!(key, "Evicted cache entry");
        Ok(())
    }

    /// Evict every live entry, then drop the keyword ranking. Idempotent.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let keys = self.store.smembers(keyspace::ENTRIES_SET).await?;
        let total = keys.len();
        for key in keys {
            if let Err(e) = self.evict_entry(&key).await {
                warn!(key, error = %e, "Failed to clear entry, continuing");
            }
        }
        self.store.del(keyspace::KEYWORD_RANKING).await?;
        metrics::set_entry_count(0);
        info!(cleared = total, "Cache cleared");
        Ok(())
    }

    /// Top keywords by accumulated frequency with per-keyword detail.
    pub async fn keyword_stats(&self, limit: usize) -> Result<Vec<KeywordStats>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let ranked = self
            .store
            .zrevrange(keyspace::KEYWORD_RANKING, 0, limit as i64 - 1)
            .await?;

        let mut stats = Vec::with_capacity(ranked.len());
        for keyword in ranked {
            let frequency = match self.store.get(&keyspace::keyword_freq_key(&keyword)).await {
                Ok(Some(raw)) => raw.parse::<u64>().unwrap_or(0),
                Ok(None) => 0,
                Err(e) => {
                    warn!(keyword, error = %e, "Failed to read keyword counter, skipping");
                    continue;
                }
            };

            let members = self
                .store
                .smembers(&keyspace::keyword_keys_key(&keyword))
                .await?;
            let mut most_recent_access = None;
            for member in &members {
                if let Ok(Some(meta)) = self.load_meta(member).await {
                    most_recent_access = most_recent_access
                        .map(|current: u64| current.max(meta.last_access))
                        .or(Some(meta.last_access));
                }
            }

            stats.push(KeywordStats {
                keyword,
                frequency,
                associated_entry_count: members.len(),
                most_recent_access,
            });
        }
        Ok(stats)
    }

    /// Occupancy snapshot: totals, utilization, top-10 keywords, strategy.
    pub async fn cache_info(&self) -> Result<CacheInfo, StoreError> {
        let total_entries = self.store.smembers(keyspace::ENTRIES_SET).await?.len();
        let top_keywords = self
            .store
            .zrevrange(keyspace::KEYWORD_RANKING, 0, 9)
            .await?;

        let utilization_percentage = if self.max_entries == 0 {
            0.0
        } else {
            total_entries as f64 / self.max_entries as f64 * 100.0
        };

        Ok(CacheInfo {
            total_entries,
            max_entries: self.max_entries,
            utilization_percentage,
            top_keywords,
            strategy_name: self.strategy.name().to_string(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Internal: metadata codec + keyword counters
    // ═══════════════════════════════════════════════════════════════════════

    async fn write_meta(&self, meta: &EntryMetadata) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(meta)
            .map_err(|e| StoreError::Backend(format!("metadata encode: {e}")))?;
        self.store
            .set(&keyspace::meta_key(&meta.key), &encoded, None)
            .await
    }

    /// Read and decode metadata. A record that fails to decode is deleted
    /// and reported as absent.
    async fn load_meta(&self, key: &str) -> Result<Option<EntryMetadata>, StoreError> {
        let meta_key = keyspace::meta_key(key);
        let Some(raw) = self.store.get(&meta_key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<EntryMetadata>(&raw) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                warn!(key, error = %e, "Corrupt entry metadata, deleting");
                metrics::record_corrupt_entry("metadata");
                self.store.del(&meta_key).await?;
                Ok(None)
            }
        }
    }

    /// Increment a keyword's frequency counter and ranking score.
    async fn bump_keyword(&self, indexed: &str) -> Result<(), StoreError> {
        self.store
            .incr_by(&keyspace::keyword_freq_key(indexed), 1)
            .await?;
        self.store
            .zincrby(keyspace::KEYWORD_RANKING, 1.0, indexed)
            .await?;
        Ok(())
    }

    /// Decrement a keyword's frequency counter, deleting the record once it
    /// reaches zero instead of storing a zero or negative count.
    async fn release_keyword(&self, indexed: &str) -> Result<(), StoreError> {
        let counter_key = keyspace::keyword_freq_key(indexed);
        let remaining = self.store.incr_by(&counter_key, -1).await?;
        if remaining <= 0 {
            self.store.del(&counter_key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn manager_with(strategy: EvictionStrategy, max_entries: usize) -> (Arc<InMemoryStore>, EvictionManager) {
        let store = Arc::new(InMemoryStore::new());
        let manager = EvictionManager::new(store.clone(), strategy, max_entries, 2);
        (store, manager)
    }

    fn kws(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn test_register_writes_metadata_and_index() {
        let (store, manager) = manager_with(EvictionStrategy::Lfu, 10);
        manager
            .register_entry("search:laptop:1:10", &kws(&["laptop"]), 128)
            .await
            .unwrap();

        let meta = manager.entry_metadata("search:laptop:1:10").await.unwrap().unwrap();
        assert_eq!(meta.frequency, 1);
        assert_eq!(meta.keywords, vec!["laptop"]);

        let entries = store.smembers(keyspace::ENTRIES_SET).await.unwrap();
        assert_eq!(entries, vec!["search:laptop:1:10"]);
        let members = store.smembers(&keyspace::keyword_keys_key("laptop")).await.unwrap();
        assert_eq!(members, vec!["search:laptop:1:10"]);
        assert_eq!(
            store.get(&keyspace::keyword_freq_key("laptop")).await.unwrap(),
            Some("1".to_string())
        );
    }

    #[tokio::test]
    async fn test_register_folds_accented_keywords_into_index() {
        let (store, manager) = manager_with(EvictionStrategy::Lfu, 10);
        manager
            .register_entry("search:calça:1:10", &kws(&["calça"]), 64)
            .await
            .unwrap();

        // Index keys use the diacritic-folded form
        let members = store.smembers(&keyspace::keyword_keys_key("calca")).await.unwrap();
        assert_eq!(members, vec!["search:calça:1:10"]);
    }

    #[tokio::test]
    async fn test_record_access_increments_frequency_for_lfu() {
        let (_store, manager) = manager_with(EvictionStrategy::Lfu, 10);
        manager.register_entry("k", &kws(&["laptop"]), 10).await.unwrap();
        manager.record_access("k").await.unwrap();
        manager.record_access("k").await.unwrap();

        let meta = manager.entry_metadata("k").await.unwrap().unwrap();
        assert_eq!(meta.frequency, 3);
    }

    #[tokio::test]
    async fn test_record_access_keeps_frequency_for_lru() {
        let (store, manager) = manager_with(EvictionStrategy::Lru, 10);
        manager.register_entry("k", &kws(&["laptop"]), 10).await.unwrap();
        manager.record_access("k").await.unwrap();

        let meta = manager.entry_metadata("k").await.unwrap().unwrap();
        assert_eq!(meta.frequency, 1);
        // Keyword counters still heat up
        assert_eq!(
            store.get(&keyspace::keyword_freq_key("laptop")).await.unwrap(),
            Some("2".to_string())
        );
    }

    #[tokio::test]
    async fn test_record_access_on_absent_key_is_noop() {
        let (_store, manager) = manager_with(EvictionStrategy::Lfu, 10);
        manager.record_access("nonexistent").await.unwrap();
    }

    #[tokio::test]
    async fn test_evict_entry_dismantles_index() {
        let (store, manager) = manager_with(EvictionStrategy::Lfu, 10);
        store.set("k1", "payload", None).await.unwrap();
        manager.register_entry("k1", &kws(&["laptop", "charger"]), 10).await.unwrap();
        manager.register_entry("k2", &kws(&["laptop"]), 10).await.unwrap();

        manager.evict_entry("k1").await.unwrap();

        assert!(!store.smembers(keyspace::ENTRIES_SET).await.unwrap().contains(&"k1".to_string()));
        assert!(!store
            .smembers(&keyspace::keyword_keys_key("laptop"))
            .await
            .unwrap()
            .contains(&"k1".to_string()));
        assert_eq!(store.get("k1").await.unwrap(), None);
        assert_eq!(manager.entry_metadata("k1").await.unwrap().map(|m| m.key), None);

        // "laptop" survives with k2's count; "charger" reached zero and was deleted
        assert_eq!(
            store.get(&keyspace::keyword_freq_key("laptop")).await.unwrap(),
            Some("1".to_string())
        );
        assert_eq!(store.get(&keyspace::keyword_freq_key("charger")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_candidates_ranks_lfu_victim() {
        let (_store, manager) = manager_with(EvictionStrategy::Lfu, 10);
        manager.register_entry("ten", &kws(&["a"]), 10).await.unwrap();
        manager.register_entry("five", &kws(&["b"]), 10).await.unwrap();
        manager.register_entry("one", &kws(&["c"]), 10).await.unwrap();
        for _ in 0..9 {
            manager.record_access("ten").await.unwrap();
        }
        for _ in 0..4 {
            manager.record_access("five").await.unwrap();
        }

        let victims = manager.find_eviction_candidates(1).await.unwrap();
        assert_eq!(victims.len(), 1);
        assert_eq!(victims[0].key, "one");
    }

    #[tokio::test]
    async fn test_scan_skips_corrupt_metadata() {
        let (store, manager) = manager_with(EvictionStrategy::Lfu, 10);
        manager.register_entry("good", &kws(&["a"]), 10).await.unwrap();
        manager.register_entry("bad", &kws(&["b"]), 10).await.unwrap();
        store
            .set(&keyspace::meta_key("bad"), "{not json", None)
            .await
            .unwrap();

        let victims = manager.find_eviction_candidates(10).await.unwrap();
        assert_eq!(victims.len(), 1);
        assert_eq!(victims[0].key, "good");
        // Corrupt record self-healed
        assert_eq!(store.get(&keyspace::meta_key("bad")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_check_and_evict_only_above_capacity() {
        let (_store, manager) = manager_with(EvictionStrategy::Lfu, 3);
        for i in 0..3 {
            manager.register_entry(&format!("k{i}"), &kws(&["a"]), 10).await.unwrap();
        }
        assert!(!manager.check_and_evict().await.unwrap());

        manager.register_entry("k3", &kws(&["a"]), 10).await.unwrap();
        assert!(manager.check_and_evict().await.unwrap());
    }

    #[tokio::test]
    async fn test_check_and_evict_caps_batch() {
        // max 2, batch 2, 8 entries over: one pass removes exactly batch_size
        let store = Arc::new(InMemoryStore::new());
        let manager = EvictionManager::new(store.clone(), EvictionStrategy::Lfu, 2, 2);
        for i in 0..10 {
            manager.register_entry(&format!("k{i}"), &kws(&["a"]), 10).await.unwrap();
        }

        assert!(manager.check_and_evict().await.unwrap());
        let remaining = store.smembers(keyspace::ENTRIES_SET).await.unwrap().len();
        assert_eq!(remaining, 8);
    }

    #[tokio::test]
    async fn test_clear_all_is_idempotent() {
        let (store, manager) = manager_with(EvictionStrategy::Hybrid {
            freq_weight: 0.6,
            recency_weight: 0.4,
        }, 10);
        for i in 0..5 {
            manager.register_entry(&format!("k{i}"), &kws(&["laptop"]), 10).await.unwrap();
        }

        manager.clear_all().await.unwrap();
        assert!(store.smembers(keyspace::ENTRIES_SET).await.unwrap().is_empty());
        assert!(store
            .zrevrange(keyspace::KEYWORD_RANKING, 0, -1)
            .await
            .unwrap()
            .is_empty());

        // Second pass over an empty cache: still clean, still no error
        manager.clear_all().await.unwrap();
        assert!(store.smembers(keyspace::ENTRIES_SET).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keyword_stats_ranked() {
        let (_store, manager) = manager_with(EvictionStrategy::Lfu, 10);
        manager.register_entry("k1", &kws(&["laptop", "charger"]), 10).await.unwrap();
        manager.register_entry("k2", &kws(&["laptop"]), 10).await.unwrap();

        let stats = manager.keyword_stats(5).await.unwrap();
        assert_eq!(stats[0].keyword, "laptop");
        assert_eq!(stats[0].frequency, 2);
        assert_eq!(stats[0].associated_entry_count, 2);
        assert!(stats[0].most_recent_access.is_some());
        assert_eq!(stats[1].keyword, "charger");
        assert_eq!(stats[1].associated_entry_count, 1);
    }

    #[tokio::test]
    async fn test_cache_info() {
        let (_store, manager) = manager_with(EvictionStrategy::Lru, 4);
        manager.register_entry("k1", &kws(&["laptop"]), 10).await.unwrap();
        manager.register_entry("k2", &kws(&["charger"]), 10).await.unwrap();

        let info = manager.cache_info().await.unwrap();
        assert_eq!(info.total_entries, 2);
        assert_eq!(info.max_entries, 4);
        assert!((info.utilization_percentage - 50.0).abs() < 1e-9);
        assert_eq!(info.strategy_name, "LRU");
        assert_eq!(info.top_keywords.len(), 2);
    }
}
