use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::{KeyValueStore, StoreError};

#[derive(Clone)]
struct StringEntry {
    value: String,
    /// Epoch millis after which the entry no longer exists; `None` = no TTL.
    expires_at: Option<u64>,
}

/// In-process store backend.
///
/// Lock-free per key via DashMap; string entries honor TTLs lazily (checked
/// on read, reaped on access). Used by the test suite and by embedded
/// single-process deployments.
pub struct InMemoryStore {
    strings: DashMap<String, StringEntry>,
    sets: DashMap<String, HashSet<String>>,
    zsets: DashMap<String, HashMap<String, f64>>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            strings: DashMap::new(),
            sets: DashMap::new(),
            zsets: DashMap::new(),
        }
    }

    /// Current number of live string keys (TTL-expired keys excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        let now = now_millis();
        self.strings
            .iter()
            .filter(|e| e.value().expires_at.map_or(true, |t| now <= t))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(entry) = self.strings.get(key) {
            if let Some(expires_at) = entry.expires_at {
                if now_millis() > expires_at {
                    drop(entry);
                    self.strings.remove(key);
                    return Ok(None);
                }
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), StoreError> {
        self.strings.insert(
            key.to_string(),
            StringEntry {
                value: value.to_string(),
                expires_at: ttl_secs.map(|t| now_millis() + t * 1000),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.strings.remove(key);
        self.sets.remove(key);
        self.zsets.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        if self.sets.contains_key(key) || self.zsets.contains_key(key) {
            return Ok(true);
        }
        Ok(self.get(key).await?.is_some())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let mut entry = self.strings.entry(key.to_string()).or_insert(StringEntry {
            value: "0".to_string(),
            expires_at: None,
        });
        let current: i64 = entry.value.parse().map_err(|_| StoreError::Backend(
            format!("value at '{key}' is not an integer"),
        ))?;
        let next = current + delta;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<(), StoreError> {
        self.sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, set: &str, member: &str) -> Result<(), StoreError> {
        if let Some(mut members) = self.sets.get_mut(set) {
            members.remove(member);
            let empty = members.is_empty();
            drop(members);
            if empty {
                self.sets.remove_if(set, |_, v| v.is_empty());
            }
        }
        Ok(())
    }

    async fn smembers(&self, set: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .sets
            .get(set)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn zincrby(&self, set: &str, delta: f64, member: &str) -> Result<f64, StoreError> {
        let mut members = self.zsets.entry(set.to_string()).or_default();
        let score = members.entry(member.to_string()).or_insert(0.0);
        *score += delta;
        Ok(*score)
    }

    async fn zrevrange(&self, set: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let Some(members) = self.zsets.get(set) else {
            return Ok(Vec::new());
        };
        let mut ranked: Vec<(String, f64)> =
            members.iter().map(|(m, s)| (m.clone(), *s)).collect();
        drop(members);
        // Descending score; ties ordered lexically for determinism, matching
        // Redis' reverse-lexical tie order closely enough for ranking reads.
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(&a.0))
        });

        let len = ranked.len() as i64;
        let resolve = |idx: i64| -> i64 {
            if idx < 0 { len + idx } else { idx }
        };
        let start = resolve(start).max(0);
        let stop = resolve(stop).min(len - 1);
        if start > stop || start >= len {
            return Ok(Vec::new());
        }
        Ok(ranked[start as usize..=stop as usize]
            .iter()
            .map(|(m, _)| m.clone())
            .collect())
    }

    async fn zscore(&self, set: &str, member: &str) -> Result<Option<f64>, StoreError> {
        Ok(self.zsets.get(set).and_then(|m| m.get(member).copied()))
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.strings.clear();
        self.sets.clear();
        self.zsets.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_get_absent_returns_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_expiry_is_lazy() {
        let store = InMemoryStore::new();
        store.set("k", "v", Some(3600)).await.unwrap();
        assert!(store.exists("k").await.unwrap());

        // Force the entry into the past.
        store.strings.get_mut("k").unwrap().expires_at = Some(now_millis() - 1000);
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_del_is_idempotent() {
        let store = InMemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        store.del("k").await.unwrap();
        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_by_counts_from_zero() {
        let store = InMemoryStore::new();
        assert_eq!(store.incr_by("n", 1).await.unwrap(), 1);
        assert_eq!(store.incr_by("n", 2).await.unwrap(), 3);
        assert_eq!(store.incr_by("n", -3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_membership() {
        let store = InMemoryStore::new();
        store.sadd("s", "a").await.unwrap();
        store.sadd("s", "b").await.unwrap();
        store.sadd("s", "a").await.unwrap();

        let mut members = store.smembers("s").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a", "b"]);

        store.srem("s", "a").await.unwrap();
        assert_eq!(store.smembers("s").await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_srem_drops_empty_set() {
        let store = InMemoryStore::new();
        store.sadd("s", "a").await.unwrap();
        store.srem("s", "a").await.unwrap();
        assert!(!store.exists("s").await.unwrap());
    }

    #[tokio::test]
    async fn test_zrevrange_orders_by_score() {
        let store = InMemoryStore::new();
        store.zincrby("z", 1.0, "low").await.unwrap();
        store.zincrby("z", 5.0, "high").await.unwrap();
        store.zincrby("z", 3.0, "mid").await.unwrap();

        let top = store.zrevrange("z", 0, -1).await.unwrap();
        assert_eq!(top, vec!["high", "mid", "low"]);

        let top_two = store.zrevrange("z", 0, 1).await.unwrap();
        assert_eq!(top_two, vec!["high", "mid"]);
    }

    #[tokio::test]
    async fn test_zscore() {
        let store = InMemoryStore::new();
        store.zincrby("z", 2.5, "m").await.unwrap();
        assert_eq!(store.zscore("z", "m").await.unwrap(), Some(2.5));
        assert_eq!(store.zscore("z", "absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_clears_everything() {
        let store = InMemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        store.sadd("s", "a").await.unwrap();
        store.zincrby("z", 1.0, "m").await.unwrap();

        store.flush().await.unwrap();

        assert!(store.is_empty());
        assert!(store.smembers("s").await.unwrap().is_empty());
        assert_eq!(store.zscore("z", "m").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryStore::new());
        let mut handles = vec![];

        for batch in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..10 {
                    let key = format!("batch-{batch}-item-{i}");
                    store.set(&key, "v", None).await.unwrap();
                    store.incr_by("counter", 1).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 101); // 100 items + the counter key
        assert_eq!(store.incr_by("counter", 0).await.unwrap(), 100);
    }
}
