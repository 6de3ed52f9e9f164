use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("corrupt record at '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Boundary to the external key-value store.
///
/// The engine needs string keys plus set and sorted-set collections; any
/// Redis-protocol-compatible store satisfies this. Implementations must make
/// each primitive individually atomic — the engine holds no client-side
/// locks and relies on per-command atomicity for counter and membership
/// updates.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a string value, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a string value, with an optional TTL in seconds.
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), StoreError>;

    /// Delete a key of any type. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), StoreError>;

    /// Whether a key currently exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomically add `delta` to an integer counter, returning the new value.
    /// An absent key counts from zero.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError>;

    /// Add a member to a set.
    async fn sadd(&self, set: &str, member: &str) -> Result<(), StoreError>;

    /// Remove a member from a set. Absent members are ignored.
    async fn srem(&self, set: &str, member: &str) -> Result<(), StoreError>;

    /// All members of a set; empty vec when the set is absent.
    async fn smembers(&self, set: &str) -> Result<Vec<String>, StoreError>;

    /// Add `delta` to a member's score in a sorted set, returning the new
    /// score. Absent members count from zero.
    async fn zincrby(&self, set: &str, delta: f64, member: &str) -> Result<f64, StoreError>;

    /// Members of a sorted set ordered by descending score, over the
    /// inclusive index range `[start, stop]`; negative indices count from the
    /// end (Redis ZREVRANGE semantics).
    async fn zrevrange(&self, set: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError>;

    /// Score of a sorted-set member, `None` when absent.
    async fn zscore(&self, set: &str, member: &str) -> Result<Option<f64>, StoreError>;

    /// Drop every key in the store's namespace.
    async fn flush(&self) -> Result<(), StoreError>;
}
