// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Redis storage backend.
//!
//! Implements [`KeyValueStore`] over a multiplexed connection manager. Every
//! command is wrapped in a short query-retry so transient connection blips do
//! not surface as cache misses. An optional key prefix namespaces all keys,
//! enabling a shared Redis instance:
//!
//! ```text
//! prefix "shop:"  →  shop:search:laptop:1:10
//!                    shop:keyword:freq:laptop
//! ```
//!
//! The connection is opened explicitly via [`RedisStore::connect`]; dropping
//! the store releases it.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, AsyncCommands, Client};

use super::traits::{KeyValueStore, StoreError};
use crate::resilience::retry::{retry, RetryConfig};

pub struct RedisStore {
    connection: ConnectionManager,
    /// Optional key prefix for namespacing (e.g., "shop:" → "shop:cache:entries")
    prefix: String,
}

impl RedisStore {
    /// Connect without a key prefix.
    pub async fn connect(connection_string: &str) -> Result<Self, StoreError> {
        Self::connect_with_prefix(connection_string, None).await
    }

    /// Connect with an optional key prefix prepended to every key.
    pub async fn connect_with_prefix(
        connection_string: &str,
        prefix: Option<&str>,
    ) -> Result<Self, StoreError> {
        let client = Client::open(connection_string)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // Startup config: fast-fail rather than hanging on a bad URL
        let connection = retry("redis_connect", &RetryConfig::startup(), || async {
            ConnectionManager::new(client.clone()).await
        })
        .await
        .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    /// Get the configured prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    fn prefixed(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    async fn run<T, F>(&self, name: &str, op: F) -> Result<T, StoreError>
    where
        F: Fn(ConnectionManager) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<T, redis::RedisError>> + Send>,
        >,
    {
        let conn = self.connection.clone();
        retry(name, &RetryConfig::query(), || op(conn.clone()))
            .await
            .map_err(|e: redis::RedisError| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = self.prefixed(key);
        self.run("redis_get", move |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.get(&key).await })
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), StoreError> {
        let key = self.prefixed(key);
        let value = value.to_string();
        self.run("redis_set", move |mut conn| {
            let key = key.clone();
            let value = value.clone();
            Box::pin(async move {
                match ttl_secs {
                    Some(ttl) => conn.set_ex(&key, &value, ttl).await,
                    None => conn.set(&key, &value).await,
                }
            })
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        let key = self.prefixed(key);
        self.run("redis_del", move |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.del(&key).await })
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let key = self.prefixed(key);
        self.run("redis_exists", move |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.exists(&key).await })
        })
        .await
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let key = self.prefixed(key);
        self.run("redis_incrby", move |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.incr(&key, delta).await })
        })
        .await
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let set = self.prefixed(set);
        let member = member.to_string();
        self.run("redis_sadd", move |mut conn| {
            let set = set.clone();
            let member = member.clone();
            Box::pin(async move { conn.sadd(&set, &member).await })
        })
        .await
    }

    async fn srem(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let set = self.prefixed(set);
        let member = member.to_string();
        self.run("redis_srem", move |mut conn| {
            let set = set.clone();
            let member = member.clone();
            Box::pin(async move { conn.srem(&set, &member).await })
        })
        .await
    }

    async fn smembers(&self, set: &str) -> Result<Vec<String>, StoreError> {
        let set = self.prefixed(set);
        self.run("redis_smembers", move |mut conn| {
            let set = set.clone();
            Box::pin(async move { conn.smembers(&set).await })
        })
        .await
    }

    async fn zincrby(&self, set: &str, delta: f64, member: &str) -> Result<f64, StoreError> {
        let set = self.prefixed(set);
        let member = member.to_string();
        self.run("redis_zincrby", move |mut conn| {
            let set = set.clone();
            let member = member.clone();
            Box::pin(async move {
                cmd("ZINCRBY")
                    .arg(&set)
                    .arg(delta)
                    .arg(&member)
                    .query_async(&mut conn)
                    .await
            })
        })
        .await
    }

    async fn zrevrange(&self, set: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let set = self.prefixed(set);
        self.run("redis_zrevrange", move |mut conn| {
            let set = set.clone();
            Box::pin(async move {
                cmd("ZREVRANGE")
                    .arg(&set)
                    .arg(start)
                    .arg(stop)
                    .query_async(&mut conn)
                    .await
            })
        })
        .await
    }

    async fn zscore(&self, set: &str, member: &str) -> Result<Option<f64>, StoreError> {
        let set = self.prefixed(set);
        let member = member.to_string();
        self.run("redis_zscore", move |mut conn| {
            let set = set.clone();
            let member = member.clone();
            Box::pin(async move {
                cmd("ZSCORE")
                    .arg(&set)
                    .arg(&member)
                    .query_async(&mut conn)
                    .await
            })
        })
        .await
    }

    async fn flush(&self) -> Result<(), StoreError> {
        // With a prefix, only this namespace is dropped (SCAN + DEL);
        // without one, the whole logical database is flushed.
        if self.prefix.is_empty() {
            return self
                .run("redis_flushdb", move |mut conn| {
                    Box::pin(async move { cmd("FLUSHDB").arg("ASYNC").query_async(&mut conn).await })
                })
                .await;
        }

        let pattern = format!("{}*", self.prefix);
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut conn)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            if !keys.is_empty() {
                let mut pipeline = redis::pipe();
                for key in &keys {
                    pipeline.del(key);
                }
                pipeline
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(())
    }
}
