// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Payload envelope and lookup result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::eviction::policy::now_millis;
use crate::store::StoreError;

/// Typed envelope around a stored search result.
///
/// Everything the engine persists as a payload goes through this one
/// encode/decode boundary, so a corrupt record is detected in exactly one
/// place and self-healed there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope {
    pub data: Value,
    /// Epoch millis of the write.
    pub timestamp: u64,
    pub ttl_seconds: u64,
}

impl CacheEnvelope {
    #[must_use]
    pub fn new(data: Value, ttl_seconds: u64) -> Self {
        Self {
            data,
            timestamp: now_millis(),
            ttl_seconds,
        }
    }

    /// An envelope is expired once its age exceeds the TTL.
    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.timestamp) > self.ttl_seconds * 1000
    }

    pub fn encode(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(|e| StoreError::Backend(format!("envelope encode: {e}")))
    }

    pub fn decode(key: &str, raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// How a successful lookup was satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum HitKind {
    /// Exact canonical-key match.
    Normalized,
    /// Keyword-similarity match served from a different canonical key.
    Fuzzy {
        similarity: f64,
        original_key: String,
    },
}

impl HitKind {
    /// Tally label for this hit kind.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normalized => crate::keyspace::HIT_NORMALIZED,
            Self::Fuzzy { .. } => crate::keyspace::HIT_FUZZY,
        }
    }
}

/// A successful cache lookup.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub data: Value,
    pub kind: HitKind,
}

/// Durable lookup tallies with the derived hit rate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheMetrics {
    pub normalized_hits: u64,
    pub fuzzy_hits: u64,
    pub misses: u64,
    /// Fraction of lookups served from cache (0.0 - 1.0).
    pub hit_rate: f64,
}
