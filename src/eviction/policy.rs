// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Eviction scoring strategies.
//!
//! Three interchangeable strategies share one contract: given an entry's
//! metadata, produce a score where **higher means evict first**.
//!
//! - **LFU**: rarely-used entries score high, with a mild staleness bonus
//! - **LRU**: staleness only; access counts are ignored entirely
//! - **Hybrid**: weighted blend of both, defaulting to 0.6 frequency / 0.4 recency

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Default frequency weight for the hybrid strategy.
pub const DEFAULT_FREQ_WEIGHT: f64 = 0.6;
/// Default recency weight for the hybrid strategy.
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.4;

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Bookkeeping record for one cache entry, stored as JSON under
/// `cache:meta:<key>`.
///
/// `frequency` starts at 1 and never drops below it while the entry is live;
/// `keywords` carries the stemmed extraction the entry was registered with
/// and is what fuzzy lookups score against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub key: String,
    pub keywords: Vec<String>,
    pub frequency: u64,
    /// Epoch millis of the most recent access.
    pub last_access: u64,
    /// Epoch millis of registration.
    pub created: u64,
    pub size_bytes: u64,
}

impl EntryMetadata {
    /// Fresh metadata for a newly registered entry.
    #[must_use]
    pub fn new(key: String, keywords: Vec<String>, size_bytes: u64) -> Self {
        let now = now_millis();
        Self {
            key,
            keywords,
            frequency: 1,
            last_access: now,
            created: now,
            size_bytes,
        }
    }

    /// Hours elapsed since the last access.
    #[must_use]
    pub fn age_hours(&self, now: u64) -> f64 {
        now.saturating_sub(self.last_access) as f64 / 3_600_000.0
    }
}

/// Scored projection of an entry produced during an eviction scan.
/// Never persisted.
#[derive(Debug, Clone)]
pub struct EvictionCandidate {
    pub key: String,
    pub frequency: u64,
    pub score: f64,
    pub keywords: Vec<String>,
}

/// Eviction scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvictionStrategy {
    /// Frequency-based: `1/(frequency+1) + age_hours * 0.1`
    Lfu,
    /// Recency-based: milliseconds since last access, frequency ignored.
    Lru,
    /// Weighted blend of the LFU and LRU signals.
    Hybrid { freq_weight: f64, recency_weight: f64 },
}

impl EvictionStrategy {
    /// Resolve a strategy from its configuration name.
    ///
    /// Unknown names fall back to the hybrid default with a warning rather
    /// than failing startup.
    #[must_use]
    pub fn from_name(name: &str, freq_weight: f64, recency_weight: f64) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "lfu" | "frequency" => Self::Lfu,
            "lru" | "recency" => Self::Lru,
            "hybrid" => Self::Hybrid { freq_weight, recency_weight },
            other => {
                warn!(strategy = other, "Unknown eviction strategy, using hybrid");
                Self::Hybrid { freq_weight, recency_weight }
            }
        }
    }

    /// Reported strategy name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lfu => "LFU",
            Self::Lru => "LRU",
            Self::Hybrid { .. } => "Hybrid",
        }
    }

    /// Whether [`EvictionManager::record_access`](super::manager::EvictionManager::record_access)
    /// bumps the entry's frequency under this strategy.
    #[must_use]
    pub fn counts_frequency(&self) -> bool {
        !matches!(self, Self::Lru)
    }

    /// Eviction score for an entry at wall-clock `now`; higher = evict first.
    #[must_use]
    pub fn score(&self, meta: &EntryMetadata, now: u64) -> f64 {
        match *self {
            Self::Lfu => {
                1.0 / (meta.frequency as f64 + 1.0) + meta.age_hours(now) * 0.1
            }
            Self::Lru => now.saturating_sub(meta.last_access) as f64,
            Self::Hybrid { freq_weight, recency_weight } => {
                freq_weight * (1.0 / (meta.frequency as f64 + 1.0))
                    + recency_weight * (meta.age_hours(now) * 0.1)
            }
        }
    }

    /// Rank entries by descending score and keep the top `count`.
    ///
    /// Tie order follows the input enumeration order, which callers must not
    /// rely on — the underlying store does not guarantee a stable member
    /// enumeration.
    #[must_use]
    pub fn select_victims(
        &self,
        entries: &[EntryMetadata],
        count: usize,
    ) -> Vec<EvictionCandidate> {
        let now = now_millis();
        let mut candidates: Vec<EvictionCandidate> = entries
            .iter()
            .map(|meta| EvictionCandidate {
                key: meta.key.clone(),
                frequency: meta.frequency,
                score: self.score(meta, now),
                keywords: meta.keywords.clone(),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(count);
        candidates
    }
}
