// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The exact → fuzzy → miss lookup chain.

use tracing::{debug, warn};

use crate::keyspace;
use crate::keywords::{extract_keywords, jaccard_similarity, normalize_keyword};
use crate::metrics;
use crate::store::StoreError;

use super::types::{CacheEnvelope, CacheHit, HitKind};
use super::CacheEngine;
use crate::eviction::policy::now_millis;

impl CacheEngine {
    /// Look up a query result.
    ///
    /// Tries the exact canonical key first, then — when enabled — the fuzzy
    /// tier over keyword-index candidates. A miss returns `None`; the caller
    /// produces a fresh result and calls [`set`](CacheEngine::set). Store
    /// failures degrade to a miss, expired and corrupt entries are deleted
    /// on sight, and every outcome is tallied by hit type.
    pub async fn get(&self, query: &str, page: u32, size: u32) -> Option<CacheHit> {
        let _timer = metrics::LatencyTimer::new("get");
        match self.try_get(query, page, size).await {
            Ok(outcome) => outcome,
            Err(e) => {
                metrics::record_store_error("get");
                warn!(query, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn try_get(
        &self,
        query: &str,
        page: u32,
        size: u32,
    ) -> Result<Option<CacheHit>, StoreError> {
        let keywords = extract_keywords(query);
        let mut sorted = keywords.clone();
        sorted.sort();
        let key = keyspace::canonical_key(&sorted, page, size);

        // Exact tier
        if let Some(raw) = self.store().get(&key).await? {
            match self.open_envelope(&key, &raw).await? {
                Some(envelope) => {
                    self.record_hit(&key, HitKind::Normalized).await;
                    return Ok(Some(CacheHit {
                        data: envelope.data,
                        kind: HitKind::Normalized,
                    }));
                }
                // Expired or corrupt: the key was found but unusable, and has
                // been deleted. The caller repopulates it.
                None => {
                    self.tally(keyspace::HIT_MISS).await;
                    metrics::record_lookup(keyspace::HIT_MISS);
                    return Ok(None);
                }
            }
        }

        // Fuzzy tier
        if self.config().fuzzy_enabled && !keywords.is_empty() {
            if let Some(hit) = self.fuzzy_lookup(&key, &keywords, page, size).await? {
                return Ok(Some(hit));
            }
        }

        self.tally(keyspace::HIT_MISS).await;
        metrics::record_lookup(keyspace::HIT_MISS);
        Ok(None)
    }

    /// Find the most similar cached entry sharing keywords with the query.
    async fn fuzzy_lookup(
        &self,
        canonical: &str,
        keywords: &[String],
        page: u32,
        size: u32,
    ) -> Result<Option<CacheHit>, StoreError> {
        let suffix = keyspace::page_suffix(page, size);
        let max_candidates = self.config().fuzzy_max_candidates;
        let threshold = self.config().fuzzy_similarity_threshold;

        // Candidate discovery: union of the keyword membership sets, first
        // seen first, capped before any scoring happens.
        let mut seen = std::collections::HashSet::new();
        let mut candidates = Vec::new();
        'discovery: for keyword in keywords {
            let indexed = normalize_keyword(keyword);
            let members = self
                .store()
                .smembers(&keyspace::keyword_keys_key(&indexed))
                .await?;
            for member in members {
                if member == canonical || !member.ends_with(&suffix) {
                    continue;
                }
                if seen.insert(member.clone()) {
                    candidates.push(member);
                    if candidates.len() >= max_candidates {
                        break 'discovery;
                    }
                }
            }
        }

        // Score candidates; strict `>` keeps the first-seen winner on ties.
        let mut best: Option<(String, f64)> = None;
        for candidate in candidates {
            let meta = match self.eviction().entry_metadata(&candidate).await {
                Ok(Some(meta)) => meta,
                Ok(None) => continue,
                Err(e) => {
                    warn!(candidate, error = %e, "Failed to read fuzzy candidate, skipping");
                    continue;
                }
            };
            let similarity = jaccard_similarity(keywords, &meta.keywords);
            if similarity >= threshold && best.as_ref().map_or(true, |(_, s)| similarity > *s) {
                best = Some((candidate, similarity));
            }
        }

        let Some((matched_key, similarity)) = best else {
            return Ok(None);
        };

        let Some(raw) = self.store().get(&matched_key).await? else {
            // Candidate vanished between scoring and fetch
            return Ok(None);
        };
        let Some(envelope) = self.open_envelope(&matched_key, &raw).await? else {
            return Ok(None);
        };

        debug!(
            canonical,
            matched_key,
            similarity = format!("{similarity:.3}"),
            "Fuzzy cache hit"
        );
        let kind = HitKind::Fuzzy {
            similarity,
            original_key: matched_key.clone(),
        };
        self.record_hit(&matched_key, kind.clone()).await;
        Ok(Some(CacheHit {
            data: envelope.data,
            kind,
        }))
    }

    /// Decode a stored payload, self-healing expired and corrupt entries.
    ///
    /// Returns `Ok(None)` when the entry was deleted (expired or corrupt);
    /// only store failures propagate.
    async fn open_envelope(
        &self,
        key: &str,
        raw: &str,
    ) -> Result<Option<CacheEnvelope>, StoreError> {
        match CacheEnvelope::decode(key, raw) {
            Ok(envelope) if envelope.is_expired(now_millis()) => {
                debug!(key, "Cache entry expired, deleting");
                self.store().del(key).await?;
                Ok(None)
            }
            Ok(envelope) => Ok(Some(envelope)),
            Err(e) => {
                warn!(key, error = %e, "Corrupt cache payload, deleting");
                metrics::record_corrupt_entry("payload");
                self.store().del(key).await?;
                Ok(None)
            }
        }
    }

    /// Book-keep a successful hit: access recording plus durable tally.
    /// Neither failure is allowed to cost the caller the hit itself.
    async fn record_hit(&self, key: &str, kind: HitKind) {
        if let Err(e) = self.eviction().record_access(key).await {
            warn!(key, error = %e, "Failed to record cache access");
        }
        let label = kind.label();
        self.tally(label).await;
        metrics::record_lookup(label);
    }

    async fn tally(&self, hit_type: &str) {
        if let Err(e) = self
            .store()
            .zincrby(keyspace::HIT_TYPE_TALLIES, 1.0, hit_type)
            .await
        {
            warn!(hit_type, error = %e, "Failed to tally lookup outcome");
        }
    }
}
