// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the semantic cache.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the host process
//! chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `semantic_cache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `hit_type`: normalized, fuzzy, miss
//! - `operation`: get, set, exists, invalidate, evict
//!
//! These gauges and counters are in-process observability only; the durable
//! hit-type tallies served by the engine live in the store itself.

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record a lookup outcome by hit type.
pub fn record_lookup(hit_type: &str) {
    counter!(
        "semantic_cache_lookups_total",
        "hit_type" => hit_type.to_string()
    )
    .increment(1);
}

/// Record a cache write.
pub fn record_write(bytes: usize) {
    counter!("semantic_cache_writes_total").increment(1);
    histogram!("semantic_cache_write_bytes").record(bytes as f64);
}

/// Record evicted entries.
pub fn record_eviction(count: usize) {
    counter!("semantic_cache_evictions_total").increment(count as u64);
}

/// Record a corrupt record that was self-healed by deletion.
pub fn record_corrupt_entry(kind: &str) {
    counter!(
        "semantic_cache_corrupt_entries_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a store operation that failed after retries.
pub fn record_store_error(operation: &str) {
    counter!(
        "semantic_cache_store_errors_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Set the current live-entry count.
pub fn set_entry_count(count: usize) {
    gauge!("semantic_cache_entries").set(count as f64);
}

/// Record operation latency.
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "semantic_cache_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These verify the API compiles and doesn't panic; assertions against a
    // recorder belong to the host process that installs one.

    #[test]
    fn test_record_lookup() {
        record_lookup("normalized");
        record_lookup("fuzzy");
        record_lookup("miss");
    }

    #[test]
    fn test_record_write_and_eviction() {
        record_write(512);
        record_eviction(3);
    }

    #[test]
    fn test_error_counters() {
        record_corrupt_entry("payload");
        record_corrupt_entry("metadata");
        record_store_error("get");
    }

    #[test]
    fn test_gauges() {
        set_entry_count(42);
    }

    #[test]
    fn test_latency_timer() {
        {
            let _timer = LatencyTimer::new("get");
            std::thread::sleep(Duration::from_micros(10));
        }
        // Recorded on drop
    }
}
