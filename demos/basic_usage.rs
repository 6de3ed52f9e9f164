// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic semantic-cache usage example.
//!
//! Demonstrates:
//! 1. Building an engine over the embedded in-memory store
//! 2. Caching a search result
//! 3. Exact hits across word order / plural / stopword variation
//! 4. A fuzzy hit from partial keyword overlap
//! 5. Keyword statistics and hit-rate metrics
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```
//!
//! To run against Redis instead, set `REDIS_URL`:
//!
//! ```bash
//! REDIS_URL=redis://localhost:6379 cargo run --example basic_usage
//! ```

use std::sync::Arc;

use semantic_cache::{
    CacheEngine, CacheEngineConfig, HitKind, InMemoryStore, KeyValueStore, RedisStore,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║          semantic-cache: Basic Usage Example                  ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Build the engine
    // ─────────────────────────────────────────────────────────────────────────
    let store: Arc<dyn KeyValueStore> = match std::env::var("REDIS_URL") {
        Ok(url) => {
            println!("📦 Connecting to Redis at {url}...");
            Arc::new(RedisStore::connect_with_prefix(&url, Some("semcache-demo:")).await?)
        }
        Err(_) => {
            println!("📦 Using the embedded in-memory store (set REDIS_URL for Redis)");
            Arc::new(InMemoryStore::new())
        }
    };

    let engine = CacheEngine::new(
        store,
        CacheEngineConfig {
            max_entries: 100,
            strategy: "hybrid".into(),
            ..Default::default()
        },
    );
    println!("   └─ Strategy: {}", engine.strategy_name());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Cache a search result
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Caching results for \"laptop chargers usb\"...");
    engine
        .set(
            "laptop chargers usb",
            1,
            10,
            json!({"results": ["USB-C 65W", "USB-C 100W GaN"], "total": 2}),
            None,
        )
        .await;
    println!(
        "   └─ Canonical key: {}",
        engine.canonical_key("laptop chargers usb", 1, 10)
    );

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Exact hits survive rephrasing
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔍 Looking up rephrased queries...");
    for query in [
        "usb laptop charger",
        "the usb chargers for laptops",
        "USB charger, laptop!",
    ] {
        match engine.get(query, 1, 10).await {
            Some(hit) => println!("   └─ \"{query}\" → hit ({:?})", hit.kind),
            None => println!("   └─ \"{query}\" → miss"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Fuzzy fallback from keyword overlap
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🌀 Fuzzy lookup: \"laptop charger usb cable\" (3-of-4 overlap)...");
    match engine.get("laptop charger usb cable", 1, 10).await {
        Some(hit) => {
            if let HitKind::Fuzzy {
                similarity,
                original_key,
            } = &hit.kind
            {
                println!("   └─ Served from {original_key} (similarity {similarity:.2})");
            }
            println!("   └─ Data: {}", hit.data);
        }
        None => println!("   └─ miss"),
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Introspection
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📊 Keyword statistics:");
    for stat in engine.keyword_statistics(5).await {
        println!(
            "   └─ {} (freq {}, entries {})",
            stat.keyword, stat.frequency, stat.associated_entry_count
        );
    }

    let info = engine.cache_info().await;
    println!("\n📈 Cache info:");
    println!("   └─ Entries: {}/{}", info.total_entries, info.max_entries);
    println!("   └─ Utilization: {:.1}%", info.utilization_percentage);

    let metrics = engine.cache_metrics().await;
    println!("\n🎯 Hit metrics:");
    println!("   └─ Normalized: {}", metrics.normalized_hits);
    println!("   └─ Fuzzy:      {}", metrics.fuzzy_hits);
    println!("   └─ Misses:     {}", metrics.misses);
    println!("   └─ Hit rate:   {:.0}%", metrics.hit_rate * 100.0);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}
