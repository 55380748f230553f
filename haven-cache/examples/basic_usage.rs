//! Basic Cache Usage Example
//!
//! Demonstrates the set/get/preload workflow over the default strategies,
//! with a simulated durable store standing in for a real backend.
//!
//! Run with:
//!   cargo run --example basic_usage

use std::sync::Arc;

use haven_cache::{
    init_telemetry, spawn_auto_optimizer, CacheCoordinator, Priority, SimConfig, SimDurableStore,
    TelemetryConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_telemetry(&TelemetryConfig::default())?;
    println!("=== Haven Cache: Basic Usage ===\n");

    let durable = SimDurableStore::new(SimConfig::with_seed(42));
    let cache: Arc<CacheCoordinator<String>> = Arc::new(
        CacheCoordinator::builder()
            .with_durable_store(Arc::new(durable.clone()))
            .build()?,
    );
    let optimizer = spawn_auto_optimizer(&cache);
    println!("✓ Strategies: {:?}\n", cache.strategy_names());

    // === Write ===
    println!("--- Writing entries ---");
    cache.set("user_data", "u1", "Alex".to_string()).await?;
    cache.set("session_tokens", "t1", "token-abc".to_string()).await?;
    cache
        .set_with_priority("crisis_resources", "hotline", "988".to_string(), Priority::Critical)
        .await?;
    println!("  Durable store now holds {} entries\n", durable.len());

    // === Preload ===
    println!("--- Preloading crisis resources ---");
    let summary = cache
        .preload("crisis_resources", ["shelter", "clinic"], |key| async move {
            Ok::<_, String>(format!("directions to the nearest {key}"))
        })
        .await?;
    println!("  Loaded {:?}\n", summary.loaded);

    // === Read ===
    println!("--- Reading entries ---");
    for (strategy, key) in [("user_data", "u1"), ("crisis_resources", "shelter"), ("api_responses", "r1")] {
        match cache.get(strategy, key).await? {
            Some(value) => println!("  {strategy}/{key} -> {value}"),
            None => println!("  {strategy}/{key} -> miss"),
        }
    }

    // === Restart ===
    println!("\n--- Simulating a restart ---");
    let restarted: CacheCoordinator<String> = CacheCoordinator::builder()
        .with_durable_store(Arc::new(durable.clone()))
        .build()?;
    println!(
        "  user_data/u1 after restart -> {:?}",
        restarted.get("user_data", "u1").await?
    );

    // === Metrics ===
    println!("\n--- Metrics ---");
    for (name, metrics) in cache.all_metrics() {
        println!(
            "  {name:<18} hits={} misses={} hit_rate={:.2} entries={}",
            metrics.hits,
            metrics.misses,
            metrics.hit_rate(),
            metrics.entry_count
        );
    }
    println!("  Total memory: {} bytes", cache.memory_usage());

    if let Some(handle) = optimizer {
        handle.abort();
    }
    Ok(())
}
