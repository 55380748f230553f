//! Coordinator Benchmarks
//!
//! Benchmarks for core CacheCoordinator operations using Criterion.
//!
//! These benchmarks validate performance of:
//! - Set operations, with and without eviction
//! - Get operations per eviction policy
//! - Victim selection at capacity
//!
//! Run with: cargo bench --bench coordinator

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use haven_cache::cache::CacheStrategy;
use haven_cache::config::CacheCoordinatorConfig;
use haven_cache::dst::SimClock;
use haven_cache::{CacheCoordinator, EvictionPolicy, SimDurableStore, SimConfig};
use tokio::runtime::Runtime;

fn coordinator(policy: EvictionPolicy, max_entries: usize) -> CacheCoordinator<String> {
    CacheCoordinator::builder()
        .with_config(
            CacheCoordinatorConfig::empty()
                .without_auto_optimization()
                .with_strategy(
                    CacheStrategy::new("bench")
                        .with_max_entries(max_entries)
                        .with_eviction_policy(policy),
                ),
        )
        .with_clock(Arc::new(SimClock::at_ms(1000)))
        .build()
        .unwrap()
}

// =============================================================================
// Set Benchmarks
// =============================================================================

fn bench_set_without_eviction(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = coordinator(EvictionPolicy::Lru, 1_000_000);
    let mut i = 0u64;

    c.bench_function("set_without_eviction", |b| {
        b.iter(|| {
            i += 1;
            rt.block_on(async {
                cache
                    .set("bench", &format!("k{i}"), black_box("value".to_string()))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_set_at_capacity(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("set_at_capacity");

    for policy in EvictionPolicy::ALL {
        let cache = coordinator(policy, 1000);
        rt.block_on(async {
            for i in 0..1000 {
                cache.set("bench", &format!("seed{i}"), "v".to_string()).await.unwrap();
            }
        });

        let mut i = 0u64;
        group.bench_with_input(BenchmarkId::from_parameter(policy), &policy, |b, _| {
            b.iter(|| {
                i += 1;
                rt.block_on(async {
                    cache
                        .set("bench", &format!("k{i}"), black_box("value".to_string()))
                        .await
                        .unwrap();
                });
            });
        });
    }

    group.finish();
}

// =============================================================================
// Get Benchmarks
// =============================================================================

fn bench_get_hit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = coordinator(EvictionPolicy::Lru, 1000);
    rt.block_on(async {
        for i in 0..1000 {
            cache.set("bench", &format!("k{i}"), format!("v{i}")).await.unwrap();
        }
    });
    let mut i = 0usize;

    c.bench_function("get_hit", |b| {
        b.iter(|| {
            i = (i + 1) % 1000;
            rt.block_on(async {
                black_box(cache.get("bench", &format!("k{i}")).await.unwrap());
            });
        });
    });
}

fn bench_get_rehydrate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let durable = SimDurableStore::new(SimConfig::with_seed(42));
    let config = CacheCoordinatorConfig::empty()
        .without_auto_optimization()
        .with_strategy(CacheStrategy::new("bench").with_persistence(true));

    let writer: CacheCoordinator<String> = CacheCoordinator::builder()
        .with_config(config.clone())
        .with_durable_store(Arc::new(durable.clone()))
        .build()
        .unwrap();
    rt.block_on(async {
        writer.set("bench", "k", "v".repeat(256)).await.unwrap();
    });

    c.bench_function("get_rehydrate", |b| {
        b.iter(|| {
            let reader: CacheCoordinator<String> = CacheCoordinator::builder()
                .with_config(config.clone())
                .with_durable_store(Arc::new(durable.clone()))
                .build()
                .unwrap();
            rt.block_on(async {
                black_box(reader.get("bench", "k").await.unwrap());
            });
        });
    });
}

criterion_group!(
    benches,
    bench_set_without_eviction,
    bench_set_at_capacity,
    bench_get_hit,
    bench_get_rehydrate
);
criterion_main!(benches);
