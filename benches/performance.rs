//! Performance benchmarks for the sharded map and the state log.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shardlog::{
    ChangeFilter, KnownState, ShardedMap, StatePayload, StatesMan, StatesManConfig, Timestamp,
};
use std::sync::Arc;
use std::thread;

/// Benchmark contended writes with varying shard counts
fn bench_contended_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_set");
    const THREADS: usize = 4;
    const OPS: usize = 2_000;

    for shards in [1, 4, 32, 128] {
        group.bench_with_input(BenchmarkId::new("shards", shards), &shards, |b, &shards| {
            b.iter(|| {
                let map: Arc<ShardedMap<usize, usize>> = Arc::new(ShardedMap::new(shards));
                let handles: Vec<_> = (0..THREADS)
                    .map(|t| {
                        let map = Arc::clone(&map);
                        thread::spawn(move || {
                            for i in 0..OPS {
                                map.set(t * OPS + i, i);
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
                black_box(map.len());
            });
        });
    }

    group.finish();
}

/// Benchmark single-threaded lookups
fn bench_get(c: &mut Criterion) {
    let map: ShardedMap<String, u64> = ShardedMap::default();
    for i in 0..10_000u64 {
        map.set(format!("key-{}", i), i);
    }

    c.bench_function("get_hit", |b| {
        let key = "key-4242".to_string();
        b.iter(|| black_box(map.get(&key)));
    });
}

/// Benchmark recording with a draining consumer
fn bench_record_transition(c: &mut Criterion) {
    let sm = StatesMan::with_config(
        "bench",
        StatesManConfig {
            notification_capacity: 1024,
        },
    );
    let notes = sm.notifications();
    let mut i = 0i64;

    c.bench_function("record_transition", |b| {
        b.iter(|| {
            sm.record_transition(
                "worker",
                KnownState::Started,
                KnownState::Paused,
                Timestamp(i),
                StatePayload::new(),
            );
            i += 1;
            if notes.len() > 512 {
                notes.drain();
            }
        });
    });
}

/// Benchmark filtered queries over a populated log
fn bench_filtered_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered_query");

    for size in [1_000, 10_000] {
        let sm = StatesMan::with_config(
            "bench",
            StatesManConfig {
                notification_capacity: size,
            },
        );
        for i in 0..size {
            let to = KnownState::ALL[i % KnownState::ALL.len()];
            let name = format!("w{}", i % 16);
            sm.record_transition(&name, "", to, Timestamp(i as i64), StatePayload::new());
        }

        group.bench_with_input(BenchmarkId::new("log_size", size), &size, |b, _| {
            let filter = ChangeFilter::all().subsystem("w3").to_state(KnownState::Completed);
            b.iter(|| black_box(sm.filtered_state_changes(&filter)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_contended_set,
    bench_get,
    bench_record_transition,
    bench_filtered_query
);
criterion_main!(benches);
