//! Cache hot-path benchmark: insert and handoff throughput.
//!
//! Each iteration inserts one line and immediately drains the batch so the
//! resident set stays flat across the run.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rrdsink_core::{Config, FlushQueue, WriteCache};
use std::sync::Arc;

fn warm_cache() -> WriteCache {
    let queue = Arc::new(FlushQueue::new());
    let config = Config {
        cache_timeout: u64::MAX / 2,
        cache_flush_timeout: u64::MAX / 2,
        ..Config::default()
    };
    WriteCache::new(&config, queue)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_insert");

    group.bench_function("single_path", |b| {
        let cache = warm_cache();
        let mut t = 1u64;

        b.iter(|| {
            t += 1;
            cache
                .insert(black_box("h1/cpu-0/cpu-user.rrd"), format!("{t}:1"), t)
                .unwrap();
            black_box(cache.take_batch("h1/cpu-0/cpu-user.rrd"));
        });
    });

    group.bench_function("many_paths", |b| {
        let cache = warm_cache();
        let paths: Vec<String> = (0..256)
            .map(|i| format!("h1/cpu-{i}/cpu-user.rrd"))
            .collect();
        let mut t = 1u64;

        b.iter(|| {
            t += 1;
            let path = &paths[(t % 256) as usize];
            cache.insert(black_box(path), format!("{t}:1"), t).unwrap();
            black_box(cache.take_batch(path));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insert);
criterion_main!(benches);
