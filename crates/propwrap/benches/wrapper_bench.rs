//! Benchmarks for wrapper access paths.
//!
//! Run with: cargo bench -p propwrap --bench wrapper_bench

use criterion::{Criterion, criterion_group, criterion_main};
use propwrap::{MemoryStore, SharedWrapper, ValueWrapper};
use std::hint::black_box;

fn bench_clamped(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrapper/clamped");
    let mut w = ValueWrapper::clamped(0i64, 0..=150).expect("valid range");

    group.bench_function("get", |b| b.iter(|| black_box(w.value())));
    group.bench_function("get_projected", |b| {
        b.iter(|| black_box(w.get_projected().expect("configured")))
    });
    group.bench_function("set", |b| {
        let mut i = 0i64;
        b.iter(|| {
            i = (i + 37) % 400;
            w.assign(black_box(i));
        })
    });

    group.finish();
}

fn bench_store_backed(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrapper/store_backed");
    let store = MemoryStore::<u64>::new();
    let mut w = ValueWrapper::store_backed(&store, "bench.key", 0u64);

    group.bench_function("get_default", |b| {
        b.iter(|| black_box(w.get().expect("infallible")))
    });
    group.bench_function("set_then_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = i.wrapping_add(1);
            w.set(i).expect("infallible");
            black_box(w.get().expect("infallible"))
        })
    });

    group.finish();
}

fn bench_shared(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrapper/shared");
    let shared = SharedWrapper::new(ValueWrapper::clamped(0i64, 0..=150).expect("valid range"));

    group.bench_function("get_uncontended", |b| {
        b.iter(|| black_box(shared.get().expect("infallible")))
    });
    group.bench_function("update_uncontended", |b| {
        b.iter(|| shared.update(|v| (v + 1) % 200).expect("infallible"))
    });

    group.finish();
}

criterion_group!(benches, bench_clamped, bench_store_backed, bench_shared);
criterion_main!(benches);
