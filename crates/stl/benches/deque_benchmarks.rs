//! Deque end operations, middle insertion and distance dispatch

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use nebula_stl::iter::{self, InputOnly};
use nebula_stl::{Deque, FreeListAllocator, SystemAllocator};
use std::collections::VecDeque;
use std::hint::black_box;

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");
    group.throughput(Throughput::Elements(10_000));

    group.bench_function("deque_default_pool", |b| {
        b.iter(|| {
            let mut deque = Deque::new();
            for i in 0..10_000u64 {
                deque.push_back(i);
            }
            while let Some(v) = deque.pop_front() {
                black_box(v);
            }
        });
    });

    group.bench_function("deque_system", |b| {
        b.iter(|| {
            let mut deque = Deque::new_in(SystemAllocator::new());
            for i in 0..10_000u64 {
                deque.push_back(i);
            }
            while let Some(v) = deque.pop_front() {
                black_box(v);
            }
        });
    });

    // Baseline
    group.bench_function("vec_deque", |b| {
        b.iter(|| {
            let mut deque = VecDeque::new();
            for i in 0..10_000u64 {
                deque.push_back(i);
            }
            while let Some(v) = deque.pop_front() {
                black_box(v);
            }
        });
    });

    group.finish();
}

fn bench_middle_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("middle_insert");

    for len in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("insert_erase", len), &len, |b, &len| {
            let pool = FreeListAllocator::new();
            let mut deque = Deque::new_in(&pool);
            deque.extend(0..len as u32);
            b.iter(|| {
                deque.insert(len / 3, 7).unwrap();
                black_box(deque.erase(len / 3).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance");
    let deque: Deque<u32> = (0..100_000).collect();

    group.bench_function("random_access", |b| {
        b.iter(|| iter::distance(black_box(&deque.begin()), black_box(&deque.end())));
    });

    group.bench_function("input_only", |b| {
        let first = InputOnly::new(deque.begin());
        let last = InputOnly::new(deque.end());
        b.iter(|| iter::distance(black_box(&first), black_box(&last)));
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_middle_insert, bench_distance);

criterion_main!(benches);
