//! Criterion micro-benchmarks for segdeque end operations, indexing, and
//! middle insertion, with `VecDeque` as the baseline.

use std::collections::VecDeque;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use segdeque::SegDeque;
use segdeque_bench::{apply_to_segdeque, apply_to_vecdeque, mixed_workload, random_indices};

const N: u64 = 100_000;

fn bench_push_back(c: &mut Criterion) {
    c.bench_function("segdeque_push_back_100k", |b| {
        b.iter(|| {
            let mut d = SegDeque::new();
            for i in 0..N {
                d.push_back(black_box(i)).unwrap();
            }
            black_box(d.len());
        });
    });
    c.bench_function("vecdeque_push_back_100k", |b| {
        b.iter(|| {
            let mut d = VecDeque::new();
            for i in 0..N {
                d.push_back(black_box(i));
            }
            black_box(d.len());
        });
    });
}

fn bench_push_front(c: &mut Criterion) {
    c.bench_function("segdeque_push_front_100k", |b| {
        b.iter(|| {
            let mut d = SegDeque::new();
            for i in 0..N {
                d.push_front(black_box(i)).unwrap();
            }
            black_box(d.len());
        });
    });
}

fn bench_mixed(c: &mut Criterion) {
    let steps = mixed_workload(42, 100_000);
    c.bench_function("segdeque_mixed_ends_100k", |b| {
        b.iter(|| {
            let mut d = SegDeque::new();
            black_box(apply_to_segdeque(&mut d, &steps));
        });
    });
    c.bench_function("vecdeque_mixed_ends_100k", |b| {
        b.iter(|| {
            let mut d = VecDeque::new();
            black_box(apply_to_vecdeque(&mut d, &steps));
        });
    });
}

fn bench_random_access(c: &mut Criterion) {
    let seg: SegDeque<u64> = (0..N).collect();
    let vec: VecDeque<u64> = (0..N).collect();
    let indices = random_indices(7, N as usize, 10_000);
    c.bench_function("segdeque_index_10k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &i in &indices {
                sum = sum.wrapping_add(seg[i]);
            }
            black_box(sum);
        });
    });
    c.bench_function("vecdeque_index_10k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &i in &indices {
                sum = sum.wrapping_add(vec[i]);
            }
            black_box(sum);
        });
    });
}

fn bench_iterate(c: &mut Criterion) {
    let seg: SegDeque<u64> = (0..N).collect();
    c.bench_function("segdeque_iter_sum_100k", |b| {
        b.iter(|| black_box(seg.iter().sum::<u64>()));
    });
}

fn bench_insert_middle(c: &mut Criterion) {
    c.bench_function("segdeque_insert_middle_2k", |b| {
        b.iter(|| {
            let mut d: SegDeque<u64> = (0..2_000).collect();
            for i in 0..2_000 {
                let mid = d.len() / 2;
                d.insert(mid, black_box(i)).unwrap();
            }
            black_box(d.len());
        });
    });
}

fn bench_clear_refill(c: &mut Criterion) {
    let mut d: SegDeque<u64> = (0..N).collect();
    c.bench_function("segdeque_clear_refill_100k", |b| {
        b.iter(|| {
            d.clear();
            d.extend(0..N);
            black_box(d.len());
        });
    });
}

criterion_group!(
    benches,
    bench_push_back,
    bench_push_front,
    bench_mixed,
    bench_random_access,
    bench_iterate,
    bench_insert_middle,
    bench_clear_refill
);
criterion_main!(benches);
