//! Benchmarks for the set engines
//!
//! Sequential single-thread costs: the list's linear walks against the
//! trees' logarithmic descents, and the range query's propagation cost.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ordset_engines::{HarrisList, LeafTree, RangeSumTree};

fn bench_list_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_insert");

    for size in [16, 256, 4096].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let list = HarrisList::new();
                for k in 0..size {
                    list.insert(k);
                }
            });
        });
    }

    group.finish();
}

fn bench_list_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_contains");

    for size in [16, 256, 4096].iter() {
        let list = HarrisList::new();
        for k in 0..*size {
            list.insert(k);
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                black_box(list.contains(size / 2));
            });
        });
    }

    group.finish();
}

fn bench_tree_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_insert");

    for size in [1_000, 16_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let tree = LeafTree::new();
                for k in 0..size {
                    tree.insert(k, k);
                }
            });
        });
    }

    group.finish();
}

fn bench_tree_mixed(c: &mut Criterion) {
    c.bench_function("tree_mixed", |b| {
        let tree = LeafTree::new();
        for k in 0..10_000 {
            tree.insert(k, k);
        }

        let mut counter = 0i64;
        b.iter(|| {
            match counter % 3 {
                0 => {
                    tree.insert(10_000 + counter, counter);
                }
                1 => {
                    tree.remove(counter % 10_000);
                }
                _ => {
                    black_box(tree.contains(counter % 10_000));
                }
            }
            counter += 1;
        });
    });
}

fn bench_range_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_sum");

    for size in [1_000, 16_000].iter() {
        let tree = RangeSumTree::new();
        for k in 0..*size {
            tree.insert(k, k);
        }
        // Settle the inboxes so the steady-state query cost is measured.
        tree.sum(0, *size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                black_box(tree.sum(size / 4, size / 2));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_list_insert,
    bench_list_contains,
    bench_tree_insert,
    bench_tree_mixed,
    bench_range_sum
);
criterion_main!(benches);
