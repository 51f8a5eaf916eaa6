//! Benchmarks for reindexer table and index conversions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use discrete_domain::{DomainRegistry, JointDomainIndexer};
use domain_reindex::Reindexer;

fn cube(registry: &DomainRegistry, dims: usize, size: i64) -> JointDomainIndexer {
    let d = registry.int_range(0, size - 1, 1).unwrap();
    registry.indexer(&vec![d; dims]).unwrap()
}

fn bench_dense_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_conversions");
    let registry = DomainRegistry::new();

    for size in [4, 8, 16] {
        let from = cube(&registry, 4, size);
        let weights: Vec<f64> = (0..from.cardinality().unwrap()).map(|i| i as f64).collect();

        let remove_front = Reindexer::remover(&registry, &from, &[0]).unwrap();
        group.bench_with_input(BenchmarkId::new("remove_front", size), &size, |b, _| {
            b.iter(|| remove_front.convert_dense_weights(black_box(&weights)))
        });

        let remove_middle = Reindexer::remover(&registry, &from, &[1, 2]).unwrap();
        group.bench_with_input(BenchmarkId::new("remove_middle", size), &size, |b, _| {
            b.iter(|| remove_middle.convert_dense_weights(black_box(&weights)))
        });

        let reverse = Reindexer::reorder(&registry, &from, &[3, 2, 1, 0]).unwrap();
        group.bench_with_input(BenchmarkId::new("reverse", size), &size, |b, _| {
            b.iter(|| reverse.convert_dense_weights(black_box(&weights)))
        });

        let condition =
            Reindexer::conditioner(&registry, &from, &[None, Some(1), None, None]).unwrap();
        group.bench_with_input(BenchmarkId::new("condition_chain", size), &size, |b, _| {
            b.iter(|| condition.convert_dense_energies(black_box(&weights)))
        });
    }

    group.finish();
}

fn bench_sparse_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_conversions");
    let registry = DomainRegistry::new();

    for size in [8, 16] {
        let from = cube(&registry, 4, size);
        let old_sparse: Vec<usize> = (0..from.cardinality().unwrap()).step_by(7).collect();
        let values: Vec<f64> = old_sparse.iter().map(|&j| j as f64).collect();
        let r = Reindexer::remover(&registry, &from, &[2]).unwrap();
        let new_sparse = r.convert_sparse_to_joint_index(&old_sparse).unwrap();

        group.bench_with_input(BenchmarkId::new("sparse_to_joint", size), &size, |b, _| {
            b.iter(|| r.convert_sparse_to_joint_index(black_box(&old_sparse)))
        });
        group.bench_with_input(BenchmarkId::new("sparse_weights", size), &size, |b, _| {
            b.iter(|| r.convert_sparse_weights(black_box(&values), &old_sparse, &new_sparse))
        });
    }

    group.finish();
}

fn bench_index_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_conversions");
    let registry = DomainRegistry::new();
    let from = cube(&registry, 6, 5);

    let fast = Reindexer::remover(&registry, &from, &[0]).unwrap();
    group.bench_function("joint_fast", |b| {
        b.iter(|| fast.convert_joint_index(black_box(1234), 0))
    });

    let slow = Reindexer::reorder(&registry, &from, &[5, 4, 3, 2, 1, 0]).unwrap();
    group.bench_function("joint_tuple_route", |b| {
        b.iter(|| slow.convert_joint_index(black_box(1234), 0))
    });

    let indices = [1, 2, 3, 4, 0, 1];
    group.bench_function("indices", |b| {
        b.iter(|| slow.convert_indices(black_box(&indices), &[]))
    });

    group.bench_function("scratch", |b| {
        b.iter(|| {
            let mut scratch = slow.acquire_scratch();
            scratch.from_mut().copy_from_slice(black_box(&indices));
            slow.convert_scratch(&mut scratch);
            let first = scratch.to()[0];
            first
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_dense_conversions,
    bench_sparse_conversions,
    bench_index_conversions,
);
criterion_main!(benches);
