//! Benchmark comparing serial and access-list parallel block execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use exec_test::{Executor, ParallelExecutor, SerialExecutor, Workload, WorkloadConfig};

/// Benchmarks both executors with different conflict factors.
fn bench_conflict_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_execution/conflict_levels");

    let conflict_factors = [0.0, 0.25, 0.5, 0.75, 1.0];
    let num_transactions = 1000;
    let serial = SerialExecutor;
    let parallel = ParallelExecutor::new(4);

    for &conflict_factor in &conflict_factors {
        let config = WorkloadConfig {
            num_accounts: 1000,
            num_transactions,
            transactions_per_block: 250,
            conflict_factor,
            seed: 42,
            chain_id: 1,
        };

        // Pre-generate workload (including signing) outside the benchmark loop.
        let workload = Workload::generate(config);
        let label = format!("conflict_{:.0}%", conflict_factor * 100.0);

        group.throughput(Throughput::Elements(num_transactions as u64));
        group.bench_with_input(
            BenchmarkId::new("serial", &label),
            &workload,
            |b, workload| {
                b.iter(|| {
                    let state = workload.create_state();
                    let result = serial.execute(state, black_box(workload)).unwrap();
                    result.successful
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("parallel", &label),
            &workload,
            |b, workload| {
                b.iter(|| {
                    let state = workload.create_state();
                    let result = parallel.execute(state, black_box(workload)).unwrap();
                    result.successful
                });
            },
        );
    }

    group.finish();
}

/// Benchmarks the parallel executor with different worker counts.
fn bench_worker_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_execution/worker_counts");

    let num_transactions = 1000;
    let config = WorkloadConfig {
        num_accounts: 10_000,
        num_transactions,
        transactions_per_block: 250,
        conflict_factor: 0.25,
        seed: 42,
        chain_id: 1,
    };
    let workload = Workload::generate(config);

    for workers in [1, 2, 4, 8] {
        let executor = ParallelExecutor::new(workers);
        group.throughput(Throughput::Elements(num_transactions as u64));
        group.bench_with_input(
            BenchmarkId::new("parallel", workers),
            &workload,
            |b, workload| {
                b.iter(|| {
                    let state = workload.create_state();
                    let result = executor.execute(state, black_box(workload)).unwrap();
                    result.successful
                });
            },
        );
    }

    group.finish();
}

/// Benchmarks both executors with different block sizes.
fn bench_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_execution/block_sizes");

    let serial = SerialExecutor;
    let parallel = ParallelExecutor::new(4);

    for block_size in [100, 500, 1000] {
        let config = WorkloadConfig {
            num_accounts: 10_000,
            num_transactions: block_size,
            transactions_per_block: block_size,
            conflict_factor: 0.0,
            seed: 42,
            chain_id: 1,
        };
        let workload = Workload::generate(config);

        group.throughput(Throughput::Elements(block_size as u64));
        group.bench_with_input(
            BenchmarkId::new("serial", block_size),
            &workload,
            |b, workload| {
                b.iter(|| {
                    let state = workload.create_state();
                    let result = serial.execute(state, black_box(workload)).unwrap();
                    result.successful
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("parallel", block_size),
            &workload,
            |b, workload| {
                b.iter(|| {
                    let state = workload.create_state();
                    let result = parallel.execute(state, black_box(workload)).unwrap();
                    result.successful
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_conflict_levels,
    bench_worker_counts,
    bench_block_sizes
);
criterion_main!(benches);
