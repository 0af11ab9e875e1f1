//! Comparison runner for the serial and access-list parallel executors.

use exec_test::{Executor, ParallelExecutor, SerialExecutor, Workload, WorkloadConfig};
use eyre::Result;
use std::time::Instant;

/// Configuration for a single benchmark run.
struct BenchmarkConfig {
    name: &'static str,
    conflict_factor: f64,
}

/// Results from a single benchmark run.
#[derive(Debug)]
struct BenchmarkResult {
    config_name: &'static str,
    executor_name: &'static str,
    successful: usize,
    failed: usize,
    used_gas: u64,
    duration_ms: f64,
    throughput_tps: f64,
}

impl BenchmarkResult {
    fn print_header() {
        println!(
            "{:<20} | {:<20} | {:<10} | {:<10} | {:<14} | {:<12} | {:<12}",
            "Config", "Executor", "Successful", "Failed", "Gas used", "Time (ms)", "TPS"
        );
        println!("{}", "-".repeat(115));
    }

    fn print(&self) {
        println!(
            "{:<20} | {:<20} | {:<10} | {:<10} | {:<14} | {:<12.2} | {:<12.0}",
            self.config_name,
            self.executor_name,
            self.successful,
            self.failed,
            self.used_gas,
            self.duration_ms,
            self.throughput_tps,
        );
    }
}

fn run<E: Executor>(
    executor: &E,
    config: &BenchmarkConfig,
    workload: &Workload,
) -> Result<BenchmarkResult> {
    let state = workload.create_state();
    let start = Instant::now();
    let result = executor.execute(state, workload)?;
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        config_name: config.name,
        executor_name: executor.name(),
        successful: result.successful,
        failed: result.failed,
        used_gas: result.used_gas,
        duration_ms: elapsed.as_secs_f64() * 1000.0,
        throughput_tps: result.total() as f64 / elapsed.as_secs_f64(),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let configs = vec![
        BenchmarkConfig {
            name: "No conflicts",
            conflict_factor: 0.0,
        },
        BenchmarkConfig {
            name: "25% conflicts",
            conflict_factor: 0.25,
        },
        BenchmarkConfig {
            name: "50% conflicts",
            conflict_factor: 0.5,
        },
        BenchmarkConfig {
            name: "75% conflicts",
            conflict_factor: 0.75,
        },
        BenchmarkConfig {
            name: "Full conflicts",
            conflict_factor: 1.0,
        },
    ];

    // Realistic blockchain parameters (scaled down for faster runs).
    let num_accounts = 50_000;
    let num_transactions = 2_500;
    let transactions_per_block = 625;

    println!("Block Execution Comparison");
    println!("  • Accounts: {num_accounts}");
    println!("  • Transactions per run: {num_transactions}");
    println!("  • Transactions per block: {transactions_per_block}");
    println!("  • Blocks: {}", num_transactions / transactions_per_block);
    println!();
    BenchmarkResult::print_header();

    let serial = SerialExecutor;
    let parallel = ParallelExecutor::default();

    for config in &configs {
        let workload_config = WorkloadConfig {
            num_accounts,
            num_transactions,
            transactions_per_block,
            conflict_factor: config.conflict_factor,
            seed: 42,
            chain_id: 1,
        };
        let workload = Workload::generate(workload_config);

        run(&serial, config, &workload)?.print();
        run(&parallel, config, &workload)?.print();
    }

    println!();
    println!(
        "Parallel executor ran with {} workers",
        parallel.workers
    );
    Ok(())
}
