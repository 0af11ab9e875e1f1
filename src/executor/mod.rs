//! Block execution strategies.
//!
//! This module provides the [`Executor`] trait and the serial and parallel
//! implementations, both backed by the same block processor.

mod parallel;
mod serial;

pub use parallel::ParallelExecutor;
pub use serial::SerialExecutor;

use crate::Workload;
use access_list_executor::{
    BlockProcessor, ChainConfig, ProcessError, RewardEngine, SharedState, TransferVm, VmConfig,
};
use alloy_primitives::U256;

/// Block reward paid by the consensus engine in these runs: 2 ETH.
pub const BLOCK_REWARD: u128 = 2_000_000_000_000_000_000;

/// Result of executing a workload.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Number of successfully executed transactions.
    pub successful: usize,
    /// Number of failed (reverted) transactions.
    pub failed: usize,
    /// Total gas used across all blocks.
    pub used_gas: u64,
}

impl ExecutionResult {
    /// Total number of transactions processed.
    pub fn total(&self) -> usize {
        self.successful + self.failed
    }
}

/// Trait for different workload execution strategies.
///
/// Both implementations process the workload's blocks in order against the
/// given state; they differ only in the path the block processor takes.
pub trait Executor {
    /// Executes the workload on the given state.
    fn execute(
        &self,
        state: SharedState,
        workload: &Workload,
    ) -> Result<ExecutionResult, ProcessError>;

    /// Short identifier for benchmark output.
    fn name(&self) -> &'static str;
}

/// Runs every block of the workload through a fresh processor with the
/// given configuration, tallying receipt statuses.
fn execute_workload(
    state: &SharedState,
    workload: &Workload,
    vm_config: &VmConfig,
) -> Result<ExecutionResult, ProcessError> {
    let processor = BlockProcessor::new(
        ChainConfig {
            chain_id: workload.config.chain_id,
            ..ChainConfig::default()
        },
        RewardEngine {
            block_reward: U256::from(BLOCK_REWARD),
        },
        TransferVm,
    );

    let mut result = ExecutionResult::default();
    for block in &workload.blocks {
        let output = processor.process(block, state, vm_config)?;
        for receipt in &output.receipts {
            if receipt.status.is_success() {
                result.successful += 1;
            } else {
                result.failed += 1;
            }
        }
        result.used_gas += output.used_gas;
    }
    Ok(result)
}
