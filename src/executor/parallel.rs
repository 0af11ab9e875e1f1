//! Access-list parallel workload executor.

use super::{execute_workload, ExecutionResult, Executor};
use crate::Workload;
use access_list_executor::{ProcessError, SharedState, VmConfig};

/// Executes blocks on the parallel path: transactions run concurrently under
/// the FIFO lock discipline their access lists declare.
#[derive(Debug, Clone, Copy)]
pub struct ParallelExecutor {
    /// Worker cap of the per-block task group.
    pub workers: usize,
}

impl ParallelExecutor {
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    fn vm_config(&self) -> VmConfig {
        VmConfig {
            require_access_list: true,
            workers: self.workers,
            backlog: self.workers * 4,
        }
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self {
            workers: VmConfig::default().workers,
        }
    }
}

impl Executor for ParallelExecutor {
    fn execute(
        &self,
        state: SharedState,
        workload: &Workload,
    ) -> Result<ExecutionResult, ProcessError> {
        execute_workload(&state, workload, &self.vm_config())
    }

    fn name(&self) -> &'static str {
        "access_list_parallel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SerialExecutor, WorkloadConfig};

    #[test]
    fn test_parallel_executor() {
        let config = WorkloadConfig {
            num_accounts: 20,
            num_transactions: 40,
            transactions_per_block: 20,
            conflict_factor: 0.5,
            seed: 42,
            chain_id: 1,
        };

        let workload = Workload::generate(config);
        let state = workload.create_state();

        let result = ParallelExecutor::new(4)
            .execute(state, &workload)
            .expect("workload executes");

        assert_eq!(result.successful, 40);
        assert_eq!(result.failed, 0);
    }

    #[test]
    fn test_parallel_matches_serial() {
        for conflict_factor in [0.0, 0.5, 1.0] {
            let config = WorkloadConfig {
                num_accounts: 25,
                num_transactions: 50,
                transactions_per_block: 25,
                conflict_factor,
                seed: 7,
                chain_id: 1,
            };
            let workload = Workload::generate(config);

            let serial_state = workload.create_state();
            let serial = SerialExecutor
                .execute(serial_state.clone(), &workload)
                .expect("serial run succeeds");

            let parallel_state = workload.create_state();
            let parallel = ParallelExecutor::new(4)
                .execute(parallel_state.clone(), &workload)
                .expect("parallel run succeeds");

            assert_eq!(serial.successful, parallel.successful);
            assert_eq!(serial.failed, parallel.failed);
            assert_eq!(serial.used_gas, parallel.used_gas);
            assert_eq!(
                serial_state.lock().state_digest(),
                parallel_state.lock().state_digest(),
                "post-state diverged at conflict factor {conflict_factor}"
            );
        }
    }
}
