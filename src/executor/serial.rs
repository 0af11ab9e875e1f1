//! Serial workload executor.
//!
//! The baseline strategy: every block runs on the processor's serial path,
//! one transaction at a time in block order.

use super::{execute_workload, ExecutionResult, Executor};
use crate::Workload;
use access_list_executor::{ProcessError, SharedState, VmConfig};

/// Executes blocks on the serial path.
///
/// # Example
///
/// ```
/// use exec_test::{Executor, SerialExecutor, Workload, WorkloadConfig};
///
/// let workload = Workload::generate(WorkloadConfig::default());
/// let state = workload.create_state();
///
/// let result = SerialExecutor.execute(state, &workload).unwrap();
/// println!("Successful: {}, Failed: {}", result.successful, result.failed);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl Executor for SerialExecutor {
    fn execute(
        &self,
        state: SharedState,
        workload: &Workload,
    ) -> Result<ExecutionResult, ProcessError> {
        execute_workload(&state, workload, &VmConfig::default())
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}
