//! Parallel block transaction executor driven by predeclared access lists.
//!
//! Transactions in a block declare up front which accounts they touch. This
//! crate turns those declarations into a deterministic parallel schedule:
//! per-account FIFO locks grant each shared account in block order, a
//! bounded task group runs one task per transaction, and a shared mutex
//! serializes the individual state operations underneath.
//!
//! # Core Components
//!
//! - **FifoLock / AccessListLocks**: per-account queues granting access in
//!   the order transactions appear in the block
//! - **BoundedGroup**: worker pool with first-error propagation and
//!   cooperative cancellation
//! - **TxStateView**: transaction-scoped front end to the shared state
//!   store, carrying the journal, access list, and refund counter
//! - **BlockProcessor**: orchestrates locks, tasks, the VM, the gas pool,
//!   and receipt assembly for a whole block
//!
//! # Algorithm Overview
//!
//! 1. The lock set is built in one pass over the block, fixing the grant
//!    order of every account before any worker races
//! 2. Each task acquires its declared locks, executes through its own state
//!    view, and releases
//! 3. Any wait edge points from a higher block index to a lower one, so the
//!    wait graph is acyclic and the schedule is deadlock-free
//! 4. After the join, cumulative gas and the block log list are recomputed
//!    in block order and validated against the block gas limit

pub mod fifo_lock;
pub mod gas_pool;
pub mod journal;
pub mod lock_set;
pub mod processor;
pub mod state;
pub mod task_group;
#[cfg(test)]
mod test_support;
pub mod types;
pub mod view;
pub mod vm;

pub use fifo_lock::FifoLock;
pub use gas_pool::{GasLimitReached, GasPool};
pub use journal::TxContext;
pub use lock_set::AccessListLocks;
pub use processor::{
    ApplyError, BlockProcessor, ChainConfig, ConsensusEngine, ForkRewrite, ProcessError,
    ProcessOutput, RewardEngine, VmConfig,
};
pub use state::{Account, State};
pub use task_group::{BoundedGroup, CancelToken};
pub use types::{
    AccessList, AccessListItem, Block, Header, Message, Receipt, ReceiptStatus, SignerError,
    Transaction, TxIndex, UnsignedTransaction,
};
pub use view::{SharedState, TxStateView};
pub use vm::{BlockEnv, MessageResult, TransferVm, Vm, VmError};
