//! Block processing: the serial baseline and the access-list parallel path.
//!
//! The parallel path builds the per-block lock set from the transactions'
//! declared access lists, submits one task per transaction into a bounded
//! group, and lets the FIFO locks impose block order on every shared
//! account. Receipts land in per-index slots; cumulative gas and the block
//! log list are recomputed in block order after the join, because task
//! completion order is not deterministic.

use crate::gas_pool::GasPool;
use crate::journal::TxContext;
use crate::lock_set::AccessListLocks;
use crate::state::State;
use crate::task_group::{BoundedGroup, CancelToken};
use crate::types::{
    logs_bloom, Block, Header, Receipt, ReceiptStatus, SignerError, Transaction, TxIndex,
};
use crate::view::{SharedState, TxStateView};
use crate::vm::{BlockEnv, Vm, VmError};
use alloy_primitives::{Log, B256, U256};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, trace};

/// A one-off state mutation applied before executing the block at `block`,
/// the hard-fork rewrite hook.
#[derive(Debug, Clone, Copy)]
pub struct ForkRewrite {
    pub block: u64,
    pub apply: fn(&mut State, &mut TxContext),
}

/// Chain-level configuration: fork schedule and the optional rewrite hook.
#[derive(Debug, Clone, Copy)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub byzantium_block: Option<u64>,
    pub eip158_block: Option<u64>,
    pub fork_rewrite: Option<ForkRewrite>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            byzantium_block: Some(0),
            eip158_block: Some(0),
            fork_rewrite: None,
        }
    }
}

impl ChainConfig {
    pub fn is_byzantium(&self, number: u64) -> bool {
        self.byzantium_block.is_some_and(|fork| fork <= number)
    }

    pub fn is_eip158(&self, number: u64) -> bool {
        self.eip158_block.is_some_and(|fork| fork <= number)
    }
}

/// Execution configuration for one processing run.
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Selects the parallel path; transactions must then declare complete
    /// access lists.
    pub require_access_list: bool,
    /// Worker cap of the task group.
    pub workers: usize,
    /// Task queue capacity before submission blocks.
    pub backlog: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        Self {
            require_access_list: false,
            workers,
            backlog: workers * 4,
        }
    }
}

impl VmConfig {
    pub fn parallel() -> Self {
        Self {
            require_access_list: true,
            ..Self::default()
        }
    }
}

/// Applies consensus extras (block rewards) after all transactions ran.
pub trait ConsensusEngine {
    fn finalize(
        &self,
        header: &Header,
        state: &mut State,
        ctx: &mut TxContext,
        transactions: &[Transaction],
        ommers: &[Header],
    );
}

/// Pays a fixed reward to the coinbase, plus the classic ommer shares.
#[derive(Debug, Clone)]
pub struct RewardEngine {
    pub block_reward: U256,
}

impl ConsensusEngine for RewardEngine {
    fn finalize(
        &self,
        header: &Header,
        state: &mut State,
        ctx: &mut TxContext,
        _transactions: &[Transaction],
        ommers: &[Header],
    ) {
        let mut reward = self.block_reward;
        for ommer in ommers {
            state.add_balance(ctx, ommer.coinbase, self.block_reward / U256::from(2));
            reward += self.block_reward >> 5;
        }
        state.add_balance(ctx, header.coinbase, reward);
        state.finalise(ctx, true);
    }
}

/// A transaction-level failure, wrapped with the offending index and hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error(transparent)]
    Vm(#[from] VmError),
}

/// Block-level processing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("could not apply tx {index} [{hash}]: {source}")]
    Apply {
        index: TxIndex,
        hash: B256,
        source: ApplyError,
    },
    #[error("block exceeded gas limit ({limit}) with ({used})")]
    GasLimitExceeded { limit: u64, used: u64 },
}

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Receipts in block order.
    pub receipts: Vec<Receipt>,
    /// All logs, concatenated in block order.
    pub logs: Vec<Log>,
    /// Total gas used by the block.
    pub used_gas: u64,
}

/// Transitions state from one point to another by running a block's
/// transactions and applying consensus rewards.
pub struct BlockProcessor<E, V> {
    config: ChainConfig,
    engine: E,
    vm: Arc<V>,
}

impl<E: ConsensusEngine, V: Vm + 'static> BlockProcessor<E, V> {
    pub fn new(config: ChainConfig, engine: E, vm: V) -> Self {
        Self {
            config,
            engine,
            vm: Arc::new(vm),
        }
    }

    /// Processes a block against the shared state. Selection of the parallel
    /// vs serial path is driven by `vm_config.require_access_list`.
    ///
    /// On error the state is left wherever the successful prefix put it;
    /// callers reject the block by not committing.
    pub fn process(
        &self,
        block: &Block,
        state: &SharedState,
        vm_config: &VmConfig,
    ) -> Result<ProcessOutput, ProcessError> {
        if vm_config.require_access_list {
            self.process_parallel(block, state, vm_config)
        } else {
            self.process_serial(block, state)
        }
    }

    /// The baseline: transactions in block order, one at a time.
    fn process_serial(
        &self,
        block: &Block,
        state: &SharedState,
    ) -> Result<ProcessOutput, ProcessError> {
        let header = &block.header;
        self.apply_fork_rewrite(header.number, state);
        let block_env = BlockEnv::from_header(header);
        let gas_pool = GasPool::new(header.gas_limit);
        let used_gas = AtomicU64::new(0);

        let mut receipts = Vec::with_capacity(block.transactions.len());
        let mut all_logs = Vec::new();
        for (i, tx) in block.transactions.iter().enumerate() {
            let mut view = TxStateView::new(state.clone(), tx.hash(), i);
            let receipt = apply_transaction(
                self.vm.as_ref(),
                &self.config,
                &block_env,
                tx,
                i,
                &mut view,
                &gas_pool,
                &used_gas,
            )
            .map_err(|source| ProcessError::Apply {
                index: i,
                hash: tx.hash(),
                source,
            })?;
            all_logs.extend(receipt.logs.iter().cloned());
            receipts.push(receipt);
        }

        self.finalize_block(block, state);
        Ok(ProcessOutput {
            receipts,
            logs: all_logs,
            used_gas: used_gas.load(Ordering::SeqCst),
        })
    }

    /// Runs the block's transactions concurrently under the access-list
    /// lock discipline.
    fn process_parallel(
        &self,
        block: &Block,
        state: &SharedState,
        vm_config: &VmConfig,
    ) -> Result<ProcessOutput, ProcessError> {
        let header = &block.header;
        let num_txs = block.transactions.len();
        self.apply_fork_rewrite(header.number, state);

        let block_env = Arc::new(BlockEnv::from_header(header));
        let locks = Arc::new(AccessListLocks::new(&block.transactions));
        let transactions = Arc::new(block.transactions.clone());
        let receipt_slots: Arc<Vec<Mutex<Option<Receipt>>>> =
            Arc::new((0..num_txs).map(|_| Mutex::new(None)).collect());
        let gas_pool = Arc::new(GasPool::new(header.gas_limit));
        let used_gas = Arc::new(AtomicU64::new(0));

        let parent = CancelToken::new();
        let (mut group, cancel) =
            BoundedGroup::with_cancellation(&parent, vm_config.workers, vm_config.backlog);

        for (i, tx) in transactions.iter().enumerate() {
            let tx = tx.clone();
            let config = self.config;
            let vm = self.vm.clone();
            let state = state.clone();
            let block_env = block_env.clone();
            let locks = locks.clone();
            let receipt_slots = receipt_slots.clone();
            let gas_pool = gas_pool.clone();
            let used_gas = used_gas.clone();
            let cancel = cancel.clone();
            group.go(move || {
                debug!(tx = %tx.hash(), index = i, "starting transaction task");
                locks.lock(&tx);
                trace!(tx = %tx.hash(), index = i, "acquired access-list locks");
                // The locks are always released, error or not: a task that
                // kept them would strand every later reserver and hang the
                // join. A cancelled task still drains its reservations this
                // way but skips the VM.
                let outcome = if cancel.is_cancelled() {
                    Ok(None)
                } else {
                    let mut view = TxStateView::new(state, tx.hash(), i);
                    apply_transaction(
                        vm.as_ref(),
                        &config,
                        &block_env,
                        &tx,
                        i,
                        &mut view,
                        &gas_pool,
                        &used_gas,
                    )
                    .map(Some)
                };
                locks.unlock(&tx);
                trace!(tx = %tx.hash(), index = i, "released access-list locks");
                let receipt = outcome.map_err(|source| ProcessError::Apply {
                    index: i,
                    hash: tx.hash(),
                    source,
                })?;
                if let Some(receipt) = receipt {
                    *receipt_slots[i].lock() = Some(receipt);
                }
                Ok(())
            });
        }

        if let Some(err) = group.wait() {
            return Err(err);
        }

        // Cumulative gas is recomputed in block order: the values written
        // during execution depend on completion order and are unreliable.
        let mut receipts = Vec::with_capacity(num_txs);
        for slot in receipt_slots.iter() {
            receipts.push(
                slot.lock()
                    .take()
                    .expect("receipt missing for completed transaction"),
            );
        }
        let mut cumulative = 0u64;
        for receipt in &mut receipts {
            cumulative += receipt.gas_used;
            receipt.cumulative_gas_used = cumulative;
        }
        if cumulative > header.gas_limit {
            return Err(ProcessError::GasLimitExceeded {
                limit: header.gas_limit,
                used: cumulative,
            });
        }

        let mut all_logs = Vec::new();
        for receipt in &receipts {
            all_logs.extend(receipt.logs.iter().cloned());
        }

        self.finalize_block(block, state);
        Ok(ProcessOutput {
            receipts,
            logs: all_logs,
            used_gas: used_gas.load(Ordering::SeqCst),
        })
    }

    fn apply_fork_rewrite(&self, block_number: u64, state: &SharedState) {
        if let Some(rewrite) = &self.config.fork_rewrite {
            if rewrite.block == block_number {
                let mut ctx = TxContext::new(B256::ZERO, 0);
                let mut guard = state.lock();
                (rewrite.apply)(&mut guard, &mut ctx);
                guard.finalise(&mut ctx, false);
            }
        }
    }

    fn finalize_block(&self, block: &Block, state: &SharedState) {
        let mut ctx = TxContext::new(B256::ZERO, 0);
        let mut guard = state.lock();
        self.engine.finalize(
            &block.header,
            &mut guard,
            &mut ctx,
            &block.transactions,
            &block.ommers,
        );
    }
}

/// Recovers, executes, settles, and builds the receipt for one transaction.
///
/// The `cumulative_gas_used` written here is provisional on the parallel
/// path and overwritten after the join.
#[allow(clippy::too_many_arguments)]
fn apply_transaction<V: Vm>(
    vm: &V,
    config: &ChainConfig,
    block_env: &BlockEnv,
    tx: &Transaction,
    index: TxIndex,
    view: &mut TxStateView,
    gas_pool: &GasPool,
    used_gas: &AtomicU64,
) -> Result<Receipt, ApplyError> {
    let msg = tx.as_message()?;
    let result = vm.apply_message(block_env, view, &msg, gas_pool)?;

    if config.is_byzantium(block_env.number) {
        view.finalise(true);
    } else {
        view.intermediate_root(config.is_eip158(block_env.number));
    }
    let cumulative = used_gas.fetch_add(result.used_gas, Ordering::SeqCst) + result.used_gas;

    let logs = view.logs();
    let bloom = logs_bloom(&logs);
    Ok(Receipt {
        status: if result.failed {
            ReceiptStatus::Failed
        } else {
            ReceiptStatus::Success
        },
        tx_hash: tx.hash(),
        gas_used: result.used_gas,
        cumulative_gas_used: cumulative,
        logs,
        bloom,
        contract_address: msg.is_create().then(|| msg.from.create(tx.nonce())),
        block_hash: block_env.hash,
        block_number: block_env.number,
        transaction_index: index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sign_tx, test_signer};
    use crate::types::{AccessListItem, UnsignedTransaction};
    use crate::vm::{encode_store_call, MessageResult, TransferVm, TX_GAS};
    use alloy_primitives::{Address, Bytes};
    use k256::ecdsa::SigningKey;
    use std::sync::mpsc;
    use std::time::Duration;

    const FUNDS: u64 = u64::MAX;

    fn funded_state(addresses: &[Address]) -> SharedState {
        let mut state = State::new();
        let mut ctx = TxContext::new(B256::ZERO, 0);
        for address in addresses {
            state.add_balance(&mut ctx, *address, U256::from(FUNDS));
        }
        state.finalise(&mut ctx, false);
        Arc::new(Mutex::new(state))
    }

    fn header(number: u64, gas_limit: u64) -> Header {
        Header {
            number,
            gas_limit,
            coinbase: Address::repeat_byte(0xc0),
            timestamp: number,
            base_fee: None,
            parent_hash: B256::ZERO,
        }
    }

    fn block(number: u64, gas_limit: u64, transactions: Vec<Transaction>) -> Block {
        Block {
            header: header(number, gas_limit),
            transactions,
            ommers: Vec::new(),
        }
    }

    fn processor() -> BlockProcessor<RewardEngine, TransferVm> {
        BlockProcessor::new(
            ChainConfig::default(),
            RewardEngine {
                block_reward: U256::from(2_000_000_000u64),
            },
            TransferVm,
        )
    }

    fn transfer(
        key: &SigningKey,
        from: Address,
        nonce: u64,
        to: Address,
        value: u64,
    ) -> Transaction {
        sign_tx(
            key,
            UnsignedTransaction {
                chain_id: 1,
                nonce,
                gas_price: 1,
                gas_limit: 50_000,
                to: Some(to),
                value: U256::from(value),
                data: Bytes::new(),
                access_list: vec![
                    AccessListItem::address_only(from),
                    AccessListItem::address_only(to),
                ],
            },
        )
    }

    /// Runs `process` on its own thread and fails the test if it does not
    /// finish within a second.
    fn process_within_second(
        processor: BlockProcessor<RewardEngine, TransferVm>,
        block: Block,
        state: SharedState,
        vm_config: VmConfig,
    ) -> Result<ProcessOutput, ProcessError> {
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let result = processor.process(&block, &state, &vm_config);
            let _ = done_tx.send(result);
        });
        done_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("processing timed out")
    }

    #[test]
    fn serial_and_parallel_paths_agree() {
        let signers: Vec<_> = (0..4).map(test_signer).collect();
        let make_txs = || -> Vec<Transaction> {
            let mut txs = Vec::new();
            // Everyone pays signer 0, and signer 0 pays signer 3: plenty of
            // overlap on signer 0's account.
            for (i, (key, from)) in signers.iter().enumerate().skip(1) {
                txs.push(transfer(key, *from, 0, signers[0].1, 1_000 * i as u64));
            }
            txs.push(transfer(&signers[0].0, signers[0].1, 0, signers[3].1, 77));
            txs
        };
        let addresses: Vec<_> = signers.iter().map(|(_, address)| *address).collect();

        let serial_state = funded_state(&addresses);
        let serial = processor()
            .process(
                &block(1, 30_000_000, make_txs()),
                &serial_state,
                &VmConfig::default(),
            )
            .expect("serial path succeeds");

        let parallel_state = funded_state(&addresses);
        let parallel = process_within_second(
            processor(),
            block(1, 30_000_000, make_txs()),
            parallel_state.clone(),
            VmConfig::parallel(),
        )
        .expect("parallel path succeeds");

        assert_eq!(serial.used_gas, parallel.used_gas);
        assert_eq!(serial.receipts.len(), parallel.receipts.len());
        for (s, p) in serial.receipts.iter().zip(&parallel.receipts) {
            assert_eq!(s.tx_hash, p.tx_hash);
            assert_eq!(s.status, p.status);
            assert_eq!(s.gas_used, p.gas_used);
            assert_eq!(s.cumulative_gas_used, p.cumulative_gas_used);
            assert_eq!(s.logs, p.logs);
            assert_eq!(s.bloom, p.bloom);
        }
        assert_eq!(serial.logs, parallel.logs);
        assert_eq!(
            serial_state.lock().state_digest(),
            parallel_state.lock().state_digest()
        );
    }

    #[test]
    fn six_transactions_serialize_on_a_shared_address() {
        let signers: Vec<_> = (10..16).map(test_signer).collect();
        let shared = Address::repeat_byte(0xee);
        let txs: Vec<_> = signers
            .iter()
            .map(|(key, from)| transfer(key, *from, 0, shared, 10))
            .collect();
        let addresses: Vec<_> = signers.iter().map(|(_, address)| *address).collect();
        let state = funded_state(&addresses);

        let output = process_within_second(
            processor(),
            block(1, 30_000_000, txs),
            state.clone(),
            VmConfig::parallel(),
        )
        .expect("parallel path succeeds");

        assert_eq!(output.receipts.len(), 6);
        for (i, receipt) in output.receipts.iter().enumerate() {
            assert_eq!(receipt.transaction_index, i);
            assert!(receipt.status.is_success());
        }
        assert_eq!(state.lock().balance(shared), U256::from(60));
    }

    #[test]
    fn cumulative_gas_is_a_prefix_sum() {
        let signers: Vec<_> = (20..25).map(test_signer).collect();
        let txs: Vec<_> = signers
            .iter()
            .map(|(key, from)| transfer(key, *from, 0, Address::repeat_byte(0x42), 1))
            .collect();
        let addresses: Vec<_> = signers.iter().map(|(_, address)| *address).collect();
        let state = funded_state(&addresses);

        let output = process_within_second(
            processor(),
            block(1, 30_000_000, txs),
            state,
            VmConfig::parallel(),
        )
        .expect("parallel path succeeds");

        let mut sum = 0;
        for receipt in &output.receipts {
            sum += receipt.gas_used;
            assert_eq!(receipt.cumulative_gas_used, sum);
            assert_eq!(receipt.gas_used, TX_GAS);
        }
        assert!(output.receipts.last().unwrap().cumulative_gas_used <= 30_000_000);
        assert_eq!(output.used_gas, sum);
    }

    #[test]
    fn storage_contract_last_writer_wins() {
        let (deployer_key, deployer) = test_signer(30);
        let state = funded_state(&[deployer]);
        let runtime_code = Bytes::from(vec![0xfe]);

        // Block 0 deploys the contract on the serial path.
        let deploy = sign_tx(
            &deployer_key,
            UnsignedTransaction {
                chain_id: 1,
                nonce: 0,
                gas_price: 1,
                gas_limit: 200_000,
                to: None,
                value: U256::ZERO,
                data: runtime_code,
                access_list: vec![AccessListItem::address_only(deployer)],
            },
        );
        let deployed = processor()
            .process(&block(0, 30_000_000, vec![deploy]), &state, &VmConfig::default())
            .expect("deployment succeeds");
        let contract = deployed.receipts[0]
            .contract_address
            .expect("creation receipt carries the contract address");

        // Block 1 stores six distinct values under access lists naming the
        // contract; the FIFO lock serializes them in block order.
        let signers: Vec<_> = (31..37).map(test_signer).collect();
        let mut writer_state = state.lock();
        let mut ctx = TxContext::new(B256::ZERO, 0);
        for (_, address) in &signers {
            writer_state.add_balance(&mut ctx, *address, U256::from(FUNDS));
        }
        writer_state.finalise(&mut ctx, false);
        drop(writer_state);

        let txs: Vec<_> = signers
            .iter()
            .enumerate()
            .map(|(i, (key, from))| {
                sign_tx(
                    key,
                    UnsignedTransaction {
                        chain_id: 1,
                        nonce: 0,
                        gas_price: 1,
                        gas_limit: 100_000,
                        to: Some(contract),
                        value: U256::ZERO,
                        data: encode_store_call(U256::from(100 + i as u64)),
                        access_list: vec![
                            AccessListItem::address_only(*from),
                            AccessListItem::address_only(contract),
                        ],
                    },
                )
            })
            .collect();

        let output = process_within_second(
            processor(),
            block(1, 30_000_000, txs),
            state.clone(),
            VmConfig::parallel(),
        )
        .expect("parallel path succeeds");

        assert_eq!(
            state.lock().storage(contract, B256::ZERO),
            B256::from(U256::from(105))
        );
        // One log per store call, concatenated in block order.
        assert_eq!(output.logs.len(), 6);
        for (i, log) in output.logs.iter().enumerate() {
            assert_eq!(
                log.data.data.as_ref(),
                U256::from(100 + i as u64).to_be_bytes::<32>().as_slice()
            );
        }
    }

    #[test]
    fn first_transaction_error_rejects_the_block() {
        let signers: Vec<_> = (40..45).map(test_signer).collect();
        let addresses: Vec<_> = signers.iter().map(|(_, address)| *address).collect();
        let state = funded_state(&addresses);

        let mut txs: Vec<_> = signers
            .iter()
            .map(|(key, from)| transfer(key, *from, 0, Address::repeat_byte(0x42), 1))
            .collect();
        // A stale nonce at index 2 fails in the VM; the rest of the block
        // still drains and the first error surfaces.
        txs[2] = transfer(&signers[2].0, signers[2].1, 9, Address::repeat_byte(0x42), 1);
        let bad_hash = txs[2].hash();

        let err = process_within_second(
            processor(),
            block(1, 30_000_000, txs),
            state,
            VmConfig::parallel(),
        )
        .expect_err("block is rejected");

        match err {
            ProcessError::Apply { index, hash, source } => {
                assert_eq!(index, 2);
                assert_eq!(hash, bad_hash);
                assert!(matches!(
                    source,
                    ApplyError::Vm(VmError::NonceMismatch { found: 9, .. })
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// A VM double that reports more gas than the pool ever handed out, to
    /// drive the post-join overflow check.
    struct OverreportingVm {
        per_tx: u64,
    }

    impl Vm for OverreportingVm {
        fn apply_message(
            &self,
            _block: &BlockEnv,
            _view: &mut TxStateView,
            _msg: &crate::types::Message,
            _gas_pool: &GasPool,
        ) -> Result<MessageResult, VmError> {
            Ok(MessageResult {
                used_gas: self.per_tx,
                failed: false,
            })
        }
    }

    #[test]
    fn gas_overflow_names_limit_and_usage() {
        let signers: Vec<_> = (50..53).map(test_signer).collect();
        let addresses: Vec<_> = signers.iter().map(|(_, address)| *address).collect();
        let state = funded_state(&addresses);
        let txs: Vec<_> = signers
            .iter()
            .map(|(key, from)| transfer(key, *from, 0, Address::repeat_byte(0x42), 1))
            .collect();

        let processor = BlockProcessor::new(
            ChainConfig::default(),
            RewardEngine {
                block_reward: U256::ZERO,
            },
            OverreportingVm { per_tx: 60_000 },
        );
        let err = processor
            .process(&block(1, 100_000, txs), &state, &VmConfig::parallel())
            .expect_err("overflowing block is rejected");

        assert_eq!(
            err,
            ProcessError::GasLimitExceeded {
                limit: 100_000,
                used: 180_000,
            }
        );
    }

    #[test]
    fn fork_rewrite_runs_before_the_block() {
        fn grant(state: &mut State, ctx: &mut TxContext) {
            state.add_balance(ctx, Address::repeat_byte(0x99), U256::from(1234));
        }

        let (key, from) = test_signer(60);
        let state = funded_state(&[from]);
        let config = ChainConfig {
            fork_rewrite: Some(ForkRewrite { block: 1, apply: grant }),
            ..ChainConfig::default()
        };
        let processor = BlockProcessor::new(
            config,
            RewardEngine {
                block_reward: U256::ZERO,
            },
            TransferVm,
        );

        let txs = vec![transfer(&key, from, 0, Address::repeat_byte(0x42), 1)];
        processor
            .process(&block(1, 30_000_000, txs), &state, &VmConfig::parallel())
            .expect("block succeeds");

        assert_eq!(
            state.lock().balance(Address::repeat_byte(0x99)),
            U256::from(1234)
        );
    }

    #[test]
    fn finalize_pays_the_coinbase() {
        let (key, from) = test_signer(70);
        let state = funded_state(&[from]);
        let txs = vec![transfer(&key, from, 0, Address::repeat_byte(0x42), 5)];

        let output = processor()
            .process(&block(1, 30_000_000, txs), &state, &VmConfig::default())
            .expect("block succeeds");

        // Fees plus the block reward.
        assert_eq!(
            state.lock().balance(Address::repeat_byte(0xc0)),
            U256::from(output.used_gas) + U256::from(2_000_000_000u64)
        );
    }
}
