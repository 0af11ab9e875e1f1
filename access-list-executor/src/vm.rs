//! The virtual machine seam.
//!
//! The interpreter proper is an external collaborator; the processor only
//! needs [`Vm::apply_message`]. [`TransferVm`] is the minimal built-in
//! implementation used by tests and benchmarks: plain value transfers,
//! contract creation that installs the calldata as code, and a one-function
//! storage contract. It buys gas from the block pool up front and returns
//! the unused remainder, the way the full state-transition does.

use crate::gas_pool::{GasLimitReached, GasPool};
use crate::types::{Header, Message};
use crate::view::TxStateView;
use alloy_primitives::{keccak256, Address, Bytes, Log, B256, U256};
use thiserror::Error;

/// Gas charged for any transaction.
pub const TX_GAS: u64 = 21_000;
/// Gas charged for a contract-creation transaction.
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
/// Per-byte calldata gas.
pub const DATA_ZERO_GAS: u64 = 4;
pub const DATA_NONZERO_GAS: u64 = 16;
/// Per-byte code deposit gas on creation.
pub const CREATE_DATA_GAS: u64 = 200;
/// Storage write costs: fresh slot vs overwrite.
pub const SSTORE_SET_GAS: u64 = 20_000;
pub const SSTORE_RESET_GAS: u64 = 5_000;
/// Storage read cost.
pub const SLOAD_GAS: u64 = 800;
/// Log costs: base, per topic, per data byte.
pub const LOG_GAS: u64 = 375;
pub const LOG_TOPIC_GAS: u64 = 375;
pub const LOG_DATA_GAS: u64 = 8;

/// `store(uint256)`.
pub const STORE_SELECTOR: [u8; 4] = [0x60, 0x57, 0x36, 0x1d];
/// `retrieve()`.
pub const RETRIEVE_SELECTOR: [u8; 4] = [0x2e, 0x64, 0xce, 0xc1];

/// Errors that reject the whole block; a contract-level revert is not an
/// error but a failed receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error(transparent)]
    GasLimitReached(#[from] GasLimitReached),
    #[error("insufficient funds for gas * price + value: address {0}")]
    InsufficientFunds(Address),
    #[error("nonce mismatch for {address}: state {expected}, tx {found}")]
    NonceMismatch {
        address: Address,
        expected: u64,
        found: u64,
    },
    #[error("intrinsic gas too low: have {have}, want {want}")]
    IntrinsicGas { have: u64, want: u64 },
}

/// Outcome of applying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageResult {
    pub used_gas: u64,
    /// True when execution reverted; the transaction is still included.
    pub failed: bool,
}

/// Per-block environment handed to the VM, derived from the header.
#[derive(Debug, Clone)]
pub struct BlockEnv {
    pub number: u64,
    pub hash: B256,
    pub coinbase: Address,
    pub gas_limit: u64,
    pub timestamp: u64,
    pub base_fee: Option<U256>,
}

impl BlockEnv {
    pub fn from_header(header: &Header) -> Self {
        Self {
            number: header.number,
            hash: header.hash(),
            coinbase: header.coinbase,
            gas_limit: header.gas_limit,
            timestamp: header.timestamp,
            base_fee: header.base_fee,
        }
    }
}

/// Executes one recovered message against a transaction-scoped view.
pub trait Vm: Send + Sync {
    fn apply_message(
        &self,
        block: &BlockEnv,
        view: &mut TxStateView,
        msg: &Message,
        gas_pool: &GasPool,
    ) -> Result<MessageResult, VmError>;
}

/// Intrinsic cost of a message before any execution happens.
pub fn intrinsic_gas(msg: &Message) -> u64 {
    let base = if msg.is_create() {
        TX_GAS_CONTRACT_CREATION
    } else {
        TX_GAS
    };
    let data: u64 = msg
        .data
        .iter()
        .map(|byte| {
            if *byte == 0 {
                DATA_ZERO_GAS
            } else {
                DATA_NONZERO_GAS
            }
        })
        .sum();
    base + data
}

/// Minimal reference VM.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferVm;

impl TransferVm {
    /// Runs the storage contract's dispatch. Returns the remaining gas and
    /// whether execution reverted.
    fn call_contract(
        view: &mut TxStateView,
        contract: Address,
        data: &Bytes,
        snapshot: usize,
        mut gas_left: u64,
    ) -> (u64, bool) {
        if data.len() == 36 && data[..4] == STORE_SELECTOR {
            let value = B256::from_slice(&data[4..36]);
            let slot = B256::ZERO;
            let store_cost = if view.storage(contract, slot).is_zero() {
                SSTORE_SET_GAS
            } else {
                SSTORE_RESET_GAS
            };
            let log_cost = LOG_GAS + LOG_TOPIC_GAS + LOG_DATA_GAS * 32;
            let cost = store_cost + log_cost;
            if gas_left < cost {
                view.revert_to_snapshot(snapshot);
                return (0, true);
            }
            gas_left -= cost;
            view.add_slot_to_access_list(contract, slot);
            view.set_storage(contract, slot, value);
            view.add_log(Log::new_unchecked(
                contract,
                vec![keccak256(b"Stored(uint256)")],
                Bytes::copy_from_slice(value.as_slice()),
            ));
            (gas_left, false)
        } else if data.len() == 4 && data[..4] == RETRIEVE_SELECTOR {
            if gas_left < SLOAD_GAS {
                view.revert_to_snapshot(snapshot);
                return (0, true);
            }
            view.add_slot_to_access_list(contract, B256::ZERO);
            let _ = view.storage(contract, B256::ZERO);
            (gas_left - SLOAD_GAS, false)
        } else {
            // Unknown selector reverts; remaining gas is returned to the
            // sender, revert semantics.
            view.revert_to_snapshot(snapshot);
            (gas_left, true)
        }
    }
}

impl Vm for TransferVm {
    fn apply_message(
        &self,
        block: &BlockEnv,
        view: &mut TxStateView,
        msg: &Message,
        gas_pool: &GasPool,
    ) -> Result<MessageResult, VmError> {
        gas_pool.sub(msg.gas_limit)?;

        let gas_price = U256::from(msg.gas_price);
        let prepaid = U256::from(msg.gas_limit) * gas_price;
        let needed = prepaid
            .checked_add(msg.value)
            .ok_or(VmError::InsufficientFunds(msg.from))?;

        let state_nonce = view.nonce(msg.from);
        if state_nonce != msg.nonce {
            return Err(VmError::NonceMismatch {
                address: msg.from,
                expected: state_nonce,
                found: msg.nonce,
            });
        }
        if view.balance(msg.from) < needed {
            return Err(VmError::InsufficientFunds(msg.from));
        }

        let want = intrinsic_gas(msg);
        if msg.gas_limit < want {
            return Err(VmError::IntrinsicGas {
                have: msg.gas_limit,
                want,
            });
        }

        view.sub_balance(msg.from, prepaid);
        view.set_nonce(msg.from, state_nonce + 1);
        view.prepare_access_list(msg.from, msg.to, &[], &msg.access_list);

        let mut gas_left = msg.gas_limit - want;
        let snapshot = view.snapshot();
        let mut failed = false;

        match msg.to {
            None => {
                let contract = msg.from.create(msg.nonce);
                view.create_account(contract);
                view.sub_balance(msg.from, msg.value);
                view.add_balance(contract, msg.value);
                view.set_nonce(contract, 1);
                let deposit = CREATE_DATA_GAS * msg.data.len() as u64;
                if gas_left < deposit {
                    view.revert_to_snapshot(snapshot);
                    failed = true;
                    gas_left = 0;
                } else {
                    gas_left -= deposit;
                    view.set_code(contract, msg.data.clone());
                    view.add_preimage(keccak256(&msg.data), msg.data.clone());
                }
            }
            Some(to) => {
                view.sub_balance(msg.from, msg.value);
                view.add_balance(to, msg.value);
                let code = view.code(to);
                if !code.is_empty() {
                    let (left, reverted) =
                        Self::call_contract(view, to, &msg.data, snapshot, gas_left);
                    gas_left = left;
                    failed = reverted;
                }
            }
        }

        let mut used = msg.gas_limit - gas_left;
        let refund = view.refund().min(used / 5);
        used -= refund;
        let leftover = msg.gas_limit - used;

        // Unused gas flows back to the sender and the block pool; the fee
        // for consumed gas goes to the coinbase.
        view.add_balance(msg.from, U256::from(leftover) * gas_price);
        gas_pool.add(leftover);
        view.add_balance(block.coinbase, U256::from(used) * gas_price);

        Ok(MessageResult {
            used_gas: used,
            failed,
        })
    }
}

/// Encodes a `store(uint256)` call for the reference storage contract.
pub fn encode_store_call(value: U256) -> Bytes {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&STORE_SELECTOR);
    data.extend_from_slice(&value.to_be_bytes::<32>());
    Bytes::from(data)
}
