//! Benchmarking framework for block execution strategies.
//!
//! This crate measures the access-list parallel executor against the serial
//! baseline on generated blocks of signed transfer transactions.
//!
//! # Architecture
//!
//! The framework is organized around three main concepts:
//!
//! - **Workload**: pre-generated blocks of signed transactions whose access
//!   lists declare exactly the accounts they touch
//! - **Executor**: a strategy for executing the workload (serial, parallel)
//! - **State**: the shared account store both strategies run against
//!
//! # Quick Start
//!
//! ```
//! use exec_test::{Executor, SerialExecutor, Workload, WorkloadConfig};
//!
//! // Configure the workload
//! let config = WorkloadConfig {
//!     num_accounts: 100,
//!     num_transactions: 50,
//!     transactions_per_block: 25,
//!     conflict_factor: 0.0,
//!     seed: 42,
//!     chain_id: 1,
//! };
//!
//! // Generate workload (signs all transactions upfront)
//! let workload = Workload::generate(config);
//! let state = workload.create_state();
//!
//! let executor = SerialExecutor;
//! let result = executor.execute(state, &workload).unwrap();
//!
//! println!("Successful: {}", result.successful);
//! ```

pub mod executor;

pub use executor::{ExecutionResult, Executor, ParallelExecutor, SerialExecutor};

use access_list_executor::{
    AccessListItem, Block, Header, SharedState, State, Transaction, TxContext,
    UnsignedTransaction,
};
use alloy_primitives::{keccak256, Address, Bytes, Signature, B256, U256};
use k256::ecdsa::{SigningKey, VerifyingKey};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;

/// Gas limit of every generated block, large enough that the workloads
/// below never brush against it.
pub const BLOCK_GAS_LIMIT: u64 = 100_000_000;

/// Initial balance of every generated account: 1000 ETH.
pub const INITIAL_BALANCE: u128 = 1_000_000_000_000_000_000_000;

// ============================================================================
// Account & Key Management
// ============================================================================

/// An account with its signing key for transaction signing.
#[derive(Clone)]
pub struct Account {
    /// The secp256k1 signing key.
    pub signing_key: SigningKey,
    /// The address derived from the public key.
    pub address: Address,
}

impl Account {
    /// Creates a new account from a signing key.
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = public_key_to_address(&verifying_key);
        Self { signing_key, address }
    }

    /// Generates a deterministic account from a seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut key_bytes = [0u8; 32];
        rng.fill(&mut key_bytes);
        let signing_key = SigningKey::from_bytes(&key_bytes.into())
            .expect("valid key bytes");
        Self::from_signing_key(signing_key)
    }

    /// Signs an unsigned transaction with this account's key.
    pub fn sign(&self, unsigned: UnsignedTransaction) -> Transaction {
        let hash = unsigned.signing_hash();
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash.as_slice())
            .expect("signing should succeed");
        unsigned.into_signed(Signature::from_signature_and_parity(
            sig,
            recovery_id.is_y_odd(),
        ))
    }

    /// A signed value transfer whose access list declares the sender and
    /// recipient, which is exactly what the transfer touches.
    pub fn signed_transfer(
        &self,
        to: Address,
        value: U256,
        nonce: u64,
        chain_id: u64,
    ) -> Transaction {
        self.sign(UnsignedTransaction {
            chain_id,
            nonce,
            gas_price: 1,
            gas_limit: 21_000,
            to: Some(to),
            value,
            data: Bytes::new(),
            access_list: vec![
                AccessListItem::address_only(self.address),
                AccessListItem::address_only(to),
            ],
        })
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish()
    }
}

/// Derives an address from a secp256k1 public key.
fn public_key_to_address(verifying_key: &VerifyingKey) -> Address {
    let public_key_bytes = verifying_key.to_encoded_point(false);
    // Skip the 0x04 prefix byte, hash the rest.
    let hash = keccak256(&public_key_bytes.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

// ============================================================================
// Workload Configuration & Generation
// ============================================================================

/// Configuration for workload generation.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Total number of accounts in the system.
    pub num_accounts: usize,
    /// Number of transactions to generate.
    pub num_transactions: usize,
    /// How many transactions go into each block.
    pub transactions_per_block: usize,
    /// Conflict factor: 0.0 = no conflicts, 1.0 = all transactions touch same accounts.
    pub conflict_factor: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Chain ID for transaction signing.
    pub chain_id: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            num_accounts: 1000,
            num_transactions: 100,
            transactions_per_block: 100,
            conflict_factor: 0.0,
            seed: 42,
            chain_id: 1,
        }
    }
}

/// A complete benchmark workload with pre-generated accounts and signed
/// transactions, partitioned into blocks.
#[derive(Debug, Clone)]
pub struct Workload {
    /// The accounts (with signing keys) participating in this workload.
    pub accounts: Vec<Account>,
    /// The pre-signed blocks to execute.
    pub blocks: Vec<Block>,
    /// The configuration used to generate this workload.
    pub config: WorkloadConfig,
}

impl Workload {
    /// Generates a new workload from the given configuration.
    /// All transactions are pre-signed during generation.
    pub fn generate(config: WorkloadConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        // Generate accounts with deterministic keys.
        let accounts: Vec<Account> = (0..config.num_accounts)
            .map(|i| Account::from_seed(config.seed.wrapping_add(i as u64)))
            .collect();

        // Track nonces per account for proper transaction sequencing.
        let mut nonces: HashMap<usize, u64> = HashMap::new();

        // Calculate "hot" account range for conflict simulation.
        let hot_account_count = if config.conflict_factor > 0.0 {
            (2.0 + (1.0 - config.conflict_factor) * (config.num_accounts as f64 - 2.0))
                .max(2.0) as usize
        } else {
            config.num_accounts
        };

        // Generate and sign transactions.
        let transactions: Vec<Transaction> = (0..config.num_transactions)
            .map(|_| {
                let use_hot = rng.gen::<f64>() < config.conflict_factor;
                let pool = if use_hot {
                    hot_account_count
                } else {
                    config.num_accounts
                };

                let from_idx = rng.gen_range(0..pool);
                let mut to_idx = rng.gen_range(0..pool);
                while to_idx == from_idx {
                    to_idx = rng.gen_range(0..pool);
                }

                let nonce = nonces.entry(from_idx).or_insert(0);
                let tx = accounts[from_idx].signed_transfer(
                    accounts[to_idx].address,
                    U256::from(1_000_000_000_000_000u64), // 0.001 ETH
                    *nonce,
                    config.chain_id,
                );
                *nonce += 1;
                tx
            })
            .collect();

        // Partition into blocks.
        let blocks = transactions
            .chunks(config.transactions_per_block.max(1))
            .enumerate()
            .map(|(i, chunk)| Block {
                header: Header {
                    number: i as u64 + 1,
                    gas_limit: BLOCK_GAS_LIMIT,
                    coinbase: Address::with_last_byte(1),
                    timestamp: i as u64 + 1,
                    base_fee: None,
                    parent_hash: B256::ZERO,
                },
                transactions: chunk.to_vec(),
                ommers: Vec::new(),
            })
            .collect();

        Self {
            accounts,
            blocks,
            config,
        }
    }

    /// Total number of transactions across all blocks.
    pub fn num_transactions(&self) -> usize {
        self.blocks.iter().map(|block| block.transactions.len()).sum()
    }

    /// Creates a shared state pre-funded with all accounts in this workload.
    pub fn create_state(&self) -> SharedState {
        let mut state = State::new();
        let mut ctx = TxContext::new(B256::ZERO, 0);
        for account in &self.accounts {
            state.add_balance(&mut ctx, account.address, U256::from(INITIAL_BALANCE));
        }
        state.finalise(&mut ctx, false);
        Arc::new(Mutex::new(state))
    }
}

// ============================================================================
// Tests
// ============================================================================
