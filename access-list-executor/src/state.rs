//! Shared in-memory account state store.
//!
//! One instance backs every transaction in a block. The store itself is not
//! thread-safe; concurrent access goes through a transaction-scoped view
//! holding a shared mutex, and every mutating operation takes the owning
//! transaction's [`TxContext`] explicitly so changes land in that
//! transaction's journal.

use crate::journal::{JournalEntry, TxContext};
use crate::types::EMPTY_CODE_HASH;
use alloy_primitives::{keccak256, Address, Bytes, Keccak256, Log, B256, U256};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A single account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code_hash: B256,
    pub(crate) selfdestructed: bool,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::ZERO,
            nonce: 0,
            code_hash: EMPTY_CODE_HASH,
            selfdestructed: false,
        }
    }
}

impl Account {
    fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == EMPTY_CODE_HASH
    }
}

/// Account balances, nonces, code, and storage for one chain state.
///
/// Sorted maps keep iteration and the state digest deterministic.
#[derive(Debug, Default)]
pub struct State {
    accounts: BTreeMap<Address, Account>,
    storage: BTreeMap<Address, BTreeMap<B256, B256>>,
    committed_storage: BTreeMap<Address, BTreeMap<B256, B256>>,
    codes: HashMap<B256, Bytes>,
    logs: HashMap<B256, Vec<Log>>,
    preimages: HashMap<B256, Bytes>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_account(&mut self, ctx: &mut TxContext, address: Address) -> &mut Account {
        match self.accounts.entry(address) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                ctx.record(JournalEntry::AccountCreated {
                    address,
                    prev: None,
                });
                vacant.insert(Account::default())
            }
        }
    }

    /// Installs a fresh account at `address`, carrying over any existing
    /// balance.
    pub fn create_account(&mut self, ctx: &mut TxContext, address: Address) {
        let prev = self.accounts.get(&address).cloned();
        let mut fresh = Account::default();
        if let Some(existing) = &prev {
            fresh.balance = existing.balance;
        }
        ctx.record(JournalEntry::AccountCreated { address, prev });
        self.accounts.insert(address, fresh);
    }

    pub fn add_balance(&mut self, ctx: &mut TxContext, address: Address, amount: U256) {
        let account = self.ensure_account(ctx, address);
        ctx.record(JournalEntry::BalanceChanged {
            address,
            prev: account.balance,
        });
        account.balance += amount;
    }

    pub fn sub_balance(&mut self, ctx: &mut TxContext, address: Address, amount: U256) {
        let account = self.ensure_account(ctx, address);
        ctx.record(JournalEntry::BalanceChanged {
            address,
            prev: account.balance,
        });
        account.balance = account.balance.saturating_sub(amount);
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|account| account.balance)
            .unwrap_or(U256::ZERO)
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.accounts
            .get(&address)
            .map(|account| account.nonce)
            .unwrap_or(0)
    }

    pub fn set_nonce(&mut self, ctx: &mut TxContext, address: Address, nonce: u64) {
        let account = self.ensure_account(ctx, address);
        ctx.record(JournalEntry::NonceChanged {
            address,
            prev: account.nonce,
        });
        account.nonce = nonce;
    }

    pub fn code_hash(&self, address: Address) -> B256 {
        self.accounts
            .get(&address)
            .map(|account| account.code_hash)
            .unwrap_or(EMPTY_CODE_HASH)
    }

    pub fn code(&self, address: Address) -> Bytes {
        self.codes
            .get(&self.code_hash(address))
            .cloned()
            .unwrap_or_default()
    }

    pub fn code_size(&self, address: Address) -> usize {
        self.codes
            .get(&self.code_hash(address))
            .map(|code| code.len())
            .unwrap_or(0)
    }

    pub fn set_code(&mut self, ctx: &mut TxContext, address: Address, code: Bytes) {
        let hash = keccak256(&code);
        self.codes.insert(hash, code);
        let account = self.ensure_account(ctx, address);
        ctx.record(JournalEntry::CodeChanged {
            address,
            prev_hash: account.code_hash,
        });
        account.code_hash = hash;
    }

    /// Storage value as of the last finalised transaction, before any writes
    /// of the current one.
    pub fn committed_storage(&self, address: Address, key: B256) -> B256 {
        self.committed_storage
            .get(&address)
            .and_then(|slots| slots.get(&key))
            .copied()
            .unwrap_or(B256::ZERO)
    }

    pub fn storage(&self, address: Address, key: B256) -> B256 {
        self.storage
            .get(&address)
            .and_then(|slots| slots.get(&key))
            .copied()
            .unwrap_or(B256::ZERO)
    }

    pub fn set_storage(&mut self, ctx: &mut TxContext, address: Address, key: B256, value: B256) {
        let slots = self.storage.entry(address).or_default();
        let prev = slots.insert(key, value);
        ctx.record(JournalEntry::StorageChanged { address, key, prev });
    }

    /// Marks the account for deletion at finalisation and zeroes its
    /// balance. Returns false when the account does not exist.
    pub fn selfdestruct(&mut self, ctx: &mut TxContext, address: Address) -> bool {
        let Some(account) = self.accounts.get_mut(&address) else {
            return false;
        };
        ctx.record(JournalEntry::Selfdestructed {
            address,
            prev_flag: account.selfdestructed,
            prev_balance: account.balance,
        });
        account.selfdestructed = true;
        account.balance = U256::ZERO;
        true
    }

    pub fn has_selfdestructed(&self, address: Address) -> bool {
        self.accounts
            .get(&address)
            .map(|account| account.selfdestructed)
            .unwrap_or(false)
    }

    pub fn exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    /// True for nonexistent accounts and for accounts with zero nonce, zero
    /// balance, and no code.
    pub fn is_empty(&self, address: Address) -> bool {
        self.accounts
            .get(&address)
            .map(|account| account.is_empty())
            .unwrap_or(true)
    }

    pub fn add_log(&mut self, ctx: &mut TxContext, log: Log) {
        self.logs.entry(ctx.tx_hash()).or_default().push(log);
        ctx.record(JournalEntry::LogAdded);
    }

    /// All logs emitted under `tx_hash`, in emission order.
    pub fn logs(&self, tx_hash: B256) -> Vec<Log> {
        self.logs.get(&tx_hash).cloned().unwrap_or_default()
    }

    pub fn add_preimage(&mut self, ctx: &mut TxContext, hash: B256, preimage: Bytes) {
        if !self.preimages.contains_key(&hash) {
            self.preimages.insert(hash, preimage);
            ctx.record(JournalEntry::PreimageAdded { hash });
        }
    }

    pub fn preimage(&self, hash: B256) -> Option<&Bytes> {
        self.preimages.get(&hash)
    }

    /// Visits the account's current storage in slot order until the callback
    /// returns false.
    pub fn for_each_storage(&self, address: Address, mut f: impl FnMut(B256, B256) -> bool) {
        if let Some(slots) = self.storage.get(&address) {
            for (key, value) in slots {
                if !f(*key, *value) {
                    break;
                }
            }
        }
    }

    /// Undoes every change journaled after `snapshot`, newest first.
    pub fn revert_to_snapshot(&mut self, ctx: &mut TxContext, snapshot: usize) {
        let tail = ctx.journal.split_off(snapshot);
        for entry in tail.into_iter().rev() {
            self.revert_entry(ctx, entry);
        }
    }

    fn revert_entry(&mut self, ctx: &mut TxContext, entry: JournalEntry) {
        match entry {
            JournalEntry::AccountCreated { address, prev } => match prev {
                Some(account) => {
                    self.accounts.insert(address, account);
                }
                None => {
                    self.accounts.remove(&address);
                }
            },
            JournalEntry::BalanceChanged { address, prev } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.balance = prev;
                }
            }
            JournalEntry::NonceChanged { address, prev } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.nonce = prev;
                }
            }
            JournalEntry::CodeChanged { address, prev_hash } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.code_hash = prev_hash;
                }
            }
            JournalEntry::StorageChanged { address, key, prev } => {
                if let Some(slots) = self.storage.get_mut(&address) {
                    match prev {
                        Some(value) => {
                            slots.insert(key, value);
                        }
                        None => {
                            slots.remove(&key);
                        }
                    }
                }
            }
            JournalEntry::Selfdestructed {
                address,
                prev_flag,
                prev_balance,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.selfdestructed = prev_flag;
                    account.balance = prev_balance;
                }
            }
            JournalEntry::RefundChanged { prev } => {
                ctx.refund = prev;
            }
            JournalEntry::LogAdded => {
                let tx_hash = ctx.tx_hash();
                if let Some(logs) = self.logs.get_mut(&tx_hash) {
                    logs.pop();
                    if logs.is_empty() {
                        self.logs.remove(&tx_hash);
                    }
                }
            }
            JournalEntry::PreimageAdded { hash } => {
                self.preimages.remove(&hash);
            }
            JournalEntry::AccessListAddress { address } => {
                ctx.access_list.remove_address(address);
            }
            JournalEntry::AccessListSlot { address, key } => {
                ctx.access_list.remove_slot(address, key);
            }
        }
    }

    /// Settles the transaction's changes into the committed view: deletes
    /// selfdestructed accounts (and, when `delete_empty` is set, accounts
    /// the transaction touched and left empty), promotes their storage, and
    /// clears the journal and refund counter.
    pub fn finalise(&mut self, ctx: &mut TxContext, delete_empty: bool) {
        let touched: BTreeSet<Address> = ctx
            .journal
            .iter()
            .filter_map(JournalEntry::touched_address)
            .collect();
        for address in touched {
            let remove = match self.accounts.get(&address) {
                Some(account) => {
                    account.selfdestructed || (delete_empty && account.is_empty())
                }
                None => false,
            };
            if remove {
                self.accounts.remove(&address);
                self.storage.remove(&address);
                self.committed_storage.remove(&address);
            } else if let Some(slots) = self.storage.get(&address) {
                self.committed_storage.insert(address, slots.clone());
            }
        }
        ctx.clear_journal_and_refund();
    }

    /// Finalises and returns the state digest, the pre-Byzantium per-tx
    /// root. The trie is out of scope; this is a keccak chain over the
    /// sorted store.
    pub fn intermediate_root(&mut self, ctx: &mut TxContext, delete_empty: bool) -> B256 {
        self.finalise(ctx, delete_empty);
        self.state_digest()
    }

    /// Deterministic digest over accounts and storage.
    pub fn state_digest(&self) -> B256 {
        let mut hasher = Keccak256::new();
        for (address, account) in &self.accounts {
            hasher.update(address.as_slice());
            hasher.update(account.nonce.to_be_bytes());
            hasher.update(account.balance.to_be_bytes::<32>());
            hasher.update(account.code_hash.as_slice());
            if let Some(slots) = self.storage.get(address) {
                for (key, value) in slots {
                    hasher.update(key.as_slice());
                    hasher.update(value.as_slice());
                }
            }
        }
        hasher.finalize()
    }
}
