//! Per-transaction bookkeeping carried alongside the shared state store.
//!
//! Every mutating store operation takes the owning transaction's
//! [`TxContext`] as an explicit argument; the store itself holds nothing
//! transaction-specific. The journal records reversible entries so a
//! snapshot is just a journal length.

use crate::state::Account;
use alloy_primitives::{Address, B256, U256};
use std::collections::HashSet;

/// Transaction-specific execution state: the reversible change journal, the
/// warmed access list, the transaction's identity in the block, and the gas
/// refund counter.
#[derive(Debug)]
pub struct TxContext {
    pub(crate) journal: Vec<JournalEntry>,
    pub(crate) access_list: TxAccessList,
    tx_hash: B256,
    tx_index: usize,
    pub(crate) refund: u64,
}

impl TxContext {
    pub fn new(tx_hash: B256, tx_index: usize) -> Self {
        Self {
            journal: Vec::new(),
            access_list: TxAccessList::default(),
            tx_hash,
            tx_index,
            refund: 0,
        }
    }

    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    pub fn tx_index(&self) -> usize {
        self.tx_index
    }

    /// Current journal length; pass back to revert everything after it.
    pub fn snapshot(&self) -> usize {
        self.journal.len()
    }

    pub fn refund(&self) -> u64 {
        self.refund
    }

    pub fn add_refund(&mut self, amount: u64) {
        self.record(JournalEntry::RefundChanged { prev: self.refund });
        self.refund += amount;
    }

    /// Panics if the counter would go below zero; the VM only returns what
    /// it previously added.
    pub fn sub_refund(&mut self, amount: u64) {
        self.record(JournalEntry::RefundChanged { prev: self.refund });
        self.refund = self
            .refund
            .checked_sub(amount)
            .unwrap_or_else(|| panic!("refund counter below zero"));
    }

    /// Warms the transaction's declared footprint at execution start:
    /// sender, destination, precompiles, and every access-list entry.
    /// Not journaled; it precedes the first snapshot.
    pub fn prepare_access_list(
        &mut self,
        sender: Address,
        dest: Option<Address>,
        precompiles: &[Address],
        declared: &crate::types::AccessList,
    ) {
        self.access_list.insert_address(sender);
        if let Some(dest) = dest {
            self.access_list.insert_address(dest);
        }
        for address in precompiles {
            self.access_list.insert_address(*address);
        }
        for item in declared {
            self.access_list.insert_address(item.address);
            for key in &item.storage_keys {
                self.access_list.insert_slot(item.address, *key);
            }
        }
    }

    pub fn address_in_access_list(&self, address: Address) -> bool {
        self.access_list.contains_address(address)
    }

    /// Returns `(address warmed, slot warmed)`.
    pub fn slot_in_access_list(&self, address: Address, key: B256) -> (bool, bool) {
        (
            self.access_list.contains_address(address),
            self.access_list.contains_slot(address, key),
        )
    }

    pub fn add_address_to_access_list(&mut self, address: Address) {
        if self.access_list.insert_address(address) {
            self.record(JournalEntry::AccessListAddress { address });
        }
    }

    pub fn add_slot_to_access_list(&mut self, address: Address, key: B256) {
        if self.access_list.insert_address(address) {
            self.record(JournalEntry::AccessListAddress { address });
        }
        if self.access_list.insert_slot(address, key) {
            self.record(JournalEntry::AccessListSlot { address, key });
        }
    }

    pub(crate) fn record(&mut self, entry: JournalEntry) {
        self.journal.push(entry);
    }

    pub(crate) fn clear_journal_and_refund(&mut self) {
        self.journal.clear();
        self.refund = 0;
    }
}

/// Addresses and storage slots warmed so far during one transaction.
#[derive(Debug, Default)]
pub(crate) struct TxAccessList {
    addresses: HashSet<Address>,
    slots: HashSet<(Address, B256)>,
}

impl TxAccessList {
    pub(crate) fn contains_address(&self, address: Address) -> bool {
        self.addresses.contains(&address)
    }

    pub(crate) fn contains_slot(&self, address: Address, key: B256) -> bool {
        self.slots.contains(&(address, key))
    }

    /// True if the address was not already present.
    pub(crate) fn insert_address(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    /// True if the slot was not already present.
    pub(crate) fn insert_slot(&mut self, address: Address, key: B256) -> bool {
        self.slots.insert((address, key))
    }

    pub(crate) fn remove_address(&mut self, address: Address) {
        self.addresses.remove(&address);
    }

    pub(crate) fn remove_slot(&mut self, address: Address, key: B256) {
        self.slots.remove(&(address, key));
    }
}

/// One reversible state change. Reverting applies entries newest-first.
#[derive(Debug)]
pub(crate) enum JournalEntry {
    /// Account inserted or reset; `prev` restores the overwritten account.
    AccountCreated {
        address: Address,
        prev: Option<Account>,
    },
    BalanceChanged {
        address: Address,
        prev: U256,
    },
    NonceChanged {
        address: Address,
        prev: u64,
    },
    CodeChanged {
        address: Address,
        prev_hash: B256,
    },
    StorageChanged {
        address: Address,
        key: B256,
        prev: Option<B256>,
    },
    Selfdestructed {
        address: Address,
        prev_flag: bool,
        prev_balance: U256,
    },
    RefundChanged {
        prev: u64,
    },
    LogAdded,
    PreimageAdded {
        hash: B256,
    },
    AccessListAddress {
        address: Address,
    },
    AccessListSlot {
        address: Address,
        key: B256,
    },
}

impl JournalEntry {
    /// The account this entry dirtied, for finalisation bookkeeping.
    pub(crate) fn touched_address(&self) -> Option<Address> {
        match self {
            JournalEntry::AccountCreated { address, .. }
            | JournalEntry::BalanceChanged { address, .. }
            | JournalEntry::NonceChanged { address, .. }
            | JournalEntry::CodeChanged { address, .. }
            | JournalEntry::StorageChanged { address, .. }
            | JournalEntry::Selfdestructed { address, .. } => Some(*address),
            JournalEntry::RefundChanged { .. }
            | JournalEntry::LogAdded
            | JournalEntry::PreimageAdded { .. }
            | JournalEntry::AccessListAddress { .. }
            | JournalEntry::AccessListSlot { .. } => None,
        }
    }
}
