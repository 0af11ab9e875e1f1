//! Per-block map of account FIFO locks built from transaction access lists.

use crate::fifo_lock::FifoLock;
use crate::types::Transaction;
use alloy_primitives::Address;
use std::collections::HashMap;

/// All account locks for one block.
///
/// Built in a single pass over the transactions in block order: the first
/// transaction to declare an address becomes that lock's head, every later
/// one reserves its slot. Because each individual lock grants in ascending
/// block index, any wait edge points from a higher index to a lower one, so
/// the wait graph is acyclic and deadlock cannot occur regardless of the
/// order addresses are acquired in.
pub struct AccessListLocks {
    address_locks: HashMap<Address, FifoLock>,
}

impl AccessListLocks {
    /// Builds the lock map for a block's transactions.
    pub fn new(transactions: &[Transaction]) -> Self {
        let mut address_locks: HashMap<Address, FifoLock> = HashMap::new();
        for tx in transactions {
            for item in tx.access_list() {
                match address_locks.get(&item.address) {
                    Some(lock) => lock.reserve(tx.hash()),
                    None => {
                        address_locks.insert(item.address, FifoLock::new(tx.hash()));
                    }
                }
            }
        }
        Self { address_locks }
    }

    /// Acquires every lock in the transaction's access list, blocking until
    /// all predecessors have released.
    ///
    /// Panics if the transaction was not part of this set's construction.
    pub fn lock(&self, tx: &Transaction) {
        for item in tx.access_list() {
            self.lock_for(&item.address).lock(tx.hash());
        }
    }

    /// Releases every lock in the transaction's access list, promoting the
    /// next reserver on each.
    pub fn unlock(&self, tx: &Transaction) {
        for item in tx.access_list() {
            self.lock_for(&item.address).unlock(tx.hash());
        }
    }

    fn lock_for(&self, address: &Address) -> &FifoLock {
        self.address_locks
            .get(address)
            .unwrap_or_else(|| panic!("no lock registered for address {address}"))
    }
}
