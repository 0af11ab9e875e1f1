//! Per-account FIFO resource lock.
//!
//! Grants exclusive access to one account in the exact order transactions
//! were reserved, which the lock set arranges to be ascending block index.
//! Fairness is fixed before any worker races: the grant order is decided at
//! construction time, so ordering never depends on scheduler behavior.

use alloy_primitives::B256;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashSet, VecDeque};

/// FIFO mutual exclusion for a single account.
///
/// The transaction that constructs the lock is the initial head and may
/// proceed immediately; every later transaction must `reserve` before
/// workers start and then `lock` to wait its turn.
pub struct FifoLock {
    inner: Mutex<Inner>,
    grant: Condvar,
}

struct Inner {
    /// Hash currently permitted to hold the account. Must release before
    /// anyone else may proceed.
    head: B256,
    /// Reserved hashes in the order they were declared.
    queue: VecDeque<B256>,
    /// Every hash ever reserved, for catching lock attempts by strangers.
    reserved: HashSet<B256>,
}

impl FifoLock {
    /// Creates the lock with `head` as the first reserver: `head` must
    /// release before anyone else can access the account.
    pub fn new(head: B256) -> Self {
        Self {
            inner: Mutex::new(Inner {
                head,
                queue: VecDeque::new(),
                reserved: HashSet::new(),
            }),
            grant: Condvar::new(),
        }
    }

    /// Appends `tx_hash` to the wait queue.
    ///
    /// Panics if called with the current head hash: the head never queues
    /// behind itself, and hitting this means the caller built the lock set
    /// wrong.
    pub fn reserve(&self, tx_hash: B256) {
        let mut inner = self.inner.lock();
        if tx_hash == inner.head {
            panic!("cannot reserve head tx {tx_hash}");
        }
        inner.queue.push_back(tx_hash);
        inner.reserved.insert(tx_hash);
    }

    /// Blocks until `tx_hash` is granted the account. The head returns
    /// immediately without waiting.
    ///
    /// Panics if `tx_hash` was never reserved and is not the head.
    pub fn lock(&self, tx_hash: B256) {
        let mut inner = self.inner.lock();
        if inner.head == tx_hash {
            return;
        }
        if !inner.reserved.contains(&tx_hash) {
            panic!("unexpected attempt to grab lock from tx hash {tx_hash}");
        }
        while inner.head != tx_hash {
            self.grant.wait(&mut inner);
        }
    }

    /// Releases the account and promotes the next queued hash to head,
    /// waking its waiter.
    ///
    /// Panics unless `tx_hash` is the current head.
    pub fn unlock(&self, tx_hash: B256) {
        let mut inner = self.inner.lock();
        if inner.head != tx_hash {
            panic!("unlock attempt from incorrect tx hash {tx_hash}");
        }
        // Pop front, advance. An empty queue leaves the lock fully drained;
        // the set of reservers is fixed at construction so no one arrives
        // later.
        if let Some(next) = inner.queue.pop_front() {
            inner.head = next;
            drop(inner);
            self.grant.notify_all();
        }
    }
}
