//! Transaction-scoped view over the shared state store.
//!
//! Each executing transaction owns one view. The view carries the
//! transaction's own bookkeeping (journal, warmed access list, hash and
//! index, refund counter) and a handle to the shared store plus the single
//! mutex serializing access to it. Every store operation holds the mutex for
//! exactly the duration of that call and hands the store this transaction's
//! context; the mutex is never held across VM work or lock acquisition.
//!
//! Two transactions with disjoint declared address sets contend only on the
//! store mutex itself. For overlapping sets, ordering is enforced before the
//! mutex is ever taken, by the per-account FIFO locks.

use crate::journal::TxContext;
use crate::state::State;
use crate::types::{AccessList, TxIndex};
use alloy_primitives::{Address, Bytes, Log, B256, U256};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to the store and its serializing mutex.
pub type SharedState = Arc<Mutex<State>>;

/// Per-transaction front end to the shared [`State`].
pub struct TxStateView {
    state: SharedState,
    ctx: TxContext,
}

impl TxStateView {
    pub fn new(state: SharedState, tx_hash: B256, tx_index: TxIndex) -> Self {
        Self {
            state,
            ctx: TxContext::new(tx_hash, tx_index),
        }
    }

    pub fn tx_hash(&self) -> B256 {
        self.ctx.tx_hash()
    }

    pub fn tx_index(&self) -> TxIndex {
        self.ctx.tx_index()
    }

    pub fn create_account(&mut self, address: Address) {
        self.state.lock().create_account(&mut self.ctx, address);
    }

    pub fn add_balance(&mut self, address: Address, amount: U256) {
        self.state.lock().add_balance(&mut self.ctx, address, amount);
    }

    pub fn sub_balance(&mut self, address: Address, amount: U256) {
        self.state.lock().sub_balance(&mut self.ctx, address, amount);
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.state.lock().balance(address)
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.state.lock().nonce(address)
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.state.lock().set_nonce(&mut self.ctx, address, nonce);
    }

    pub fn code(&self, address: Address) -> Bytes {
        self.state.lock().code(address)
    }

    pub fn code_hash(&self, address: Address) -> B256 {
        self.state.lock().code_hash(address)
    }

    pub fn code_size(&self, address: Address) -> usize {
        self.state.lock().code_size(address)
    }

    pub fn set_code(&mut self, address: Address, code: Bytes) {
        self.state.lock().set_code(&mut self.ctx, address, code);
    }

    // The refund counter and the warmed access list are transaction-local;
    // they live in the context and never touch the shared store.

    pub fn add_refund(&mut self, amount: u64) {
        self.ctx.add_refund(amount);
    }

    pub fn sub_refund(&mut self, amount: u64) {
        self.ctx.sub_refund(amount);
    }

    pub fn refund(&self) -> u64 {
        self.ctx.refund()
    }

    pub fn committed_storage(&self, address: Address, key: B256) -> B256 {
        self.state.lock().committed_storage(address, key)
    }

    pub fn storage(&self, address: Address, key: B256) -> B256 {
        self.state.lock().storage(address, key)
    }

    pub fn set_storage(&mut self, address: Address, key: B256, value: B256) {
        self.state
            .lock()
            .set_storage(&mut self.ctx, address, key, value);
    }

    pub fn selfdestruct(&mut self, address: Address) -> bool {
        self.state.lock().selfdestruct(&mut self.ctx, address)
    }

    pub fn has_selfdestructed(&self, address: Address) -> bool {
        self.state.lock().has_selfdestructed(address)
    }

    pub fn exists(&self, address: Address) -> bool {
        self.state.lock().exists(address)
    }

    pub fn is_empty(&self, address: Address) -> bool {
        self.state.lock().is_empty(address)
    }

    pub fn prepare_access_list(
        &mut self,
        sender: Address,
        dest: Option<Address>,
        precompiles: &[Address],
        declared: &AccessList,
    ) {
        self.ctx
            .prepare_access_list(sender, dest, precompiles, declared);
    }

    pub fn address_in_access_list(&self, address: Address) -> bool {
        self.ctx.address_in_access_list(address)
    }

    /// Returns `(address warmed, slot warmed)`.
    pub fn slot_in_access_list(&self, address: Address, key: B256) -> (bool, bool) {
        self.ctx.slot_in_access_list(address, key)
    }

    pub fn add_address_to_access_list(&mut self, address: Address) {
        self.ctx.add_address_to_access_list(address);
    }

    pub fn add_slot_to_access_list(&mut self, address: Address, key: B256) {
        self.ctx.add_slot_to_access_list(address, key);
    }

    pub fn snapshot(&self) -> usize {
        self.ctx.snapshot()
    }

    pub fn revert_to_snapshot(&mut self, snapshot: usize) {
        self.state
            .lock()
            .revert_to_snapshot(&mut self.ctx, snapshot);
    }

    pub fn add_log(&mut self, log: Log) {
        self.state.lock().add_log(&mut self.ctx, log);
    }

    /// Logs this transaction has emitted so far, in order.
    pub fn logs(&self) -> Vec<Log> {
        self.state.lock().logs(self.ctx.tx_hash())
    }

    pub fn add_preimage(&mut self, hash: B256, preimage: Bytes) {
        self.state.lock().add_preimage(&mut self.ctx, hash, preimage);
    }

    pub fn for_each_storage(&self, address: Address, f: impl FnMut(B256, B256) -> bool) {
        self.state.lock().for_each_storage(address, f);
    }

    pub fn finalise(&mut self, delete_empty: bool) {
        self.state.lock().finalise(&mut self.ctx, delete_empty);
    }

    pub fn intermediate_root(&mut self, delete_empty: bool) -> B256 {
        self.state
            .lock()
            .intermediate_root(&mut self.ctx, delete_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn shared() -> SharedState {
        Arc::new(Mutex::new(State::new()))
    }

    #[test]
    fn views_share_one_store() {
        let state = shared();
        let addr = Address::repeat_byte(0x01);

        let mut first = TxStateView::new(state.clone(), B256::repeat_byte(0x0a), 0);
        first.add_balance(addr, U256::from(100));

        let second = TxStateView::new(state, B256::repeat_byte(0x0b), 1);
        assert_eq!(second.balance(addr), U256::from(100));
    }

    #[test]
    fn bookkeeping_stays_per_transaction() {
        let state = shared();
        let addr = Address::repeat_byte(0x02);

        let mut first = TxStateView::new(state.clone(), B256::repeat_byte(0x0a), 0);
        let mut second = TxStateView::new(state, B256::repeat_byte(0x0b), 1);

        first.add_refund(10);
        first.add_address_to_access_list(addr);
        first.add_log(Log::new_unchecked(addr, vec![], Bytes::new()));

        assert_eq!(second.refund(), 0);
        assert!(!second.address_in_access_list(addr));
        assert!(second.logs().is_empty());
        assert_eq!(first.logs().len(), 1);
    }

    #[test]
    fn revert_is_scoped_to_the_reverting_view() {
        let state = shared();
        let addr_a = Address::repeat_byte(0x03);
        let addr_b = Address::repeat_byte(0x04);

        let mut first = TxStateView::new(state.clone(), B256::repeat_byte(0x0a), 0);
        let mut second = TxStateView::new(state, B256::repeat_byte(0x0b), 1);

        first.add_balance(addr_a, U256::from(5));
        let snapshot = second.snapshot();
        second.add_balance(addr_b, U256::from(7));
        second.revert_to_snapshot(snapshot);

        assert_eq!(first.balance(addr_a), U256::from(5));
        assert_eq!(first.balance(addr_b), U256::ZERO);
    }

    #[test]
    fn concurrent_disjoint_views_only_contend_on_the_mutex() {
        let state = shared();
        let mut handles = Vec::new();
        for i in 0..4u8 {
            let state = state.clone();
            handles.push(thread::spawn(move || {
                let addr = Address::repeat_byte(i + 1);
                let mut view = TxStateView::new(state, B256::repeat_byte(i + 1), i as usize);
                for _ in 0..100 {
                    view.add_balance(addr, U256::from(1));
                }
                view.finalise(true);
            }));
        }
        for handle in handles {
            handle.join().expect("worker panicked");
        }
        for i in 0..4u8 {
            let addr = Address::repeat_byte(i + 1);
            assert_eq!(state.lock().balance(addr), U256::from(100));
        }
    }
}
