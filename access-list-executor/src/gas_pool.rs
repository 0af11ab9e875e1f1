//! Block-level gas accounting shared by concurrently executing transactions.

use parking_lot::RwLock;
use thiserror::Error;

/// Returned by [`GasPool::sub`] when the pool cannot cover the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("gas limit reached")]
pub struct GasLimitReached;

/// Tracks the amount of gas available while executing the transactions in a
/// block. The default value is a pool with zero gas available.
#[derive(Debug, Default)]
pub struct GasPool {
    gas: RwLock<u64>,
}

impl GasPool {
    /// Creates a pool seeded with `amount` gas.
    pub fn new(amount: u64) -> Self {
        let pool = Self::default();
        pool.add(amount);
        pool
    }

    /// Makes gas available for execution.
    ///
    /// Panics if the pool would exceed `u64::MAX`; the pool is seeded from a
    /// block gas limit and only ever refunded amounts previously subtracted,
    /// so overflow means a caller bug.
    pub fn add(&self, amount: u64) {
        let mut gas = self.gas.write();
        *gas = gas
            .checked_add(amount)
            .unwrap_or_else(|| panic!("gas pool pushed above u64"));
    }

    /// Deducts `amount` from the pool if enough gas is available, and
    /// reports [`GasLimitReached`] otherwise. The pool never goes negative.
    pub fn sub(&self, amount: u64) -> Result<(), GasLimitReached> {
        let mut gas = self.gas.write();
        if *gas < amount {
            return Err(GasLimitReached);
        }
        *gas -= amount;
        Ok(())
    }

    /// The amount of gas remaining in the pool.
    pub fn gas(&self) -> u64 {
        *self.gas.read()
    }
}

impl std::fmt::Display for GasPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.gas())
    }
}
