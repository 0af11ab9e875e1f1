//! Transactions, blocks, and receipts for access-list driven execution.

use alloy_primitives::{Address, Bloom, Bytes, Keccak256, Signature, B256, U256};
use thiserror::Error;

/// Keccak-256 hash of the empty byte string, the code hash of accounts
/// without code.
pub const EMPTY_CODE_HASH: B256 = alloy_primitives::b256!(
    "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
);

/// Transaction index within a block (0-based).
pub type TxIndex = usize;

/// One entry of a transaction's access list: an account address plus the
/// storage slots the transaction may touch under it. Only the address
/// participates in locking; the slots are forwarded to access-list warming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

impl AccessListItem {
    /// An address-only entry with no storage keys.
    pub fn address_only(address: Address) -> Self {
        Self { address, storage_keys: Vec::new() }
    }
}

/// The full declared access list of a transaction.
pub type AccessList = Vec<AccessListItem>;

/// Error returned when the sender cannot be recovered from a transaction
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transaction signature")]
pub struct SignerError;

/// Transaction fields prior to signing.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    /// `None` marks a contract-creation transaction.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
}

impl UnsignedTransaction {
    /// Computes the hash the sender signs. Doubles as the transaction hash
    /// of the signed form, so it must commit to every field.
    pub fn signing_hash(&self) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.chain_id.to_be_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.gas_price.to_be_bytes());
        hasher.update(self.gas_limit.to_be_bytes());
        match self.to {
            Some(to) => {
                hasher.update([1u8]);
                hasher.update(to.as_slice());
            }
            None => hasher.update([0u8]),
        }
        hasher.update(self.value.to_be_bytes::<32>());
        hasher.update(&self.data);
        for item in &self.access_list {
            hasher.update(item.address.as_slice());
            for key in &item.storage_keys {
                hasher.update(key.as_slice());
            }
        }
        hasher.finalize()
    }

    /// Attaches a signature, producing an executable transaction.
    pub fn into_signed(self, signature: Signature) -> Transaction {
        let hash = self.signing_hash();
        Transaction { inner: self, signature, hash }
    }
}

/// A signed transaction as it appears in a block.
#[derive(Debug, Clone)]
pub struct Transaction {
    inner: UnsignedTransaction,
    signature: Signature,
    hash: B256,
}

impl Transaction {
    /// The transaction hash, unique within a block.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn nonce(&self) -> u64 {
        self.inner.nonce
    }

    pub fn gas_limit(&self) -> u64 {
        self.inner.gas_limit
    }

    pub fn to(&self) -> Option<Address> {
        self.inner.to
    }

    pub fn access_list(&self) -> &AccessList {
        &self.inner.access_list
    }

    /// Recovers the sender from the signature and produces the message the
    /// VM executes. Recovery failure rejects the whole block.
    pub fn as_message(&self) -> Result<Message, SignerError> {
        let from = self
            .signature
            .recover_address_from_prehash(&self.hash)
            .map_err(|_| SignerError)?;
        Ok(Message {
            from,
            to: self.inner.to,
            nonce: self.inner.nonce,
            value: self.inner.value,
            gas_limit: self.inner.gas_limit,
            gas_price: self.inner.gas_price,
            data: self.inner.data.clone(),
            access_list: self.inner.access_list.clone(),
        })
    }
}

/// A transaction with its sender recovered, ready for the VM.
#[derive(Debug, Clone)]
pub struct Message {
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub data: Bytes,
    pub access_list: AccessList,
}

impl Message {
    /// True for contract-creation messages.
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }
}

/// Block header.
#[derive(Debug, Clone)]
pub struct Header {
    pub number: u64,
    pub gas_limit: u64,
    pub coinbase: Address,
    pub timestamp: u64,
    pub base_fee: Option<U256>,
    pub parent_hash: B256,
}

impl Header {
    /// Digest over the header fields.
    pub fn hash(&self) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.gas_limit.to_be_bytes());
        hasher.update(self.coinbase.as_slice());
        hasher.update(self.timestamp.to_be_bytes());
        if let Some(fee) = self.base_fee {
            hasher.update(fee.to_be_bytes::<32>());
        }
        hasher.update(self.parent_hash.as_slice());
        hasher.finalize()
    }
}

/// An ordered batch of transactions under a header.
#[derive(Debug, Clone)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
    pub ommers: Vec<Header>,
}

/// Outcome flag of an executed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Failed,
    Success,
}

impl ReceiptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ReceiptStatus::Success)
    }
}

/// Post-execution summary of one transaction.
///
/// `cumulative_gas_used` is provisional until the processor recomputes it as
/// an in-order prefix sum after all transactions have joined.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub status: ReceiptStatus,
    pub tx_hash: B256,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    pub logs: Vec<alloy_primitives::Log>,
    pub bloom: Bloom,
    /// Set for contract-creation transactions: derived from sender + nonce.
    pub contract_address: Option<Address>,
    pub block_hash: B256,
    pub block_number: u64,
    pub transaction_index: TxIndex,
}

/// Accumulates the logs of a single receipt into a bloom filter.
pub fn logs_bloom(logs: &[alloy_primitives::Log]) -> Bloom {
    let mut bloom = Bloom::default();
    for log in logs {
        bloom.accrue_log(log);
    }
    bloom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{signed_transfer, test_signer};
    use alloy_primitives::{Address, U256};

    #[test]
    fn signing_hash_commits_to_access_list() {
        let base = UnsignedTransaction {
            chain_id: 1,
            nonce: 0,
            gas_price: 1,
            gas_limit: 21_000,
            to: Some(Address::repeat_byte(0x11)),
            value: U256::from(5),
            data: Bytes::new(),
            access_list: Vec::new(),
        };
        let mut listed = base.clone();
        listed.access_list = vec![AccessListItem::address_only(Address::repeat_byte(0x22))];

        assert_ne!(base.signing_hash(), listed.signing_hash());
    }

    #[test]
    fn message_recovers_signer() {
        let (key, address) = test_signer(7);
        let tx = signed_transfer(&key, 0, Address::repeat_byte(0x01), U256::from(10), &[]);

        let msg = tx.as_message().expect("recovery succeeds");
        assert_eq!(msg.from, address);
        assert_eq!(msg.nonce, 0);
        assert_eq!(msg.value, U256::from(10));
    }

    #[test]
    fn distinct_nonces_produce_distinct_hashes() {
        let (key, _) = test_signer(9);
        let a = signed_transfer(&key, 0, Address::repeat_byte(0x01), U256::from(1), &[]);
        let b = signed_transfer(&key, 1, Address::repeat_byte(0x01), U256::from(1), &[]);
        assert_ne!(a.hash(), b.hash());
    }
}
