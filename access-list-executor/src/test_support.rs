//! Shared helpers for the crate's tests: deterministic signing keys and
//! transaction builders.

use crate::types::{AccessListItem, Transaction, UnsignedTransaction};
use alloy_primitives::{keccak256, Address, Bytes, Signature, B256, U256};
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Deterministic signing key plus its derived address.
pub(crate) fn test_signer(seed: u64) -> (SigningKey, Address) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut key_bytes = [0u8; 32];
    rng.fill(&mut key_bytes);
    let key = SigningKey::from_bytes(&key_bytes.into()).expect("valid key bytes");
    let address = public_key_to_address(&VerifyingKey::from(&key));
    (key, address)
}

fn public_key_to_address(verifying_key: &VerifyingKey) -> Address {
    let encoded = verifying_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Signs an unsigned transaction with the given key.
pub(crate) fn sign_tx(key: &SigningKey, unsigned: UnsignedTransaction) -> Transaction {
    let hash = unsigned.signing_hash();
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(hash.as_slice())
        .expect("signing should succeed");
    unsigned.into_signed(Signature::from_signature_and_parity(sig, recovery_id.is_y_odd()))
}

/// A signed value transfer with an address-only access list.
pub(crate) fn signed_transfer(
    key: &SigningKey,
    nonce: u64,
    to: Address,
    value: U256,
    accessed: &[Address],
) -> Transaction {
    sign_tx(
        key,
        UnsignedTransaction {
            chain_id: 1,
            nonce,
            gas_price: 1,
            gas_limit: 100_000,
            to: Some(to),
            value,
            data: Bytes::new(),
            access_list: accessed
                .iter()
                .map(|address| AccessListItem::address_only(*address))
                .collect(),
        },
    )
}

/// A transaction that is never executed, only locked: the signature is a
/// placeholder and the hash still commits to the fields.
pub(crate) fn dummy_tx(nonce: u64, accessed: &[Address]) -> Transaction {
    UnsignedTransaction {
        chain_id: 1,
        nonce,
        gas_price: 1,
        gas_limit: 21_000,
        to: Some(Address::repeat_byte(0x01)),
        value: U256::ZERO,
        data: Bytes::new(),
        access_list: accessed
            .iter()
            .map(|address| AccessListItem::address_only(*address))
            .collect(),
    }
    .into_signed(Signature::new(U256::from(1), U256::from(1), false))
}
