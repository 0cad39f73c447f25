// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port to the signing/ledger capability, plus the value types it speaks.
//!
//! The core never talks to a node directly. Adapters implement
//! [`LedgerPort`] (JSON-RPC in `pii-anchor-rpc`, a scriptable fake in the
//! dry-tests crate); [`crate::LedgerSubmitter`] owns the state machine on
//! top of it.

use std::fmt;
use std::future::Future;

use thiserror::Error;

use crate::digest::NormalizedDigest;

/// Errors parsing a hex address or transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Empty or whitespace-only input.
    #[error("address is empty")]
    Empty,
    /// Missing the `0x` prefix.
    #[error("address must start with 0x")]
    MissingPrefix,
    /// Not hex, or wrong width.
    #[error("expected {expected} hex-encoded bytes")]
    BadHex {
        /// Expected width in bytes.
        expected: usize,
    },
}

fn parse_fixed<const N: usize>(text: &str) -> Result<[u8; N], AddressError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AddressError::Empty);
    }
    let body = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;
    let mut out = [0u8; N];
    hex::decode_to_slice(body, &mut out).map_err(|_| AddressError::BadHex { expected: N })?;
    Ok(out)
}

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Parse a `0x`-prefixed, 40-hex-character address. Checksum casing is not enforced.
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        parse_fixed(text).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Hash of a sent transaction; the transaction reference shown to operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// Parse a `0x`-prefixed, 64-hex-character transaction hash.
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        parse_fixed(text).map(Self)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// One `storeMultiplePii(bytes32[])` call, fully specified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTransaction {
    /// Signing account.
    pub from: Address,
    /// Ledger contract.
    pub contract: Address,
    /// Digests in batch order; becomes the `bytes32[]` argument verbatim.
    pub hashes: Vec<NormalizedDigest>,
}

/// Outcome of a finalized transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction the receipt belongs to.
    pub tx_hash: TxHash,
    /// Block that included it, when reported.
    pub block_number: Option<u64>,
    /// `false` when the transaction was included but reverted.
    pub succeeded: bool,
}

/// Errors reported by a ledger adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No signing capability (no node, no unlocked account).
    #[error("signing capability unavailable: {0}")]
    SigningUnavailable(String),
    /// The node or account refused the request.
    #[error("rejected: {0}")]
    Rejected(String),
    /// Transport-level failure talking to the node.
    #[error("transport: {0}")]
    Transport(String),
}

/// Signing/ledger capability: account request, transaction send, finalization wait.
///
/// Timeouts are the caller's concern; `wait_for_finalization` may wait
/// indefinitely.
pub trait LedgerPort: Send + Sync {
    /// Ask the signer for its active account.
    fn request_account(&self) -> impl Future<Output = Result<Address, LedgerError>> + Send;

    /// Send the batch transaction; resolves once the node has accepted it.
    fn send_batch(
        &self,
        tx: &BatchTransaction,
    ) -> impl Future<Output = Result<TxHash, LedgerError>> + Send;

    /// Resolve once `tx_hash` is finalized (included, successfully or not).
    fn wait_for_finalization(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TxReceipt, LedgerError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trips_through_display() {
        let text = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
        assert_eq!(Address::parse(text).map(|a| a.to_string()), Ok(text.to_string()));
    }

    #[test]
    fn placeholder_addresses_are_rejected() {
        assert_eq!(Address::parse("   "), Err(AddressError::Empty));
        assert_eq!(
            Address::parse("5fbdb2315678afecb367f032d93f642f64180aa3"),
            Err(AddressError::MissingPrefix)
        );
        assert_eq!(
            Address::parse("0x5fbdb2"),
            Err(AddressError::BadHex { expected: 20 })
        );
    }

    #[test]
    fn tx_hash_requires_full_width() {
        assert!(TxHash::parse(&format!("0x{}", "ab".repeat(32))).is_ok());
        assert_eq!(
            TxHash::parse(&format!("0x{}", "ab".repeat(20))),
            Err(AddressError::BadHex { expected: 32 })
        );
    }
}
