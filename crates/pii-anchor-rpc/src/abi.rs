// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Calldata for the ledger contract's batch entry point.
//!
//! Standard ABI encoding of a single dynamic `bytes32[]` argument:
//!
//! ```text
//! selector(4) | offset = 0x20 (32) | length (32) | element_0 (32) | ...
//! ```

use pii_anchor_core::NormalizedDigest;
use sha3::{Digest, Keccak256};

/// Signature of the batch storage function.
pub const STORE_MULTIPLE_PII: &str = "storeMultiplePii(bytes32[])";

const WORD: usize = 32;

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn word(value: u64) -> [u8; WORD] {
    let mut out = [0u8; WORD];
    out[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Encode a `storeMultiplePii(bytes32[])` call carrying `hashes` in order.
pub fn encode_store_multiple_pii(hashes: &[NormalizedDigest]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + WORD * (2 + hashes.len()));
    out.extend_from_slice(&selector(STORE_MULTIPLE_PII));
    out.extend_from_slice(&word(WORD as u64));
    out.extend_from_slice(&word(hashes.len() as u64));
    for hash in hashes {
        out.extend_from_slice(hash.as_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pii_anchor_core::normalize;

    #[test]
    fn selectors_match_known_values() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(selector(STORE_MULTIPLE_PII), [0xd4, 0x14, 0xdf, 0x55]);
    }

    #[test]
    fn encodes_dynamic_bytes32_array() {
        let hashes = vec![normalize("ab12").unwrap(), normalize("00ff00ff").unwrap()];
        let data = encode_store_multiple_pii(&hashes);
        assert_eq!(data.len(), 4 + 32 * 4);
        assert_eq!(&data[..4], &[0xd4, 0x14, 0xdf, 0x55]);
        assert_eq!(data[4 + 31], 0x20);
        assert!(data[4..4 + 31].iter().all(|b| *b == 0));
        assert_eq!(data[36 + 31], 2);
        assert_eq!(&data[68..100], hashes[0].as_bytes());
        assert_eq!(&data[100..132], hashes[1].as_bytes());
        assert_eq!(&data[98..100], &[0xab, 0x12]);
    }

    #[test]
    fn empty_array_is_header_only() {
        let data = encode_store_multiple_pii(&[]);
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(data[36 + 31], 0);
    }
}
