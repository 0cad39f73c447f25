// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical 32-byte form of a fingerprint digest (`bytes32` on-chain).
//!
//! Input is hex, optionally `0x`-prefixed, case-insensitive. Shorter digests
//! are left-padded with zero bytes; longer ones are rejected, never
//! truncated. Padding means `ab12` and `00ab12` share a normalized value, so
//! the mapping is injective only over digests without leading zero bytes.

use std::fmt;

use crate::error::{AnchorError, DigestFault};
use crate::record::FingerprintBatch;

/// Width of a normalized digest in bytes.
pub const DIGEST_BYTES: usize = 32;

/// A digest in its fixed-width on-chain form.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NormalizedDigest(pub [u8; DIGEST_BYTES]);

impl NormalizedDigest {
    /// View the digest as bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_BYTES] {
        &self.0
    }

    /// `0x` followed by 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for NormalizedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Normalize a textual digest into its 32-byte form.
pub fn normalize(digest: &str) -> Result<NormalizedDigest, AnchorError> {
    let malformed = |fault| AnchorError::MalformedDigest {
        digest: digest.to_string(),
        fault,
    };
    let body = digest
        .strip_prefix("0x")
        .or_else(|| digest.strip_prefix("0X"))
        .unwrap_or(digest);
    if body.is_empty() {
        return Err(malformed(DigestFault::Empty));
    }
    let bytes = hex::decode(body).map_err(|err| {
        malformed(match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => DigestFault::NotHex {
                character: c,
                index,
            },
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                DigestFault::OddLength
            }
        })
    })?;
    if bytes.len() > DIGEST_BYTES {
        return Err(malformed(DigestFault::TooLong { bytes: bytes.len() }));
    }
    let mut out = [0u8; DIGEST_BYTES];
    out[DIGEST_BYTES - bytes.len()..].copy_from_slice(&bytes);
    Ok(NormalizedDigest(out))
}

/// Normalize every record of a batch, in order. The first failure aborts.
pub fn normalize_batch(batch: &FingerprintBatch) -> Result<Vec<NormalizedDigest>, AnchorError> {
    batch.records().iter().map(|r| normalize(r.digest())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DocumentId, HashAlgorithm, PiiRecord};

    #[test]
    fn left_pads_short_digests() {
        let d = normalize("ab12").map(|d| d.0);
        let mut expected = [0u8; 32];
        expected[30] = 0xab;
        expected[31] = 0x12;
        assert_eq!(d, Ok(expected));
    }

    #[test]
    fn accepts_prefix_and_uppercase() {
        assert_eq!(normalize("0xAB12"), normalize("ab12"));
        assert_eq!(normalize("0Xab12"), normalize("AB12"));
    }

    #[test]
    fn full_width_sha256_is_unchanged() {
        let hex64 = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let d = normalize(hex64);
        assert_eq!(d.map(|d| d.to_hex()), Ok(format!("0x{hex64}")));
    }

    #[test]
    fn thirty_three_bytes_is_rejected() {
        let hex66 = "ff".repeat(33);
        assert_eq!(
            normalize(&hex66),
            Err(AnchorError::MalformedDigest {
                digest: hex66.clone(),
                fault: DigestFault::TooLong { bytes: 33 },
            })
        );
    }

    #[test]
    fn rejects_empty_odd_and_non_hex() {
        let fault_of = |s: &str| match normalize(s) {
            Err(AnchorError::MalformedDigest { fault, .. }) => Some(fault),
            _ => None,
        };
        assert_eq!(fault_of(""), Some(DigestFault::Empty));
        assert_eq!(fault_of("0x"), Some(DigestFault::Empty));
        assert_eq!(fault_of("abc"), Some(DigestFault::OddLength));
        assert_eq!(
            fault_of("ag"),
            Some(DigestFault::NotHex {
                character: 'g',
                index: 1
            })
        );
    }

    #[test]
    fn batch_normalization_stops_at_first_bad_digest() {
        let rec = |d: &str| PiiRecord::new("EMAIL", DocumentId::Numeric(1), d, HashAlgorithm::Sha256);
        let batch = FingerprintBatch::new(vec![rec("ab12"), rec("xyz1"), rec("cd")]);
        let result = batch.and_then(|b| normalize_batch(&b));
        assert!(matches!(
            result,
            Err(AnchorError::MalformedDigest { ref digest, .. }) if digest == "xyz1"
        ));
    }
}
