// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Payloads, records and addresses shared across test suites.

use pii_anchor_core::{Address, DocumentId, FingerprintSet, HashAlgorithm, PiiRecord};

/// A well-formed contract address (the first Hardhat deployment address).
pub const CONTRACT_HEX: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

/// Parsed [`CONTRACT_HEX`].
pub fn contract() -> Address {
    Address([
        0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64,
        0x2f, 0x64, 0x18, 0x0a, 0xa3,
    ])
}

/// The signing account the fake ledger hands out by default.
pub fn account() -> Address {
    Address([0xf3; 20])
}

/// A detection record for document 7.
pub fn record(pii_type: &str, digest: &str) -> PiiRecord {
    PiiRecord::new(pii_type, DocumentId::Numeric(7), digest, HashAlgorithm::Sha256)
}

/// Detection payload JSON for document 7 with the given `(type, hash)` pairs.
pub fn payload_json(detections: &[(&str, &str)]) -> String {
    let items: Vec<String> = detections
        .iter()
        .map(|(t, h)| format!(r#"{{"type":"{t}","hash":"{h}","match":"<redacted>"}}"#))
        .collect();
    format!(r#"{{"document_id":7,"detections":[{}]}}"#, items.join(","))
}

/// The two-record EMAIL/SSN set used by the end-to-end scenarios.
pub fn scenario_set() -> FingerprintSet {
    FingerprintSet::from_payload_json(&payload_json(&[("EMAIL", "ab12"), ("SSN", "00ff00ff")]))
}
