// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! PII fingerprint records and the session-scoped set they are loaded into.
//!
//! The detection payload is a single JSON object:
//!
//! ```json
//! { "document_id": 7, "detections": [ { "type": "EMAIL", "hash": "ab12…" } ] }
//! ```
//!
//! Loading never fails. A payload that is not valid JSON yields an empty set.
//! A missing or unusable `document_id` keeps the detections but leaves their
//! document reference absent, which [`FingerprintSet::missing_document`]
//! reports. Individual detections without a string `type` and `hash` are
//! skipped and counted. Any matched-text field the detector emitted is
//! ignored and never retained.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AnchorError;

/// Opaque reference to the source document, preserved in its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    /// Numeric key (backends usually render a primary key).
    Numeric(u64),
    /// Any other textual identifier.
    Text(String),
}

impl DocumentId {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self::Numeric),
            Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Hash function that produced a digest. Carried for display; never sent on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-256 over the matched text (the detector default).
    #[default]
    Sha256,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl HashAlgorithm {
    /// Parse a tag, case-insensitively recognising SHA-256 spellings.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" | "sha2-256" => Self::Sha256,
            _ => Self::Other(tag.trim().to_string()),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => f.write_str("sha256"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

/// One detected PII item, reduced to its fingerprint. Identity is the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiRecord {
    pii_type: String,
    document_id: Option<DocumentId>,
    digest: String,
    algorithm: HashAlgorithm,
}

impl PiiRecord {
    /// Build a record. The digest is kept exactly as supplied.
    pub fn new(
        pii_type: impl Into<String>,
        document_id: impl Into<Option<DocumentId>>,
        digest: impl Into<String>,
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            pii_type: pii_type.into(),
            document_id: document_id.into(),
            digest: digest.into(),
            algorithm,
        }
    }

    /// Detector label, e.g. `EMAIL` or `SSN`.
    pub fn pii_type(&self) -> &str {
        &self.pii_type
    }

    /// Source document reference, when the payload carried a usable one.
    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    /// Hex digest as originally supplied.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Hash function tag.
    pub fn algorithm(&self) -> &HashAlgorithm {
        &self.algorithm
    }
}

#[derive(Deserialize)]
struct RawDetection {
    #[serde(rename = "type")]
    pii_type: String,
    hash: String,
    #[serde(default)]
    algorithm: Option<String>,
}

/// Immutable set of records loaded once per session, in payload order.
#[derive(Debug, Clone, Default)]
pub struct FingerprintSet {
    document_id: Option<DocumentId>,
    records: Vec<PiiRecord>,
    skipped: usize,
}

impl FingerprintSet {
    /// Build a set from already-constructed records. Later duplicates of a digest are skipped.
    pub fn from_records(records: impl IntoIterator<Item = PiiRecord>) -> Self {
        let mut set = Self::default();
        let mut seen = HashSet::new();
        for record in records {
            if seen.insert(record.digest.clone()) {
                set.records.push(record);
            } else {
                set.skipped += 1;
            }
        }
        set.document_id = set.records.first().and_then(|r| r.document_id.clone());
        set
    }

    /// Parse the detection payload. Malformed input degrades to an empty set.
    pub fn from_payload_json(text: &str) -> Self {
        let payload: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "detection payload is not valid JSON; starting with no detections");
                return Self::default();
            }
        };
        let detections = match payload.get("detections") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };
        let document_id = payload.get("document_id").and_then(DocumentId::from_json);
        if document_id.is_none() && !detections.is_empty() {
            warn!(
                raw = ?payload.get("document_id"),
                "detection payload has no usable document_id; records carry no document reference"
            );
        }

        let mut set = Self {
            document_id: document_id.clone(),
            ..Self::default()
        };
        let mut seen = HashSet::new();
        for (index, item) in detections.iter().enumerate() {
            let raw = match RawDetection::deserialize(item) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(index, error = %err, "skipping detection without string type/hash");
                    set.skipped += 1;
                    continue;
                }
            };
            if !seen.insert(raw.hash.clone()) {
                debug!(index, digest = %raw.hash, "skipping duplicate digest");
                set.skipped += 1;
                continue;
            }
            let algorithm = raw
                .algorithm
                .as_deref()
                .map(HashAlgorithm::from_tag)
                .unwrap_or_default();
            set.records.push(PiiRecord::new(
                raw.pii_type,
                document_id.clone(),
                raw.hash,
                algorithm,
            ));
        }
        set
    }

    /// Document the payload described, if it was usable.
    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    /// Records were loaded but none of them has a document reference.
    pub fn missing_document(&self) -> bool {
        !self.records.is_empty() && self.document_id.is_none()
    }

    /// Look up a record by digest.
    pub fn get(&self, digest: &str) -> Option<&PiiRecord> {
        self.records.iter().find(|r| r.digest == digest)
    }

    /// Records in payload order.
    pub fn records(&self) -> &[PiiRecord] {
        &self.records
    }

    /// Number of loaded records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Detections dropped while loading (unusable or duplicate).
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Ordered, non-empty batch of records submitted in one transaction.
///
/// Order is selection order and is preserved end-to-end: it is the order of
/// the on-chain `bytes32[]` argument and of the off-chain log entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintBatch {
    records: Vec<PiiRecord>,
}

impl FingerprintBatch {
    /// Wrap records into a batch. Fails with [`AnchorError::EmptySelection`] when empty.
    pub fn new(records: Vec<PiiRecord>) -> Result<Self, AnchorError> {
        if records.is_empty() {
            return Err(AnchorError::EmptySelection);
        }
        Ok(Self { records })
    }

    /// Records in submission order.
    pub fn records(&self) -> &[PiiRecord] {
        &self.records
    }

    /// Number of records (always at least one).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_document_id_and_ignores_matched_text() {
        let set = FingerprintSet::from_payload_json(
            r#"{"document_id": 7, "detections": [
                {"type": "EMAIL", "hash": "ab12", "match": "a@b.co"},
                {"type": "SSN", "hash": "00ff00ff"}
            ]}"#,
        );
        assert_eq!(set.document_id(), Some(&DocumentId::Numeric(7)));
        assert_eq!(set.records()[1].document_id(), Some(&DocumentId::Numeric(7)));
        assert!(!set.missing_document());
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].pii_type(), "EMAIL");
        assert_eq!(set.records()[1].digest(), "00ff00ff");
        assert_eq!(set.records()[0].algorithm(), &HashAlgorithm::Sha256);
        assert_eq!(set.skipped(), 0);
    }

    #[test]
    fn malformed_json_degrades_to_empty_set() {
        let set = FingerprintSet::from_payload_json("{\"document_id\": 1, \"detections\": [");
        assert!(set.is_empty());
        assert_eq!(set.document_id(), None);
    }

    #[test]
    fn non_array_detections_yield_no_records() {
        let set = FingerprintSet::from_payload_json(r#"{"document_id": "doc-9", "detections": {}}"#);
        assert!(set.is_empty());
        assert_eq!(set.document_id(), Some(&DocumentId::Text("doc-9".into())));
    }

    #[test]
    fn unusable_and_duplicate_detections_are_counted() {
        let set = FingerprintSet::from_payload_json(
            r#"{"document_id": 3, "detections": [
                {"type": "EMAIL", "hash": "ab12"},
                {"type": "EMAIL"},
                {"type": "PHONE", "hash": 12},
                {"type": "NAME", "hash": "ab12"},
                {"type": "PAN", "hash": "cd34", "algorithm": "blake3"}
            ]}"#,
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.skipped(), 3);
        assert_eq!(set.get("ab12").map(PiiRecord::pii_type), Some("EMAIL"));
        assert_eq!(
            set.get("cd34").map(PiiRecord::algorithm),
            Some(&HashAlgorithm::Other("blake3".into()))
        );
    }

    #[test]
    fn missing_document_id_keeps_detections_without_reference() {
        let set = FingerprintSet::from_payload_json(r#"{"detections": [{"type": "EMAIL", "hash": "ab12"}]}"#);
        assert_eq!(set.len(), 1);
        assert_eq!(set.skipped(), 0);
        assert_eq!(set.document_id(), None);
        assert_eq!(set.records()[0].document_id(), None);
        assert!(set.missing_document());
    }

    #[test]
    fn unusable_document_ids_keep_detections() {
        for id in ["-3", "1.5", "null", "\"  \"", "[1]"] {
            let set = FingerprintSet::from_payload_json(&format!(
                r#"{{"document_id": {id}, "detections": [{{"type": "SSN", "hash": "00ff00ff"}}]}}"#
            ));
            assert_eq!(set.len(), 1, "document_id {id}");
            assert!(set.missing_document(), "document_id {id}");
        }
        let ok = FingerprintSet::from_payload_json(r#"{"document_id": 4, "detections": []}"#);
        assert!(!ok.missing_document());
    }

    #[test]
    fn document_id_serializes_in_wire_form() {
        assert_eq!(serde_json::to_string(&DocumentId::Numeric(5)).ok().as_deref(), Some("5"));
        assert_eq!(
            serde_json::to_string(&DocumentId::Text("d".into())).ok().as_deref(),
            Some("\"d\"")
        );
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert_eq!(FingerprintBatch::new(Vec::new()), Err(AnchorError::EmptySelection));
    }
}
