// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mirror of a finalized batch into the off-chain record store.
//!
//! The on-chain write is authoritative and already irreversible by the time
//! this runs, so a failure here is reported as [`AnchorError::SyncFailure`]
//! and nothing is rolled back. [`RecordSynchronizer::sync`] takes a
//! [`SubmissionResult`], which only exists after finalization; mirroring
//! before or alongside the chain write is not expressible.

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::AnchorError;
use crate::record::DocumentId;
use crate::submitter::SubmissionResult;

/// One off-chain log entry, in the wire shape the record store accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntry {
    /// Detector label.
    #[serde(rename = "type")]
    pub pii_type: String,
    /// Source document reference; `null` on the wire when the payload had none.
    pub document_id: Option<DocumentId>,
    /// Digest exactly as originally supplied (not normalized).
    #[serde(rename = "hash")]
    pub digest: String,
    /// ISO-8601 UTC timestamp, shared by every entry of a batch.
    pub timestamp: String,
}

/// Acknowledgement from the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAck {
    /// HTTP status (or equivalent) returned by the store.
    pub status: u16,
    /// Response body, when non-empty.
    pub body: Option<String>,
}

/// Errors reported by a record store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("record store answered {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// No anti-forgery token could be obtained; nothing was sent.
    #[error("no {0} cookie available for the record store")]
    MissingCsrfToken(String),
    /// Transport-level failure.
    #[error("transport: {0}")]
    Transport(String),
}

/// Narrow recording interface of the off-chain store: one call per batch.
pub trait RecordStorePort: Send + Sync {
    /// Record `entries` in order.
    fn record_batch(
        &self,
        entries: &[SyncEntry],
    ) -> impl Future<Output = Result<SyncAck, StoreError>> + Send;
}

/// Build the log entries for `result`, all stamped with `timestamp`.
pub fn entries_for(result: &SubmissionResult, timestamp: DateTime<Utc>) -> Vec<SyncEntry> {
    let stamp = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    result
        .records()
        .iter()
        .map(|r| SyncEntry {
            pii_type: r.pii_type().to_string(),
            document_id: r.document_id().cloned(),
            digest: r.digest().to_string(),
            timestamp: stamp.clone(),
        })
        .collect()
}

/// Reports committed batches to a [`RecordStorePort`].
pub struct RecordSynchronizer<S> {
    store: S,
}

impl<S> RecordSynchronizer<S> {
    /// Synchronizer over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store adapter.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RecordStorePort> RecordSynchronizer<S> {
    /// Send one request covering every committed record of `result`.
    pub async fn sync(&self, result: &SubmissionResult) -> Result<SyncAck, AnchorError> {
        let entries = entries_for(result, Utc::now());
        info!(tx = %result.tx_hash(), count = entries.len(), "mirroring batch to record store");
        match self.store.record_batch(&entries).await {
            Ok(ack) => {
                info!(tx = %result.tx_hash(), status = ack.status, "record store acknowledged");
                Ok(ack)
            }
            Err(err) => {
                warn!(
                    tx = %result.tx_hash(),
                    error = %err,
                    "record store sync failed; on-chain commit stands, reconcile manually"
                );
                Err(AnchorError::SyncFailure(format!(
                    "{err} (transaction {} is committed on-chain)",
                    result.tx_hash()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TxHash;
    use crate::record::{HashAlgorithm, PiiRecord};
    use chrono::TimeZone;

    fn result() -> SubmissionResult {
        SubmissionResult::for_tests(
            TxHash([7; 32]),
            vec![
                PiiRecord::new("EMAIL", DocumentId::Numeric(4), "ab12", HashAlgorithm::Sha256),
                PiiRecord::new("SSN", DocumentId::Numeric(4), "00ff00ff", HashAlgorithm::Sha256),
            ],
        )
    }

    #[test]
    fn entries_share_one_iso_timestamp_and_keep_order() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).single();
        let entries = ts.map(|ts| entries_for(&result(), ts)).unwrap_or_default();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pii_type, "EMAIL");
        assert_eq!(entries[1].digest, "00ff00ff");
        assert!(entries.iter().all(|e| e.timestamp == "2026-03-01T12:30:05.000Z"));
    }

    #[test]
    fn entries_serialize_in_store_wire_shape() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single();
        let entries = ts.map(|ts| entries_for(&result(), ts)).unwrap_or_default();
        let json = serde_json::to_value(&entries).unwrap_or_default();
        assert_eq!(
            json[0],
            serde_json::json!({
                "type": "EMAIL",
                "document_id": 4,
                "hash": "ab12",
                "timestamp": "2026-03-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn absent_document_reference_is_sent_as_null() {
        let unreferenced = SubmissionResult::for_tests(
            TxHash([1; 32]),
            vec![PiiRecord::new("EMAIL", None, "ab12", HashAlgorithm::Sha256)],
        );
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single();
        let entries = ts.map(|ts| entries_for(&unreferenced, ts)).unwrap_or_default();
        let json = serde_json::to_value(&entries).unwrap_or_default();
        assert_eq!(json[0]["document_id"], serde_json::Value::Null);
        assert_eq!(json[0]["hash"], "ab12");
    }
}
