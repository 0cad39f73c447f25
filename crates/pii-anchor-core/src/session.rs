// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One operator session: loaded fingerprints, a submitter, a synchronizer and
//! the status history they feed.
//!
//! Ordering is fixed: resolve → submit (await finalization) → sync. Sync is
//! attempted only after a [`SubmissionResult`] exists, and its failure is
//! returned alongside the result rather than replacing it.

use std::sync::{Mutex, PoisonError};

use crate::digest::normalize_batch;
use crate::error::AnchorError;
use crate::ledger::{Address, LedgerPort};
use crate::record::{FingerprintBatch, FingerprintSet};
use crate::selection::SelectionResolver;
use crate::status::{StatusEvent, StatusLine, StatusReporter};
use crate::submitter::{ConnectionState, LedgerSubmitter, SubmissionResult};
use crate::sync::{RecordStorePort, RecordSynchronizer, SyncAck};

/// Result of an anchoring request that reached the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorOutcome {
    /// The finalized on-chain commitment.
    pub result: SubmissionResult,
    /// Off-chain mirror outcome; an error here never undoes `result`.
    pub sync: Result<SyncAck, AnchorError>,
}

/// Session-scoped wiring of the anchoring components.
pub struct AnchorSession<L, S> {
    fingerprints: FingerprintSet,
    submitter: LedgerSubmitter<L>,
    synchronizer: RecordSynchronizer<S>,
    reporter: Mutex<StatusReporter>,
}

impl<L, S> AnchorSession<L, S> {
    /// Start a session; reports what was loaded.
    pub fn new(
        fingerprints: FingerprintSet,
        submitter: LedgerSubmitter<L>,
        synchronizer: RecordSynchronizer<S>,
        mut reporter: StatusReporter,
    ) -> Self {
        reporter.report(&StatusEvent::Loaded {
            records: fingerprints.len(),
            skipped: fingerprints.skipped(),
            missing_document: fingerprints.missing_document(),
        });
        Self {
            fingerprints,
            submitter,
            synchronizer,
            reporter: Mutex::new(reporter),
        }
    }

    /// Records loaded for this session.
    pub fn fingerprints(&self) -> &FingerprintSet {
        &self.fingerprints
    }

    /// The session's submitter (connection state lives here).
    pub fn submitter(&self) -> &LedgerSubmitter<L> {
        &self.submitter
    }

    /// The session's synchronizer.
    pub fn synchronizer(&self) -> &RecordSynchronizer<S> {
        &self.synchronizer
    }

    /// Snapshot of the status history, oldest first.
    pub fn status_history(&self) -> Vec<StatusLine> {
        self.reporter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history()
            .cloned()
            .collect()
    }

    fn report(&self, event: &StatusEvent) -> StatusLine {
        self.reporter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .report(event)
    }

    fn fail<T>(&self, err: AnchorError) -> Result<T, AnchorError> {
        self.report(&StatusEvent::Failed(err.clone()));
        Err(err)
    }
}

impl<L: LedgerPort, S: RecordStorePort> AnchorSession<L, S> {
    /// Connect the signing account.
    pub async fn connect(&self) -> Result<Address, AnchorError> {
        self.report(&StatusEvent::Connecting);
        match self.submitter.connect().await {
            Ok(account) => {
                self.report(&StatusEvent::Connected(account));
                Ok(account)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Anchor the selected digests and mirror them off-chain.
    ///
    /// Errors before finalization are returned as `Err`. Once the chain has
    /// committed, the call returns `Ok` and a sync failure is carried in
    /// [`AnchorOutcome::sync`].
    pub async fn anchor<I, T>(&self, selection: I) -> Result<AnchorOutcome, AnchorError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let resolved = SelectionResolver::new(&self.fingerprints).resolve(selection);
        self.anchor_resolved(resolved).await
    }

    /// Anchor every loaded record, in payload order. Same contract as
    /// [`anchor`](Self::anchor).
    pub async fn anchor_all(&self) -> Result<AnchorOutcome, AnchorError> {
        let resolved = SelectionResolver::new(&self.fingerprints).resolve_all();
        self.anchor_resolved(resolved).await
    }

    async fn anchor_resolved(
        &self,
        resolved: Result<FingerprintBatch, AnchorError>,
    ) -> Result<AnchorOutcome, AnchorError> {
        let batch = match resolved {
            Ok(batch) => batch,
            Err(err) => return self.fail(err),
        };
        if !matches!(self.submitter.connection(), ConnectionState::Connected(_)) {
            return self.fail(AnchorError::NotConnected);
        }
        if let Err(err) = normalize_batch(&batch) {
            return self.fail(err);
        }
        self.report(&StatusEvent::Submitting { count: batch.len() });
        let result = match self.submitter.submit(&batch).await {
            Ok(result) => result,
            Err(err) => return self.fail(err),
        };
        self.report(&StatusEvent::Confirmed(result.clone()));

        let sync = self.synchronizer.sync(&result).await;
        match &sync {
            Ok(_) => {
                self.report(&StatusEvent::Synced {
                    count: result.records().len(),
                });
            }
            Err(err) => {
                self.report(&StatusEvent::Failed(err.clone()));
            }
        }
        Ok(AnchorOutcome { result, sync })
    }
}
