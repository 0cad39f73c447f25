// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connection and submission state machine on top of a [`LedgerPort`].
//!
//! ```text
//! Disconnected → Connecting → Connected
//!                                 └─ submit: Submitting → Confirmed | Failed
//! ```
//!
//! # Invariants
//!
//! - [`ConnectionState`] is written only by [`LedgerSubmitter::connect`].
//!   There is no implicit reconnection; a failed submit leaves it intact.
//! - At most one submission is outstanding. A second `submit` while one is
//!   in flight fails with [`AnchorError::SubmissionInProgress`] and does not
//!   disturb the first.
//! - Normalization happens before anything is sent. One bad digest aborts the
//!   whole batch with no chain interaction.
//! - Exactly one transaction is sent per successful `submit`; nothing is ever
//!   retried here.
//! - Dropping an in-flight `submit` future only stops waiting. A sent
//!   transaction may still land on-chain; the phase records the abandon.
//!
//! Locks are never held across an await point.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::digest::{normalize_batch, NormalizedDigest};
use crate::error::AnchorError;
use crate::ledger::{Address, BatchTransaction, LedgerError, LedgerPort, TxHash};
use crate::record::{FingerprintBatch, PiiRecord};

/// Session connection to the signing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No account bound.
    Disconnected,
    /// Account request outstanding.
    Connecting,
    /// Bound to the given account.
    Connected(Address),
}

/// Phase of the most recent submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// Nothing submitted yet this session.
    Idle,
    /// A transaction is being sent or awaiting finalization.
    Submitting,
    /// The last transaction was finalized successfully.
    Confirmed(TxHash),
    /// The last attempt failed or was abandoned; carries the reason.
    Failed(String),
}

/// A finalized on-chain commitment. Only [`LedgerSubmitter::submit`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    tx_hash: TxHash,
    block_number: Option<u64>,
    records: Vec<PiiRecord>,
    digests: Vec<NormalizedDigest>,
    confirmed_at: DateTime<Utc>,
}

impl SubmissionResult {
    /// Transaction reference.
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Block that included the transaction, when the ledger reported it.
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    /// Committed records, in submission order.
    pub fn records(&self) -> &[PiiRecord] {
        &self.records
    }

    /// Normalized digests as sent on-chain, parallel to [`records`](Self::records).
    pub fn digests(&self) -> &[NormalizedDigest] {
        &self.digests
    }

    /// Local time at which finalization was observed.
    pub fn confirmed_at(&self) -> DateTime<Utc> {
        self.confirmed_at
    }

    #[cfg(test)]
    pub(crate) fn for_tests(tx_hash: TxHash, records: Vec<PiiRecord>) -> Self {
        let digests = records
            .iter()
            .filter_map(|r| crate::digest::normalize(r.digest()).ok())
            .collect();
        Self {
            tx_hash,
            block_number: None,
            records,
            digests,
            confirmed_at: Utc::now(),
        }
    }
}

/// Tunables for [`LedgerSubmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitterOptions {
    /// How long `submit` waits for finalization before reporting a rejection.
    pub confirmation_timeout: Duration,
}

impl Default for SubmitterOptions {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug)]
struct State {
    connection: ConnectionState,
    contract: Option<Address>,
    phase: SubmissionPhase,
    in_flight: bool,
}

/// Owns the ledger connection and submits batches through it.
pub struct LedgerSubmitter<L> {
    port: L,
    contract_address: String,
    options: SubmitterOptions,
    state: Mutex<State>,
    connect_gate: tokio::sync::Mutex<()>,
}

impl<L> LedgerSubmitter<L> {
    /// Create a disconnected submitter. `contract_address` is validated on connect.
    pub fn new(port: L, contract_address: impl Into<String>, options: SubmitterOptions) -> Self {
        Self {
            port,
            contract_address: contract_address.into(),
            options,
            state: Mutex::new(State {
                connection: ConnectionState::Disconnected,
                contract: None,
                phase: SubmissionPhase::Idle,
                in_flight: false,
            }),
            connect_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Current connection state.
    pub fn connection(&self) -> ConnectionState {
        self.state().connection
    }

    /// Phase of the most recent submission.
    pub fn phase(&self) -> SubmissionPhase {
        self.state().phase.clone()
    }

    /// The underlying ledger adapter.
    pub fn port(&self) -> &L {
        &self.port
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_flight(&self) -> Result<InFlight<'_>, AnchorError> {
        let mut st = self.state();
        if st.in_flight {
            return Err(AnchorError::SubmissionInProgress);
        }
        st.in_flight = true;
        st.phase = SubmissionPhase::Submitting;
        Ok(InFlight {
            state: &self.state,
            sent: None,
            finished: false,
        })
    }
}

impl<L: LedgerPort> LedgerSubmitter<L> {
    /// Bind the signing account. Idempotent once connected.
    ///
    /// The contract address is validated first; an invalid one fails with
    /// [`AnchorError::InvalidContractAddress`] and the state stays
    /// `Disconnected`.
    pub async fn connect(&self) -> Result<Address, AnchorError> {
        let _gate = self.connect_gate.lock().await;
        if let ConnectionState::Connected(account) = self.connection() {
            return Ok(account);
        }
        let contract = Address::parse(&self.contract_address).map_err(|err| {
            AnchorError::InvalidContractAddress {
                value: self.contract_address.clone(),
                reason: err.to_string(),
            }
        })?;

        self.state().connection = ConnectionState::Connecting;
        let mut attempt = ConnectAttempt {
            state: &self.state,
            done: false,
        };
        info!(contract = %contract, "requesting signing account");
        let outcome = self.port.request_account().await;
        attempt.done = true;

        let mut st = self.state();
        match outcome {
            Ok(account) => {
                st.connection = ConnectionState::Connected(account);
                st.contract = Some(contract);
                info!(account = %account, "connected");
                Ok(account)
            }
            Err(err) => {
                st.connection = ConnectionState::Disconnected;
                warn!(error = %err, "connect failed");
                Err(match err {
                    LedgerError::SigningUnavailable(reason) => {
                        AnchorError::SigningUnavailable(reason)
                    }
                    other => AnchorError::ConnectionFailed(other.to_string()),
                })
            }
        }
    }

    /// Submit `batch` as one transaction and wait for finalization.
    ///
    /// The batch is borrowed, so a failed attempt leaves it untouched for the
    /// caller to resubmit.
    pub async fn submit(&self, batch: &FingerprintBatch) -> Result<SubmissionResult, AnchorError> {
        let (from, contract) = {
            let st = self.state();
            match (st.connection, st.contract) {
                (ConnectionState::Connected(account), Some(contract)) => (account, contract),
                _ => return Err(AnchorError::NotConnected),
            }
        };
        let hashes = normalize_batch(batch)?;
        let mut flight = self.begin_flight()?;

        let tx = BatchTransaction {
            from,
            contract,
            hashes,
        };
        info!(count = tx.hashes.len(), contract = %contract, "sending batch transaction");
        let tx_hash = match self.port.send_batch(&tx).await {
            Ok(tx_hash) => tx_hash,
            Err(err) => return Err(flight.fail(format!("transaction not sent: {err}"))),
        };
        flight.sent = Some(tx_hash);
        info!(tx = %tx_hash, "transaction sent; awaiting finalization");

        let wait = self.port.wait_for_finalization(tx_hash);
        let receipt = match tokio::time::timeout(self.options.confirmation_timeout, wait).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(err)) => {
                return Err(flight.fail(format!("transaction {tx_hash} not finalized: {err}")))
            }
            Err(_) => {
                return Err(flight.fail(format!(
                    "transaction {tx_hash} not finalized within {}s",
                    self.options.confirmation_timeout.as_secs()
                )))
            }
        };
        if !receipt.succeeded {
            return Err(flight.fail(format!("transaction {tx_hash} reverted")));
        }

        let result = SubmissionResult {
            tx_hash,
            block_number: receipt.block_number,
            records: batch.records().to_vec(),
            digests: tx.hashes,
            confirmed_at: Utc::now(),
        };
        flight.finish(SubmissionPhase::Confirmed(tx_hash));
        info!(tx = %tx_hash, block = ?receipt.block_number, count = result.records.len(), "batch finalized");
        Ok(result)
    }
}

/// Resets `Connecting` back to `Disconnected` if a connect future is dropped.
struct ConnectAttempt<'a> {
    state: &'a Mutex<State>,
    done: bool,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if st.connection == ConnectionState::Connecting {
            st.connection = ConnectionState::Disconnected;
        }
    }
}

/// In-progress guard for one submission; releases the slot however `submit` ends.
struct InFlight<'a> {
    state: &'a Mutex<State>,
    sent: Option<TxHash>,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(&mut self, phase: SubmissionPhase) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        st.phase = phase;
        st.in_flight = false;
        self.finished = true;
    }

    fn fail(&mut self, reason: String) -> AnchorError {
        warn!(reason = %reason, "submission failed");
        self.finish(SubmissionPhase::Failed(reason.clone()));
        AnchorError::SubmissionRejected(reason)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.sent {
            Some(tx_hash) => warn!(
                tx = %tx_hash,
                "stopped waiting for finalization; the transaction may still be committed"
            ),
            None => warn!("submission abandoned before the transaction was acknowledged"),
        }
        self.finish(SubmissionPhase::Failed("abandoned locally".to_string()));
    }
}
