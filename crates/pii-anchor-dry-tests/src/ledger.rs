// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scriptable in-memory ledger.
//!
//! [`FakeLedger`] records every account request and transaction, derives
//! transaction hashes deterministically from a nonce, and can be told to
//! fail at each step or to hold finalization until the test releases it.
//! Clones share state.

use std::sync::{Arc, Mutex, MutexGuard};

use pii_anchor_core::{Address, BatchTransaction, LedgerError, LedgerPort, TxHash, TxReceipt};
use tokio::sync::Notify;

use crate::fixtures::account;

#[derive(Default)]
struct Inner {
    account: Option<Address>,
    account_error: Option<LedgerError>,
    send_error: Option<LedgerError>,
    finalization_error: Option<LedgerError>,
    revert: bool,
    hold: bool,
    never_finalize: bool,
    account_requests: usize,
    sent: Vec<BatchTransaction>,
    waits: usize,
}

/// In-memory [`LedgerPort`] with failure injection.
#[derive(Clone)]
pub struct FakeLedger {
    inner: Arc<Mutex<Inner>>,
    release: Arc<Notify>,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLedger {
    /// Ledger whose signer hands out [`account()`](crate::account).
    pub fn new() -> Self {
        Self::with_account(account())
    }

    /// Ledger whose signer hands out `account`.
    pub fn with_account(account: Address) -> Self {
        let ledger = Self {
            inner: Arc::default(),
            release: Arc::new(Notify::new()),
        };
        ledger.lock().account = Some(account);
        ledger
    }

    /// Ledger with no signing capability at all.
    pub fn unavailable() -> Self {
        let ledger = Self::new();
        ledger.lock().account = None;
        ledger
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `request_account` fail with `err`.
    pub fn fail_account_request(&self, err: Option<LedgerError>) {
        self.lock().account_error = err;
    }

    /// Make `send_batch` fail with `err`.
    pub fn fail_send(&self, err: Option<LedgerError>) {
        self.lock().send_error = err;
    }

    /// Make `wait_for_finalization` fail with `err`.
    pub fn fail_finalization(&self, err: Option<LedgerError>) {
        self.lock().finalization_error = err;
    }

    /// Finalize transactions as reverted.
    pub fn set_revert(&self, revert: bool) {
        self.lock().revert = revert;
    }

    /// Hold each finalization until [`release_one`](Self::release_one) is called.
    pub fn hold_finalization(&self, hold: bool) {
        self.lock().hold = hold;
    }

    /// Let one held finalization through (or the next one, if none is waiting yet).
    pub fn release_one(&self) {
        self.release.notify_one();
    }

    /// Never finalize; for timeout and cancellation tests.
    pub fn never_finalize(&self, never: bool) {
        self.lock().never_finalize = never;
    }

    /// Number of account requests received.
    pub fn account_requests(&self) -> usize {
        self.lock().account_requests
    }

    /// Transactions sent so far, in order.
    pub fn sent(&self) -> Vec<BatchTransaction> {
        self.lock().sent.clone()
    }

    /// Number of finalization waits started.
    pub fn waits(&self) -> usize {
        self.lock().waits
    }

    /// Hash the fake assigns to its `nonce`-th transaction (zero-based).
    pub fn tx_hash_for(nonce: usize) -> TxHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"fake-ledger-tx:");
        hasher.update(&(nonce as u64).to_le_bytes());
        TxHash(hasher.finalize().into())
    }
}

impl LedgerPort for FakeLedger {
    async fn request_account(&self) -> Result<Address, LedgerError> {
        let mut inner = self.lock();
        inner.account_requests += 1;
        if let Some(err) = inner.account_error.clone() {
            return Err(err);
        }
        inner
            .account
            .ok_or_else(|| LedgerError::SigningUnavailable("no signer installed".into()))
    }

    async fn send_batch(&self, tx: &BatchTransaction) -> Result<TxHash, LedgerError> {
        let mut inner = self.lock();
        if let Some(err) = inner.send_error.clone() {
            return Err(err);
        }
        let tx_hash = Self::tx_hash_for(inner.sent.len());
        inner.sent.push(tx.clone());
        Ok(tx_hash)
    }

    async fn wait_for_finalization(&self, tx_hash: TxHash) -> Result<TxReceipt, LedgerError> {
        let (hold, never) = {
            let mut inner = self.lock();
            inner.waits += 1;
            (inner.hold, inner.never_finalize)
        };
        if never {
            std::future::pending::<()>().await;
        }
        if hold {
            self.release.notified().await;
        }
        let inner = self.lock();
        if let Some(err) = inner.finalization_error.clone() {
            return Err(err);
        }
        Ok(TxReceipt {
            tx_hash,
            block_number: Some(inner.sent.len() as u64),
            succeeded: !inner.revert,
        })
    }
}
