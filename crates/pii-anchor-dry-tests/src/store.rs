// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording off-chain store fake.

use std::sync::{Arc, Mutex, MutexGuard};

use pii_anchor_core::{RecordStorePort, StoreError, SyncAck, SyncEntry};

#[derive(Default)]
struct Inner {
    calls: Vec<Vec<SyncEntry>>,
    failure: Option<StoreError>,
}

/// [`RecordStorePort`] that keeps every request it receives. Clones share state.
#[derive(Clone, Default)]
pub struct FakeRecordStore {
    inner: Arc<Mutex<Inner>>,
}

impl FakeRecordStore {
    /// Store that acknowledges everything with `200`.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer subsequent calls with `failure` instead of an ack.
    pub fn fail_with(&self, failure: Option<StoreError>) {
        self.lock().failure = failure;
    }

    /// Every request received, oldest first.
    pub fn calls(&self) -> Vec<Vec<SyncEntry>> {
        self.lock().calls.clone()
    }
}

impl RecordStorePort for FakeRecordStore {
    async fn record_batch(&self, entries: &[SyncEntry]) -> Result<SyncAck, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(entries.to_vec());
        match inner.failure.clone() {
            Some(err) => Err(err),
            None => Ok(SyncAck {
                status: 200,
                body: Some(r#"{"status": "success"}"#.to_string()),
            }),
        }
    }
}
