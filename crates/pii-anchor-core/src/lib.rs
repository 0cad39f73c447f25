// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core services for anchoring PII fingerprints on an append-only ledger.
//!
//! The flow is linear and explicit:
//!
//! 1. [`FingerprintSet`] is loaded once from the detection payload.
//! 2. [`LedgerSubmitter::connect`] binds a signing account (the only writer of
//!    [`ConnectionState`]).
//! 3. [`SelectionResolver`] turns selected digests into an ordered
//!    [`FingerprintBatch`].
//! 4. [`LedgerSubmitter::submit`] normalizes every digest ([`normalize`]),
//!    sends one `storeMultiplePii(bytes32[])` transaction and waits for
//!    finalization.
//! 5. [`RecordSynchronizer::sync`] mirrors the committed batch to the
//!    off-chain record store. It needs a [`SubmissionResult`], which only a
//!    finalized submission can produce.
//! 6. [`StatusReporter`] renders every transition for the operator.
//!
//! Network collaborators sit behind [`LedgerPort`] and [`RecordStorePort`];
//! this crate performs no I/O of its own. [`AnchorSession`] wires the pieces
//! together for front-ends.

pub mod config;
pub mod digest;
pub mod error;
pub mod ledger;
pub mod record;
pub mod selection;
pub mod session;
pub mod status;
pub mod submitter;
pub mod sync;

pub use config::{AnchorConfig, ConfigError, ConfigService, ConfigStore, ANCHOR_CONFIG_KEY};
pub use digest::{normalize, normalize_batch, NormalizedDigest, DIGEST_BYTES};
pub use error::{AnchorError, DigestFault, ErrorStage};
pub use ledger::{Address, AddressError, BatchTransaction, LedgerError, LedgerPort, TxHash, TxReceipt};
pub use record::{DocumentId, FingerprintBatch, FingerprintSet, HashAlgorithm, PiiRecord};
pub use selection::SelectionResolver;
pub use session::{AnchorOutcome, AnchorSession};
pub use status::{render, StatusEvent, StatusKind, StatusLine, StatusReporter};
pub use submitter::{
    ConnectionState, LedgerSubmitter, SubmissionPhase, SubmissionResult, SubmitterOptions,
};
pub use sync::{RecordStorePort, RecordSynchronizer, StoreError, SyncAck, SyncEntry};
