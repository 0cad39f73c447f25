// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for the anchoring workflow.
//!
//! Every variant carries a stable bracketed code so log lines and status text
//! can be grepped without parsing prose. [`ErrorStage`] tells callers which
//! side of the chain boundary an error came from: an off-chain sync failure
//! never means the on-chain write failed.

use thiserror::Error;

/// Why a digest string could not be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DigestFault {
    /// Nothing left after stripping an optional `0x` prefix.
    #[error("digest is empty")]
    Empty,
    /// Odd number of hex characters.
    #[error("odd number of hex characters")]
    OddLength,
    /// A character outside `[0-9a-fA-F]`.
    #[error("non-hex character {character:?} at position {index}")]
    NotHex {
        /// The offending character.
        character: char,
        /// Position within the digest (after any `0x` prefix).
        index: usize,
    },
    /// Decodes to more than 32 bytes; truncation would change the fingerprint.
    #[error("decodes to {bytes} bytes, more than 32")]
    TooLong {
        /// Decoded length in bytes.
        bytes: usize,
    },
}

/// Where in the workflow an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    /// Selection or normalization; nothing left the process.
    Local,
    /// Configuration or signing-account connection.
    Connection,
    /// On-chain submission or finalization.
    Chain,
    /// Off-chain mirror after a successful on-chain commit.
    Sync,
}

/// Errors surfaced by the anchoring workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    /// No signing capability is reachable.
    #[error("[SIGNING_UNAVAILABLE] {0}")]
    SigningUnavailable(String),
    /// Signing capability answered but refused or failed the account request.
    #[error("[CONNECTION_FAILED] {0}")]
    ConnectionFailed(String),
    /// The configured ledger contract address is missing or malformed.
    #[error("[INVALID_CONTRACT_ADDRESS] {value:?}: {reason}")]
    InvalidContractAddress {
        /// The configured value, verbatim.
        value: String,
        /// What is wrong with it.
        reason: String,
    },
    /// `submit` called before a successful `connect`.
    #[error("[NOT_CONNECTED] connect a signing account first")]
    NotConnected,
    /// The selection named no records.
    #[error("[EMPTY_SELECTION] select at least one record to anchor")]
    EmptySelection,
    /// The selection named records that are not loaded.
    #[error(
        "[UNKNOWN_SELECTION] {count} of {requested} selected identifiers are not loaded: {list}",
        count = .unknown.len(),
        list = .unknown.join(", ")
    )]
    UnknownSelection {
        /// Identifiers with no matching record, in selection order.
        unknown: Vec<String>,
        /// Number of distinct identifiers requested.
        requested: usize,
    },
    /// A digest could not be converted to its 32-byte on-chain form.
    #[error("[MALFORMED_DIGEST] {digest:?}: {fault}")]
    MalformedDigest {
        /// The digest as supplied.
        digest: String,
        /// What is wrong with it.
        fault: DigestFault,
    },
    /// Another batch is still awaiting finalization.
    #[error("[SUBMISSION_IN_PROGRESS] a batch is already awaiting finalization")]
    SubmissionInProgress,
    /// The ledger rejected the transaction, it reverted, or finalization timed out.
    #[error("[SUBMISSION_REJECTED] {0}")]
    SubmissionRejected(String),
    /// The off-chain mirror did not acknowledge an already-committed batch.
    #[error("[SYNC_FAILURE] {0}")]
    SyncFailure(String),
}

impl AnchorError {
    /// Stage of the workflow that produced this error.
    pub fn stage(&self) -> ErrorStage {
        match self {
            Self::EmptySelection
            | Self::UnknownSelection { .. }
            | Self::MalformedDigest { .. } => ErrorStage::Local,
            Self::SigningUnavailable(_)
            | Self::ConnectionFailed(_)
            | Self::InvalidContractAddress { .. }
            | Self::NotConnected => ErrorStage::Connection,
            Self::SubmissionInProgress | Self::SubmissionRejected(_) => ErrorStage::Chain,
            Self::SyncFailure(_) => ErrorStage::Sync,
        }
    }
}
