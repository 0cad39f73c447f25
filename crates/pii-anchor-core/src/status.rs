// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Human-readable status lines for the anchoring workflow.
//!
//! [`render`] is a pure mapping from [`StatusEvent`] to [`StatusLine`]; error
//! text is passed through verbatim. [`StatusReporter`] keeps a bounded
//! history of rendered lines, folding consecutive duplicate progress and
//! info lines. Repeated errors and successes are each kept.

use std::collections::VecDeque;

use crate::error::{AnchorError, ErrorStage};
use crate::ledger::Address;
use crate::submitter::SubmissionResult;

/// Severity/tone of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Neutral information.
    Info,
    /// Work underway.
    Progress,
    /// A step completed.
    Success,
    /// A step failed.
    Error,
}

/// Something the operator should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Detection payload loaded.
    Loaded {
        /// Usable records.
        records: usize,
        /// Detections dropped while loading.
        skipped: usize,
        /// Records were kept without a usable document reference.
        missing_document: bool,
    },
    /// Account request outstanding.
    Connecting,
    /// Signing account bound.
    Connected(Address),
    /// Batch transaction being sent.
    Submitting {
        /// Records in the batch.
        count: usize,
    },
    /// Batch finalized on-chain.
    Confirmed(SubmissionResult),
    /// Off-chain mirror acknowledged the batch.
    Synced {
        /// Records mirrored.
        count: usize,
    },
    /// Any workflow error, including off-chain sync failures.
    Failed(AnchorError),
}

/// A rendered status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Tone.
    pub kind: StatusKind,
    /// One-line summary.
    pub title: String,
    /// Optional detail lines.
    pub body: Option<String>,
}

impl StatusLine {
    fn new(kind: StatusKind, title: impl Into<String>, body: Option<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body,
        }
    }
}

/// Map an event to its user-facing text.
pub fn render(event: &StatusEvent) -> StatusLine {
    match event {
        StatusEvent::Loaded {
            records: 0,
            skipped,
            ..
        } => StatusLine::new(
            StatusKind::Info,
            "No detections to anchor.",
            (*skipped > 0).then(|| format!("{skipped} unusable detection(s) skipped.")),
        ),
        StatusEvent::Loaded {
            records,
            skipped,
            missing_document,
        } => {
            let mut notes = Vec::new();
            if *skipped > 0 {
                notes.push(format!("{skipped} unusable detection(s) skipped."));
            }
            if *missing_document {
                notes.push(
                    "Payload has no usable document_id; records will be logged without one."
                        .to_string(),
                );
            }
            StatusLine::new(
                StatusKind::Info,
                format!("{records} detection(s) loaded."),
                (!notes.is_empty()).then(|| notes.join("\n")),
            )
        }
        StatusEvent::Connecting => {
            StatusLine::new(StatusKind::Progress, "Requesting signing account...", None)
        }
        StatusEvent::Connected(account) => {
            StatusLine::new(StatusKind::Success, format!("Connected: {account}"), None)
        }
        StatusEvent::Submitting { count } => StatusLine::new(
            StatusKind::Progress,
            format!("Sending a single transaction for {count} selected record(s)..."),
            None,
        ),
        StatusEvent::Confirmed(result) => {
            let mut body = String::from("Stored hashes:\n");
            for digest in result.digests() {
                body.push_str("  ");
                body.push_str(&digest.to_hex());
                body.push('\n');
            }
            body.push_str(&format!("Transaction hash: {}", result.tx_hash()));
            StatusLine::new(
                StatusKind::Success,
                "Selected PII stored successfully in one transaction.",
                Some(body),
            )
        }
        StatusEvent::Synced { count } => StatusLine::new(
            StatusKind::Success,
            format!("Off-chain record store updated with {count} record(s)."),
            None,
        ),
        StatusEvent::Failed(err) => {
            let title = match err.stage() {
                ErrorStage::Local => "Nothing was sent.",
                ErrorStage::Connection => "Connection failed.",
                ErrorStage::Chain => "Transaction failed.",
                ErrorStage::Sync => "Off-chain sync failed; the on-chain commit stands.",
            };
            StatusLine::new(StatusKind::Error, title, Some(err.to_string()))
        }
    }
}

/// Bounded history of rendered status lines.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    history: VecDeque<StatusLine>,
    max: usize,
}

impl StatusReporter {
    /// Reporter keeping at most `max` lines (at least one).
    pub fn new(max: usize) -> Self {
        Self {
            history: VecDeque::new(),
            max: max.max(1),
        }
    }

    /// Render and record `event`, returning the rendered line.
    pub fn report(&mut self, event: &StatusEvent) -> StatusLine {
        let line = render(event);
        let foldable = matches!(line.kind, StatusKind::Info | StatusKind::Progress);
        if !(foldable && self.history.back() == Some(&line)) {
            if self.history.len() == self.max {
                self.history.pop_front();
            }
            self.history.push_back(line.clone());
        }
        line
    }

    /// Most recent line.
    pub fn latest(&self) -> Option<&StatusLine> {
        self.history.back()
    }

    /// All retained lines, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StatusLine> {
        self.history.iter()
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(32)
    }
}
