// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end anchoring through `AnchorSession` with dry-run adapters.

use pii_anchor_core::{
    AnchorError, AnchorSession, FingerprintSet, LedgerSubmitter, RecordSynchronizer,
    StatusKind, StatusReporter, StoreError, SubmitterOptions,
};
use pii_anchor_dry_tests::{payload_json, scenario_set, FakeLedger, FakeRecordStore, CONTRACT_HEX};

type Session = AnchorSession<FakeLedger, FakeRecordStore>;

fn session(set: FingerprintSet) -> (Session, FakeLedger, FakeRecordStore) {
    let ledger = FakeLedger::new();
    let store = FakeRecordStore::new();
    let session = AnchorSession::new(
        set,
        LedgerSubmitter::new(ledger.clone(), CONTRACT_HEX, SubmitterOptions::default()),
        RecordSynchronizer::new(store.clone()),
        StatusReporter::default(),
    );
    (session, ledger, store)
}

fn titles(session: &Session) -> Vec<String> {
    session.status_history().into_iter().map(|l| l.title).collect()
}

#[tokio::test]
async fn selected_records_are_anchored_then_mirrored() {
    let (session, ledger, store) = session(scenario_set());
    session.connect().await.unwrap();

    let outcome = session.anchor(["ab12", "00ff00ff"]).await.unwrap();
    assert!(outcome.sync.is_ok());

    let sent = ledger.sent();
    assert_eq!(sent.len(), 1);
    let expected: Vec<String> = vec![
        format!("0x{}ab12", "0".repeat(60)),
        format!("0x{}00ff00ff", "0".repeat(56)),
    ];
    let actual: Vec<String> = sent[0].hashes.iter().map(|d| d.to_hex()).collect();
    assert_eq!(actual, expected);

    let calls = store.calls();
    assert_eq!(calls.len(), 1, "one sync request per batch");
    let entries = &calls[0];
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].pii_type, "EMAIL");
    assert_eq!(entries[0].digest, "ab12", "store receives the digest as supplied");
    assert_eq!(entries[1].pii_type, "SSN");
    assert_eq!(entries[0].timestamp, entries[1].timestamp);
    assert!(entries[0].timestamp.ends_with('Z'));

    let history = session.status_history();
    let confirmed = history
        .iter()
        .find(|l| l.title == "Selected PII stored successfully in one transaction.")
        .and_then(|l| l.body.clone())
        .unwrap_or_default();
    assert!(confirmed.contains(&expected[0]));
    assert!(confirmed.contains(&outcome.result.tx_hash().to_string()));
    assert_eq!(
        history.last().map(|l| l.title.as_str()),
        Some("Off-chain record store updated with 2 record(s).")
    );
}

#[tokio::test]
async fn selection_order_drives_submission_order() {
    let (session, ledger, _store) = session(scenario_set());
    session.connect().await.unwrap();

    let outcome = session.anchor(["00ff00ff", "ab12"]).await.unwrap();
    let types: Vec<&str> = outcome.result.records().iter().map(|r| r.pii_type()).collect();
    assert_eq!(types, vec!["SSN", "EMAIL"]);
    assert_eq!(ledger.sent()[0].hashes, outcome.result.digests());
}

#[tokio::test]
async fn anchor_all_sends_every_record_in_payload_order() {
    let (session, ledger, store) = session(scenario_set());
    session.connect().await.unwrap();

    let outcome = session.anchor_all().await.unwrap();
    assert!(outcome.sync.is_ok());
    let types: Vec<&str> = outcome.result.records().iter().map(|r| r.pii_type()).collect();
    assert_eq!(types, vec!["EMAIL", "SSN"]);
    assert_eq!(ledger.sent().len(), 1);
    assert_eq!(ledger.sent()[0].hashes, outcome.result.digests());
    assert_eq!(store.calls()[0].len(), 2);
}

#[tokio::test]
async fn anchor_all_on_empty_payload_is_an_empty_selection() {
    let (session, ledger, _store) = session(FingerprintSet::from_payload_json("{}"));
    session.connect().await.unwrap();
    assert_eq!(session.anchor_all().await.unwrap_err(), AnchorError::EmptySelection);
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn records_without_document_id_are_anchored_and_logged_with_null() {
    let set = FingerprintSet::from_payload_json(
        r#"{"document_id": -3, "detections": [{"type": "EMAIL", "hash": "ab12"}]}"#,
    );
    let (session, ledger, store) = session(set);
    let loaded = session.status_history()[0].clone();
    assert_eq!(loaded.title, "1 detection(s) loaded.");
    assert!(loaded.body.unwrap_or_default().contains("no usable document_id"));

    session.connect().await.unwrap();
    let outcome = session.anchor(["ab12"]).await.unwrap();
    assert!(outcome.sync.is_ok());
    assert_eq!(ledger.sent().len(), 1);
    assert_eq!(store.calls()[0][0].document_id, None);
}

#[tokio::test]
async fn empty_selection_sends_nothing() {
    let (session, ledger, store) = session(scenario_set());
    session.connect().await.unwrap();

    let err = session.anchor(Vec::<String>::new()).await.unwrap_err();
    assert_eq!(err, AnchorError::EmptySelection);
    assert!(ledger.sent().is_empty());
    assert!(store.calls().is_empty());
    assert_eq!(
        session.status_history().last().map(|l| l.kind),
        Some(StatusKind::Error)
    );
}

#[tokio::test]
async fn unknown_selection_lists_every_missing_id() {
    let (session, ledger, _store) = session(scenario_set());
    session.connect().await.unwrap();

    let err = session.anchor(["ab12", "dead", "beef"]).await.unwrap_err();
    assert_eq!(
        err,
        AnchorError::UnknownSelection {
            unknown: vec!["dead".into(), "beef".into()],
            requested: 3,
        }
    );
    assert!(ledger.sent().is_empty());
}

#[tokio::test]
async fn anchoring_before_connect_is_refused() {
    let (session, ledger, _store) = session(scenario_set());
    let err = session.anchor(["ab12"]).await.unwrap_err();
    assert_eq!(err, AnchorError::NotConnected);
    assert!(ledger.sent().is_empty());
    assert!(!titles(&session).iter().any(|t| t.starts_with("Sending")));
}

#[tokio::test]
async fn malformed_digest_aborts_whole_batch() {
    let too_long = "ab".repeat(33);
    let set = FingerprintSet::from_payload_json(&payload_json(&[
        ("EMAIL", "ab12"),
        ("SSN", too_long.as_str()),
    ]));
    let (session, ledger, store) = session(set);
    session.connect().await.unwrap();

    let err = session.anchor(["ab12", too_long.as_str()]).await.unwrap_err();
    assert!(matches!(err, AnchorError::MalformedDigest { .. }));
    assert!(ledger.sent().is_empty());
    assert!(store.calls().is_empty());
    assert!(!titles(&session).iter().any(|t| t.starts_with("Sending")));
}

#[tokio::test]
async fn sync_failure_keeps_the_on_chain_result() {
    let (session, ledger, store) = session(scenario_set());
    store.fail_with(Some(StoreError::Status {
        status: 403,
        body: "CSRF verification failed".into(),
    }));
    session.connect().await.unwrap();

    let outcome = session.anchor(["ab12"]).await.unwrap();
    assert_eq!(ledger.sent().len(), 1);
    assert_eq!(outcome.result.records().len(), 1);
    let err = outcome.sync.unwrap_err();
    assert!(matches!(err, AnchorError::SyncFailure(ref msg) if msg.contains("403")));

    let history = session.status_history();
    assert!(history
        .iter()
        .any(|l| l.title == "Selected PII stored successfully in one transaction."));
    let last = history.last().cloned();
    assert_eq!(last.as_ref().map(|l| l.kind), Some(StatusKind::Error));
    assert_eq!(
        last.map(|l| l.title),
        Some("Off-chain sync failed; the on-chain commit stands.".to_string())
    );
}

#[tokio::test]
async fn rejected_transaction_skips_sync() {
    let (session, ledger, store) = session(scenario_set());
    ledger.set_revert(true);
    session.connect().await.unwrap();

    let err = session.anchor(["ab12"]).await.unwrap_err();
    assert!(matches!(err, AnchorError::SubmissionRejected(_)));
    assert!(store.calls().is_empty());
    assert_eq!(
        titles(&session).last().map(String::as_str),
        Some("Transaction failed.")
    );
}

#[test]
fn malformed_payload_yields_empty_informational_session() {
    let (session, _ledger, _store) = session(FingerprintSet::from_payload_json("{not json"));
    assert!(session.fingerprints().is_empty());
    let history = session.status_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, StatusKind::Info);
    assert_eq!(history[0].title, "No detections to anchor.");
}
