// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `ConfigService` behavior over the in-memory store.

use std::time::Duration;

use pii_anchor_core::{AnchorConfig, ConfigError, ConfigService, ANCHOR_CONFIG_KEY};
use pii_anchor_dry_tests::InMemoryConfigStore;

#[test]
fn empty_blob_is_treated_as_missing() {
    let store = InMemoryConfigStore::with_raw(ANCHOR_CONFIG_KEY, b"");
    let config = ConfigService::new(store.clone()).load_anchor().unwrap();
    assert_eq!(config, AnchorConfig::default());
    assert_eq!(store.load_count(), 1);
}

#[test]
fn stored_values_drive_submitter_and_poll_options() {
    let store = InMemoryConfigStore::with_raw(
        ANCHOR_CONFIG_KEY,
        br#"{"confirmation_timeout_secs": 30, "receipt_poll_interval_ms": 250}"#,
    );
    let config = ConfigService::new(store).load_anchor().unwrap();
    assert_eq!(
        config.submitter_options().confirmation_timeout,
        Duration::from_secs(30)
    );
    assert_eq!(config.receipt_poll_interval(), Duration::from_millis(250));
}

#[test]
fn storage_failures_propagate() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_load(true);
    store.set_fail_on_save(true);
    let service = ConfigService::new(store);
    assert!(matches!(service.load_anchor(), Err(ConfigError::Other(_))));
    assert!(service.save(ANCHOR_CONFIG_KEY, &AnchorConfig::default()).is_err());
}
