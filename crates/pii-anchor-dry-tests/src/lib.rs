// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for pii-anchor crates.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fixtures`] - Detection payloads, records and addresses used across suites
//! - [`ledger`] - Scriptable [`LedgerPort`](pii_anchor_core::LedgerPort) fake
//! - [`store`] - Recording [`RecordStorePort`](pii_anchor_core::RecordStorePort) fake
#![forbid(unsafe_code)]

pub mod config;
pub mod fixtures;
pub mod ledger;
pub mod store;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use fixtures::{account, contract, payload_json, record, scenario_set, CONTRACT_HEX};
pub use ledger::FakeLedger;
pub use store::FakeRecordStore;
