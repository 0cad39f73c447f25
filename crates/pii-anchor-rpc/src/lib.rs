// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Network adapters for the anchoring ports.
//!
//! - [`JsonRpcLedger`] implements [`LedgerPort`](pii_anchor_core::LedgerPort)
//!   against an Ethereum-style JSON-RPC node that holds the signing account
//!   (`eth_requestAccounts`, `eth_sendTransaction`, `eth_getTransactionReceipt`).
//! - [`HttpRecordStore`] implements
//!   [`RecordStorePort`](pii_anchor_core::RecordStorePort) for a web backend
//!   protected by a cookie-based anti-forgery token.
#![forbid(unsafe_code)]

pub mod abi;
pub mod csrf;
pub mod jsonrpc;
pub mod ledger;
pub mod store;

pub use abi::{encode_store_multiple_pii, selector, STORE_MULTIPLE_PII};
pub use jsonrpc::{JsonRpcClient, RpcError};
pub use ledger::JsonRpcLedger;
pub use store::{HttpRecordStore, StoreSettings};
