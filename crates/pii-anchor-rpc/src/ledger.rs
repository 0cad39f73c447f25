// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`LedgerPort`] over a JSON-RPC node that manages the signing account.
//!
//! Finalization is observed by polling `eth_getTransactionReceipt`; the
//! overall wait is bounded by the submitter, not here.

use std::time::Duration;

use pii_anchor_core::{Address, BatchTransaction, LedgerError, LedgerPort, TxHash, TxReceipt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::abi::encode_store_multiple_pii;
use crate::jsonrpc::{JsonRpcClient, RpcError, METHOD_NOT_FOUND, USER_REJECTED};

/// JSON-RPC backed ledger adapter.
pub struct JsonRpcLedger {
    client: JsonRpcClient,
    poll_interval: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    block_number: Option<String>,
    status: Option<String>,
}

fn quantity(text: &str) -> Option<u64> {
    let digits = text.strip_prefix("0x")?;
    u64::from_str_radix(digits, 16).ok()
}

fn rejected_or_transport(err: RpcError) -> LedgerError {
    match err {
        RpcError::Server { code, message } => LedgerError::Rejected(format!("{message} ({code})")),
        other => LedgerError::Transport(other.to_string()),
    }
}

/// Account lookups treat an unreachable node as having no signer at all.
fn account_error(err: RpcError) -> LedgerError {
    match err {
        RpcError::Transport(_) => {
            LedgerError::SigningUnavailable(format!("signing node unreachable: {err}"))
        }
        other => rejected_or_transport(other),
    }
}

impl JsonRpcLedger {
    /// Adapter for the node at `rpc_url`, polling receipts every `poll_interval`.
    pub fn new(rpc_url: &str, poll_interval: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            client: JsonRpcClient::new(rpc_url)?,
            poll_interval,
        })
    }

    /// The underlying client.
    pub fn client(&self) -> &JsonRpcClient {
        &self.client
    }

    async fn accounts(&self) -> Result<Vec<String>, LedgerError> {
        match self.client.call("eth_requestAccounts", json!([])).await {
            Ok(accounts) => Ok(accounts),
            Err(RpcError::Server {
                code: METHOD_NOT_FOUND,
                ..
            }) => {
                debug!("eth_requestAccounts unsupported; falling back to eth_accounts");
                self.client
                    .call("eth_accounts", json!([]))
                    .await
                    .map_err(|err| match err {
                        RpcError::Server {
                            code: METHOD_NOT_FOUND,
                            ..
                        } => LedgerError::SigningUnavailable(
                            "node exposes no account methods".into(),
                        ),
                        other => account_error(other),
                    })
            }
            Err(RpcError::Server {
                code: USER_REJECTED,
                message,
            }) => Err(LedgerError::Rejected(message)),
            Err(other) => Err(account_error(other)),
        }
    }
}

impl LedgerPort for JsonRpcLedger {
    async fn request_account(&self) -> Result<Address, LedgerError> {
        let accounts = self.accounts().await?;
        let first = accounts
            .first()
            .ok_or_else(|| LedgerError::SigningUnavailable("node manages no accounts".into()))?;
        Address::parse(first)
            .map_err(|err| LedgerError::Transport(format!("node returned account {first:?}: {err}")))
    }

    async fn send_batch(&self, tx: &BatchTransaction) -> Result<TxHash, LedgerError> {
        let data = format!("0x{}", hex::encode(encode_store_multiple_pii(&tx.hashes)));
        let params = json!([{
            "from": tx.from.to_string(),
            "to": tx.contract.to_string(),
            "data": data,
        }]);
        let hash: String = self
            .client
            .call("eth_sendTransaction", params)
            .await
            .map_err(rejected_or_transport)?;
        let tx_hash = TxHash::parse(&hash)
            .map_err(|err| LedgerError::Transport(format!("node returned tx hash {hash:?}: {err}")))?;
        info!(tx = %tx_hash, count = tx.hashes.len(), "node accepted transaction");
        Ok(tx_hash)
    }

    async fn wait_for_finalization(&self, tx_hash: TxHash) -> Result<TxReceipt, LedgerError> {
        loop {
            let receipt: Option<RawReceipt> = self
                .client
                .call("eth_getTransactionReceipt", json!([tx_hash.to_string()]))
                .await
                .map_err(rejected_or_transport)?;
            if let Some(receipt) = receipt {
                // Receipts without `status` predate status codes; inclusion is success.
                let succeeded = receipt.status.as_deref().map_or(true, |s| quantity(s) == Some(1));
                return Ok(TxReceipt {
                    tx_hash,
                    block_number: receipt.block_number.as_deref().and_then(quantity),
                    succeeded,
                });
            }
            debug!(tx = %tx_hash, "receipt not available yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(quantity("0x1"), Some(1));
        assert_eq!(quantity("0x1b4"), Some(436));
        assert_eq!(quantity("12"), None);
        assert_eq!(quantity("0xzz"), None);
    }

    #[test]
    fn server_errors_become_rejections() {
        let err = rejected_or_transport(RpcError::Server {
            code: -32000,
            message: "insufficient funds".into(),
        });
        assert_eq!(err, LedgerError::Rejected("insufficient funds (-32000)".into()));
        let err = rejected_or_transport(RpcError::Http(502));
        assert!(matches!(err, LedgerError::Transport(_)));
    }
}
