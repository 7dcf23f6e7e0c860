//! HTTP JSON-RPC client for an Ethereum node.

use async_trait::async_trait;
use chief_types::{Address, TxHash};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::RpcError;
use crate::log::{LogEntry, LogFilter};
use crate::{CallReader, LogReader, TxSender};

/// JSON-RPC client targeting a single node URL.
///
/// Wraps `reqwest::Client` and provides the handful of `eth_*` methods the
/// governance services need. Transactions are sent with `eth_sendTransaction`
/// from `from`, which must be an account the node can sign for.
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    from: Option<Address>,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// Nodes disagree on how a failed `eth_call` is reported: geth says
/// "execution reverted", ganache says "VM Exception ... revert" or
/// "invalid opcode" for out-of-bounds array reads.
fn is_revert_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("revert") || lower.contains("invalid opcode")
}

impl RpcResponse {
    fn into_result(self) -> Result<serde_json::Value, RpcError> {
        if let Some(err) = self.error {
            if is_revert_message(&err.message) {
                return Err(RpcError::Reverted(err.message));
            }
            return Err(RpcError::Node {
                code: err.code,
                message: err.message,
            });
        }
        self.result
            .ok_or_else(|| RpcError::InvalidResponse("missing result".into()))
    }
}

fn decode_hex(value: &str) -> Result<Vec<u8>, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| RpcError::InvalidResponse(format!("bad hex data: {e}")))
}

impl JsonRpcClient {
    /// Create a client for `url` (e.g. `http://127.0.0.1:8545`).
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            from: None,
            next_id: AtomicU64::new(1),
        })
    }

    /// Use `from` as the sender of submitted transactions.
    pub fn with_sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON-RPC request and deserialize its `result`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("{method} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RpcError::Transport(format!(
                "node returned HTTP {} for {method}",
                response.status()
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(format!("invalid JSON for {method}: {e}")))?;

        let result = envelope.into_result()?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::InvalidResponse(format!("unexpected {method} result: {e}")))
    }
}

#[async_trait]
impl CallReader for JsonRpcClient {
    async fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let params = serde_json::json!([
            { "to": to, "data": format!("0x{}", hex::encode(data)) },
            "latest"
        ]);
        let result: String = self.request("eth_call", params).await?;
        decode_hex(&result)
    }
}

#[async_trait]
impl LogReader for JsonRpcClient {
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, RpcError> {
        let logs: Vec<LogEntry> = self
            .request("eth_getLogs", serde_json::json!([filter]))
            .await?;
        tracing::debug!(address = %filter.address, count = logs.len(), "fetched logs");
        Ok(logs)
    }
}

#[async_trait]
impl TxSender for JsonRpcClient {
    async fn send_transaction(&self, to: &Address, data: &[u8]) -> Result<TxHash, RpcError> {
        let from = self.from.ok_or(RpcError::NoSender)?;
        let params = serde_json::json!([{
            "from": from,
            "to": to,
            "data": format!("0x{}", hex::encode(data)),
        }]);
        let hash: String = self.request("eth_sendTransaction", params).await?;
        let hash = TxHash::parse(&hash).map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        tracing::info!(%from, %to, %hash, "transaction submitted");
        Ok(hash)
    }
}
