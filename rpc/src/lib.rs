//! Ethereum JSON-RPC transport for the chief governance client.
//!
//! Three seams are exposed as traits so that everything above them can run
//! against an in-memory chain in tests:
//! - [`CallReader`]: read-only contract calls (`eth_call`)
//! - [`LogReader`]: historical event logs (`eth_getLogs`)
//! - [`TxSender`]: transaction submission from a node-managed account
//!
//! [`JsonRpcClient`] implements all three over HTTP.

pub mod client;
pub mod error;
pub mod log;

pub use client::JsonRpcClient;
pub use error::RpcError;
pub use log::{BlockTag, LogEntry, LogFilter};

use async_trait::async_trait;
use chief_types::{Address, TxHash};
use std::sync::Arc;

/// Read-only contract calls.
#[async_trait]
pub trait CallReader: Send + Sync {
    /// Execute `data` against contract `to` at the latest block and return
    /// the raw ABI-encoded return data.
    async fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, RpcError>;
}

/// Historical event log queries.
#[async_trait]
pub trait LogReader: Send + Sync {
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, RpcError>;
}

/// Transaction submission. Signing is the node's job.
#[async_trait]
pub trait TxSender: Send + Sync {
    async fn send_transaction(&self, to: &Address, data: &[u8]) -> Result<TxHash, RpcError>;
}

#[async_trait]
impl<T: CallReader + ?Sized> CallReader for Arc<T> {
    async fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        (**self).call(to, data).await
    }
}

#[async_trait]
impl<T: LogReader + ?Sized> LogReader for Arc<T> {
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, RpcError> {
        (**self).get_logs(filter).await
    }
}

#[async_trait]
impl<T: TxSender + ?Sized> TxSender for Arc<T> {
    async fn send_transaction(&self, to: &Address, data: &[u8]) -> Result<TxHash, RpcError> {
        (**self).send_transaction(to, data).await
    }
}
