//! Nullable transport: scripted call results, recorded transactions.

use async_trait::async_trait;
use chief_rpc::{CallReader, RpcError, TxSender};
use chief_types::{Address, TxHash};
use std::collections::HashMap;
use std::sync::Mutex;

/// A transaction "sent" through [`NullTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentTransaction {
    pub to: Address,
    pub data: Vec<u8>,
}

/// A test transport that answers calls from a script and records
/// transactions instead of sending them.
///
/// Unscripted calls revert, like a call to a missing contract method.
#[derive(Default)]
pub struct NullTransport {
    responses: Mutex<HashMap<(Address, Vec<u8>), Vec<u8>>>,
    calls: Mutex<Vec<(Address, Vec<u8>)>>,
    sent: Mutex<Vec<SentTransaction>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls of `data` on contract `to` with `ret`.
    pub fn respond(&self, to: Address, data: Vec<u8>, ret: Vec<u8>) {
        self.responses.lock().unwrap().insert((to, data), ret);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<(Address, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Every transaction sent so far, in order.
    pub fn sent(&self) -> Vec<SentTransaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallReader for NullTransport {
    async fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        self.calls.lock().unwrap().push((*to, data.to_vec()));
        self.responses
            .lock()
            .unwrap()
            .get(&(*to, data.to_vec()))
            .cloned()
            .ok_or_else(|| RpcError::Reverted("execution reverted".into()))
    }
}

#[async_trait]
impl TxSender for NullTransport {
    async fn send_transaction(&self, to: &Address, data: &[u8]) -> Result<TxHash, RpcError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentTransaction {
            to: *to,
            data: data.to_vec(),
        });
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&(sent.len() as u64).to_be_bytes());
        Ok(TxHash::new(hash))
    }
}
