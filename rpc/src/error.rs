//! RPC error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The node could not be reached or the HTTP exchange failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call executed and the contract reverted.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// The node answered with a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("no sender account configured for transactions")]
    NoSender,
}

impl RpcError {
    pub fn is_revert(&self) -> bool {
        matches!(self, RpcError::Reverted(_))
    }
}
