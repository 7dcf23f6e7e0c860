use chief_rpc::RpcError;
use chief_types::Address;
use thiserror::Error;

/// Failure of a single contract read or write.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChiefError {
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("could not decode {method} result: {reason}")]
    Decode { method: &'static str, reason: String },
}

impl ChiefError {
    /// Whether the contract itself rejected the call (as opposed to the
    /// transport failing).
    pub fn is_revert(&self) -> bool {
        matches!(self, ChiefError::Rpc(e) if e.is_revert())
    }
}

/// Failure of a whole tally run. There are no partial tallies.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("voter discovery failed: {0}")]
    Discovery(#[source] ChiefError),

    #[error("lookup for voter {voter} failed: {source}")]
    AggregationFailure {
        voter: Address,
        #[source]
        source: ChiefError,
    },

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("tally timed out")]
    Timeout,

    #[error("tally cancelled")]
    Cancelled,
}
