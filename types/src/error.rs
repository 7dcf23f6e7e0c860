//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while parsing or converting the fundamental types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid 32-byte hash: {0}")]
    InvalidHash(String),

    #[error("invalid token amount: {0}")]
    InvalidAmount(String),

    #[error("token amount does not fit the decimal range: {0} wei")]
    AmountOverflow(u128),
}
