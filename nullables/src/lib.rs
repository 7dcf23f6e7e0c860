//! Nullable infrastructure for deterministic testing.
//!
//! The chain is abstracted behind the `ChiefReader`, `LogReader`, `CallReader`
//! and `TxSender` traits. This crate provides in-memory implementations that:
//! - Return deterministic values
//! - Can be told to fail at precise points
//! - Count the reads they serve, for memoisation and concurrency assertions
//! - Never touch the network
//!
//! Usage: swap the JSON-RPC client for nullables in tests.

pub mod chief;
pub mod transport;

pub use chief::NullChief;
pub use transport::{NullTransport, SentTransaction};
