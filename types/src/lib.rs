//! Fundamental types for the chief governance client.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! on-chain addresses, slate and transaction hashes, and MKR token amounts.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;

pub use address::Address;
pub use amount::MkrAmount;
pub use error::TypesError;
pub use hash::{SlateId, TxHash};
