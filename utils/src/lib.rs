//! Shared utilities for the chief governance client.

pub mod logging;

pub use logging::{init_logging, LogFormat};
