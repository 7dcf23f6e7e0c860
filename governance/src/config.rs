//! Tally tuning knobs with serde defaults, embeddable in a TOML config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits applied to a single tally run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Maximum number of contract reads in flight at once.
    #[serde(default = "default_max_concurrent_reads")]
    pub max_concurrent_reads: usize,

    /// Slate reads stop after this many entries.
    #[serde(default = "default_max_slate_len")]
    pub max_slate_len: u64,

    /// Upper bound on a whole tally run, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_concurrent_reads() -> usize {
    16
}

fn default_max_slate_len() -> u64 {
    1024
}

fn default_timeout_secs() -> u64 {
    120
}

impl TallyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reads: default_max_concurrent_reads(),
            max_slate_len: default_max_slate_len(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
