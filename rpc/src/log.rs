//! Event log filter and entry types, shaped like `eth_getLogs`.

use chief_types::Address;
use serde::{Deserialize, Serialize, Serializer};

/// Block bound of a log query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTag {
    Earliest,
    Latest,
    Number(u64),
}

impl Serialize for BlockTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockTag::Earliest => serializer.serialize_str("earliest"),
            BlockTag::Latest => serializer.serialize_str("latest"),
            BlockTag::Number(n) => serializer.collect_str(&format_args!("{n:#x}")),
        }
    }
}

/// Filter for a historical log query.
///
/// `topics` is positional: `None` at a position matches any topic there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub from_block: BlockTag,
    pub to_block: BlockTag,
    pub address: Address,
    pub topics: Vec<Option<String>>,
}

impl LogFilter {
    /// All logs of `address` whose first topic is `topic0`, from genesis to the chain head.
    pub fn full_history(address: Address, topic0: impl Into<String>) -> Self {
        Self {
            from_block: BlockTag::Number(0),
            to_block: BlockTag::Latest,
            address,
            topics: vec![Some(topic0.into())],
        }
    }
}

/// A single log entry as returned by the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: Address,
    /// Ordered topic words, each a `0x`-prefixed 32-byte hex string.
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl LogEntry {
    pub fn new(address: Address, topics: Vec<String>) -> Self {
        Self {
            address,
            topics,
            data: "0x".to_string(),
            block_number: None,
            transaction_hash: None,
        }
    }

    pub fn topic(&self, index: usize) -> Option<&str> {
        self.topics.get(index).map(String::as_str)
    }
}
