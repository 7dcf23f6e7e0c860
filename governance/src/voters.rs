//! Voter and slate discovery from the chief's event logs.
//!
//! The chief keeps no enumerable list of voters, so the set of addresses that
//! ever locked MKR is reconstructed from its `LogNote` entries for `lock`.

use chief_rpc::{LogFilter, LogReader};
use chief_types::{Address, SlateId};
use ethabi::ParamType;
use std::collections::HashSet;
use std::hash::Hash;

use crate::abi;
use crate::error::ChiefError;

/// topic0 of the chief's `LogNote` for `lock(uint256)`: the 4-byte selector, right-padded.
pub const LOCK_TOPIC: &str = "0xdd46706400000000000000000000000000000000000000000000000000000000";

/// Name of the event emitted when a slate is etched.
pub const ETCH_EVENT: &str = "Etch";

fn push_unique<T: Copy + Eq + Hash>(seen: &mut HashSet<T>, out: &mut Vec<T>, item: T) {
    if seen.insert(item) {
        out.push(item);
    }
}

/// Every address that has ever locked MKR into `chief`, deduplicated.
///
/// The locker is the second topic of each lock log. Logs without one, or
/// whose topic does not hold an address, are skipped.
pub async fn discover_voters<L: LogReader + ?Sized>(
    logs: &L,
    chief: Address,
) -> Result<Vec<Address>, ChiefError> {
    let entries = logs
        .get_logs(&LogFilter::full_history(chief, LOCK_TOPIC))
        .await?;

    let mut seen = HashSet::new();
    let mut voters = Vec::new();
    for entry in &entries {
        let Some(topic) = entry.topic(1) else {
            tracing::debug!(tx = ?entry.transaction_hash, "lock log without locker topic");
            continue;
        };
        match Address::from_topic(topic) {
            Ok(voter) => push_unique(&mut seen, &mut voters, voter),
            Err(e) => tracing::warn!(topic, error = %e, "skipping undecodable lock log"),
        }
    }
    tracing::debug!(logs = entries.len(), voters = voters.len(), "voters discovered");
    Ok(voters)
}

/// Every slate ever etched on `chief`, in first-seen order.
pub async fn etched_slates<L: LogReader + ?Sized>(
    logs: &L,
    chief: Address,
) -> Result<Vec<SlateId>, ChiefError> {
    let topic0 = abi::event_topic(ETCH_EVENT, &[ParamType::FixedBytes(32)]);
    let entries = logs
        .get_logs(&LogFilter::full_history(chief, topic0))
        .await?;

    let mut seen = HashSet::new();
    let mut slates = Vec::new();
    for entry in &entries {
        match entry.topic(1).map(SlateId::parse) {
            Some(Ok(slate)) => push_unique(&mut seen, &mut slates, slate),
            Some(Err(e)) => tracing::warn!(error = %e, "skipping undecodable etch log"),
            None => tracing::debug!("etch log without slate topic"),
        }
    }
    Ok(slates)
}
