//! Governance services for the DSChief voting contract.
//!
//! Reads: voter discovery from lock logs, deposits, slates, approvals, the hat,
//! and the deposit-weighted vote tally built from all of them.
//! Writes: thin pass-throughs (`etch`, `lift`, `vote`, `lock`, `free`) and the
//! vote-proxy factory's link management.
//!
//! Tally pipeline: discover voters → deposits + chosen slate per voter →
//! expand slates (memoised, single-flight) → fold into a per-candidate tally.

pub mod abi;
pub mod aggregator;
pub mod chief;
pub mod config;
pub mod error;
pub mod proxy;
pub mod slate;
pub mod tally;
pub mod voters;

pub use aggregator::TallyAggregator;
pub use chief::{Chief, ChiefCall, ChiefReader, VotePicks};
pub use config::TallyConfig;
pub use error::{ChiefError, TallyError};
pub use proxy::{VoteProxy, VoteProxyFactory};
pub use slate::{Resolution, SlateCache, SlateEnd, SlateResolver};
pub use tally::{Contribution, VoteTally, VoterChoice};
pub use voters::{discover_voters, etched_slates, ETCH_EVENT, LOCK_TOPIC};
