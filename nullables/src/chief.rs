//! Nullable chief: an in-memory chief contract with its lock logs.

use async_trait::async_trait;
use chief_governance::{ChiefError, ChiefReader, LOCK_TOPIC};
use chief_rpc::{LogEntry, LogFilter, LogReader, RpcError};
use chief_types::{Address, MkrAmount, SlateId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct ChiefState {
    deposits: HashMap<Address, MkrAmount>,
    votes: HashMap<Address, SlateId>,
    slates: HashMap<SlateId, Vec<Address>>,
    approvals: HashMap<Address, MkrAmount>,
    hat: Address,
    logs: Vec<LogEntry>,
    failing_voters: HashSet<Address>,
    slate_failures: HashMap<SlateId, u64>,
    slate_blips: HashMap<SlateId, u64>,
    logs_unreachable: bool,
    read_delay: Option<Duration>,
}

/// An in-memory chief for testing.
///
/// Thread-safe for use with tokio's multi-threaded runtime. Every read is
/// counted; an optional delay makes reads overlap so concurrency limits and
/// timeouts can be observed.
pub struct NullChief {
    address: Address,
    state: Mutex<ChiefState>,
    slate_reads: Mutex<HashMap<SlateId, usize>>,
    reads: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn padded_topic(address: &Address) -> String {
    format!("0x{:0>64}", &address.to_string()[2..])
}

fn unreachable() -> ChiefError {
    ChiefError::Rpc(RpcError::Transport("connection refused".into()))
}

impl NullChief {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Mutex::new(ChiefState::default()),
            slate_reads: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Lock `amount` for `voter`, emitting a lock log like the real contract.
    pub fn lock(&self, voter: Address, amount: MkrAmount) {
        let mut state = self.state.lock().unwrap();
        let deposit = state.deposits.entry(voter).or_default();
        *deposit = *deposit + amount;
        let log = LogEntry::new(
            self.address,
            vec![LOCK_TOPIC.to_string(), padded_topic(&voter)],
        );
        state.logs.push(log);
    }

    /// Record `voter`'s choice of `slate`.
    pub fn vote(&self, voter: Address, slate: SlateId) {
        self.state.lock().unwrap().votes.insert(voter, slate);
    }

    /// Store `candidates` under `slate`.
    pub fn etch(&self, slate: SlateId, candidates: Vec<Address>) {
        self.state.lock().unwrap().slates.insert(slate, candidates);
    }

    pub fn set_hat(&self, hat: Address) {
        self.state.lock().unwrap().hat = hat;
    }

    pub fn set_approvals(&self, candidate: Address, amount: MkrAmount) {
        self.state
            .lock()
            .unwrap()
            .approvals
            .insert(candidate, amount);
    }

    /// Append a raw log entry, e.g. a malformed one.
    pub fn push_log(&self, log: LogEntry) {
        self.state.lock().unwrap().logs.push(log);
    }

    /// Make `deposits` and `votes` reads for `voter` fail with a transport error.
    pub fn fail_lookups_for(&self, voter: Address) {
        self.state.lock().unwrap().failing_voters.insert(voter);
    }

    /// Make the read of `slate` at `index` fail with a transport error.
    pub fn fail_slate_read(&self, slate: SlateId, index: u64) {
        self.state
            .lock()
            .unwrap()
            .slate_failures
            .insert(slate, index);
    }

    /// Make the next read of `slate` at `index` fail; later reads succeed.
    pub fn fail_slate_read_once(&self, slate: SlateId, index: u64) {
        self.state.lock().unwrap().slate_blips.insert(slate, index);
    }

    /// Make every log query fail with a transport error.
    pub fn make_logs_unreachable(&self) {
        self.state.lock().unwrap().logs_unreachable = true;
    }

    /// Delay every contract read by `delay`.
    pub fn set_read_delay(&self, delay: Duration) {
        self.state.lock().unwrap().read_delay = Some(delay);
    }

    /// Number of `slates` reads served for `slate`.
    pub fn slate_reads(&self, slate: &SlateId) -> usize {
        self.slate_reads
            .lock()
            .unwrap()
            .get(slate)
            .copied()
            .unwrap_or(0)
    }

    /// Number of contract reads served.
    pub fn total_reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Highest number of reads observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = self.state.lock().unwrap().read_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChiefReader for NullChief {
    fn address(&self) -> Address {
        self.address
    }

    async fn deposits(&self, voter: &Address) -> Result<MkrAmount, ChiefError> {
        self.simulate_read().await;
        let state = self.state.lock().unwrap();
        if state.failing_voters.contains(voter) {
            return Err(unreachable());
        }
        Ok(state.deposits.get(voter).copied().unwrap_or_default())
    }

    async fn votes(&self, voter: &Address) -> Result<SlateId, ChiefError> {
        self.simulate_read().await;
        let state = self.state.lock().unwrap();
        if state.failing_voters.contains(voter) {
            return Err(unreachable());
        }
        Ok(state.votes.get(voter).copied().unwrap_or(SlateId::ZERO))
    }

    async fn slates(&self, slate: &SlateId, index: u64) -> Result<Address, ChiefError> {
        self.simulate_read().await;
        *self.slate_reads.lock().unwrap().entry(*slate).or_default() += 1;
        let mut state = self.state.lock().unwrap();
        if state.slate_failures.get(slate) == Some(&index) {
            return Err(unreachable());
        }
        if state.slate_blips.get(slate) == Some(&index) {
            state.slate_blips.remove(slate);
            return Err(unreachable());
        }
        state
            .slates
            .get(slate)
            .and_then(|candidates| candidates.get(index as usize))
            .copied()
            .ok_or_else(|| ChiefError::Rpc(RpcError::Reverted("invalid opcode".into())))
    }

    async fn approvals(&self, candidate: &Address) -> Result<MkrAmount, ChiefError> {
        self.simulate_read().await;
        let state = self.state.lock().unwrap();
        Ok(state.approvals.get(candidate).copied().unwrap_or_default())
    }

    async fn hat(&self) -> Result<Address, ChiefError> {
        self.simulate_read().await;
        Ok(self.state.lock().unwrap().hat)
    }
}

#[async_trait]
impl LogReader for NullChief {
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, RpcError> {
        let state = self.state.lock().unwrap();
        if state.logs_unreachable {
            return Err(RpcError::Transport("connection refused".into()));
        }
        let matches = |log: &LogEntry| {
            log.address == filter.address
                && filter
                    .topics
                    .iter()
                    .enumerate()
                    .all(|(i, want)| match want {
                        Some(topic) => log.topic(i) == Some(topic.as_str()),
                        None => true,
                    })
        };
        Ok(state.logs.iter().filter(|log| matches(log)).cloned().collect())
    }
}
