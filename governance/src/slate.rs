//! Slate resolution: expanding a slate id into its candidate list.
//!
//! The chief stores each slate as a public `address[]` with no length getter,
//! so a slate is read index by index until a read fails. Slates are immutable
//! once etched, which makes every resolution safe to memoise.

use chief_types::{Address, SlateId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use crate::chief::ChiefReader;

/// Why a slate read stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlateEnd {
    /// The contract rejected the index: the normal end of the list.
    Reverted,
    /// Any other failure. Still treated as the end of the list, so a transient
    /// error truncates the slate instead of failing the caller.
    ReadFailed,
    /// The configured length cap was reached.
    LengthCap,
}

/// Read `slate` from index 0 until the first failed read or `max_len` entries.
pub async fn read_slate<R: ChiefReader + ?Sized>(
    reader: &R,
    slate: &SlateId,
    max_len: u64,
) -> (Vec<Address>, SlateEnd) {
    let mut candidates = Vec::new();
    let mut index = 0u64;
    let end = loop {
        if index >= max_len {
            break SlateEnd::LengthCap;
        }
        match reader.slates(slate, index).await {
            Ok(candidate) => {
                candidates.push(candidate);
                index += 1;
            }
            Err(e) if e.is_revert() => {
                tracing::trace!(%slate, index, "end of slate");
                break SlateEnd::Reverted;
            }
            Err(e) => {
                tracing::warn!(%slate, index, error = %e, "slate read failed, treating as end of slate");
                break SlateEnd::ReadFailed;
            }
        }
    };
    if end == SlateEnd::LengthCap {
        tracing::warn!(%slate, max_len, "slate length cap reached");
    }
    (candidates, end)
}

/// A slate's candidates and how the read ended.
pub type Resolution = (Arc<[Address]>, SlateEnd);

/// Memoised slate contents with per-key single-flight.
///
/// Concurrent requests for the same slate share one resolution; later
/// requests get the stored list back without touching the chain.
#[derive(Default)]
pub struct SlateCache {
    entries: Mutex<HashMap<SlateId, Arc<OnceCell<Resolution>>>>,
}

impl SlateCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn cell(&self, slate: &SlateId) -> Arc<OnceCell<Resolution>> {
        let mut entries = self.entries.lock().await;
        entries.entry(*slate).or_default().clone()
    }

    /// Return the cached resolution of `slate`, running `resolve` if no
    /// resolution has completed or is in flight.
    pub async fn get_or_resolve<F, Fut>(&self, slate: &SlateId, resolve: F) -> Resolution
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Resolution>,
    {
        let cell = self.cell(slate).await;
        cell.get_or_init(resolve).await.clone()
    }

    /// Store a finished resolution. An existing entry is kept.
    pub async fn insert(&self, slate: &SlateId, resolution: Resolution) {
        let _ = self.cell(slate).await.set(resolution);
    }

    /// The cached resolution of `slate`, if already finished.
    pub async fn get(&self, slate: &SlateId) -> Option<Resolution> {
        let entries = self.entries.lock().await;
        entries.get(slate).and_then(|cell| cell.get().cloned())
    }

    /// Number of slates with a cache entry, resolved or in flight.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Resolves slates through a [`SlateCache`].
///
/// The run cache memoises every resolution, truncated ones included. An
/// optional shared cache outlives the run and only receives slates read to
/// their natural end, so a transient failure or the length cap never sticks.
pub struct SlateResolver<R: ?Sized> {
    cache: Arc<SlateCache>,
    shared: Option<Arc<SlateCache>>,
    max_len: u64,
    reader: Arc<R>,
}

impl<R: ChiefReader + ?Sized> SlateResolver<R> {
    pub fn new(reader: Arc<R>, cache: Arc<SlateCache>, max_len: u64) -> Self {
        Self {
            cache,
            shared: None,
            max_len,
            reader,
        }
    }

    /// Also consult and fill `shared`, which holds complete slates only.
    pub fn with_shared(mut self, shared: Option<Arc<SlateCache>>) -> Self {
        self.shared = shared;
        self
    }

    /// The candidate list of `slate`.
    pub async fn resolve(&self, slate: &SlateId) -> Arc<[Address]> {
        self.resolve_with_end(slate).await.0
    }

    /// The candidate list of `slate` and why its read stopped.
    ///
    /// The zero slate (a voter who never voted) is empty without a chain read.
    pub async fn resolve_with_end(&self, slate: &SlateId) -> Resolution {
        if slate.is_zero() {
            return (Arc::from(Vec::new()), SlateEnd::Reverted);
        }
        if let Some(shared) = &self.shared {
            if let Some(hit) = shared.get(slate).await {
                return hit;
            }
        }
        let resolution = self
            .cache
            .get_or_resolve(slate, || async {
                let (candidates, end) = read_slate(&*self.reader, slate, self.max_len).await;
                tracing::debug!(%slate, len = candidates.len(), ?end, "slate resolved");
                (Arc::from(candidates), end)
            })
            .await;
        if let Some(shared) = &self.shared {
            if resolution.1 == SlateEnd::Reverted {
                shared.insert(slate, resolution.clone()).await;
            }
        }
        resolution
    }
}
