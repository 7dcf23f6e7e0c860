//! The vote tally pipeline.
//!
//! discover voters → deposits + chosen slate per voter → resolve slates → fold.
//!
//! Each stage fans out its reads and waits for all of them before the next
//! stage starts. Reads share one semaphore so at most
//! [`TallyConfig::max_concurrent_reads`] are in flight at a time. Any failed
//! voter lookup fails the whole run; slate reads never fail (see [`SlateEnd`]).
//!
//! [`SlateEnd`]: crate::slate::SlateEnd

use async_trait::async_trait;
use chief_rpc::LogReader;
use chief_types::{Address, MkrAmount, SlateId};
use futures_util::future::{join_all, try_join_all};
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};
use tracing::{info_span, Instrument};

use crate::chief::ChiefReader;
use crate::config::TallyConfig;
use crate::error::{ChiefError, TallyError};
use crate::slate::{SlateCache, SlateResolver};
use crate::tally::{VoteTally, VoterChoice};
use crate::voters::discover_voters;

/// A [`ChiefReader`] that holds a semaphore permit for the duration of each read.
struct Throttled<R: ?Sized> {
    permits: Semaphore,
    inner: Arc<R>,
}

impl<R: ?Sized> Throttled<R> {
    async fn permit(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.permits
            .acquire()
            .await
            .expect("tally semaphore is never closed")
    }
}

#[async_trait]
impl<R: ChiefReader + ?Sized> ChiefReader for Throttled<R> {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn deposits(&self, voter: &Address) -> Result<MkrAmount, ChiefError> {
        let _permit = self.permit().await;
        self.inner.deposits(voter).await
    }

    async fn votes(&self, voter: &Address) -> Result<SlateId, ChiefError> {
        let _permit = self.permit().await;
        self.inner.votes(voter).await
    }

    async fn slates(&self, slate: &SlateId, index: u64) -> Result<Address, ChiefError> {
        let _permit = self.permit().await;
        self.inner.slates(slate, index).await
    }

    async fn approvals(&self, candidate: &Address) -> Result<MkrAmount, ChiefError> {
        let _permit = self.permit().await;
        self.inner.approvals(candidate).await
    }

    async fn hat(&self) -> Result<Address, ChiefError> {
        let _permit = self.permit().await;
        self.inner.hat().await
    }
}

/// Builds [`VoteTally`]s from the chief's logs and storage.
pub struct TallyAggregator<R: ?Sized, L: ?Sized> {
    config: TallyConfig,
    /// Shared across runs when injected; otherwise every run gets a fresh one.
    cache: Option<Arc<SlateCache>>,
    logs: Arc<L>,
    reader: Arc<R>,
}

impl<R, L> TallyAggregator<R, L>
where
    R: ChiefReader + ?Sized,
    L: LogReader + ?Sized,
{
    pub fn new(reader: Arc<R>, logs: Arc<L>, config: TallyConfig) -> Self {
        Self {
            config,
            cache: None,
            logs,
            reader,
        }
    }

    /// Keep complete slate resolutions in `cache` across runs. Slates never
    /// change once etched, so a slate read to its end stays valid
    /// indefinitely. Truncated reads are reused within their run only.
    pub fn with_cache(mut self, cache: Arc<SlateCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Compute the current tally, bounded by the configured timeout.
    pub async fn vote_tally(&self) -> Result<VoteTally, TallyError> {
        tokio::time::timeout(self.config.timeout(), self.run())
            .await
            .map_err(|_| {
                tracing::warn!(timeout_secs = self.config.timeout_secs, "tally timed out");
                TallyError::Timeout
            })?
    }

    /// Like [`vote_tally`](Self::vote_tally), but abandons the run as soon as
    /// `shutdown` fires. In-flight reads are dropped. A closed channel never
    /// cancels.
    pub async fn vote_tally_until(
        &self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<VoteTally, TallyError> {
        let cancelled = async move {
            if let Err(broadcast::error::RecvError::Closed) = shutdown.recv().await {
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            result = self.vote_tally() => result,
            _ = cancelled => {
                tracing::info!("tally cancelled");
                Err(TallyError::Cancelled)
            }
        }
    }

    async fn run(&self) -> Result<VoteTally, TallyError> {
        let reader = Arc::new(Throttled {
            permits: Semaphore::new(self.config.max_concurrent_reads.max(1)),
            inner: self.reader.clone(),
        });

        let voters = discover_voters(&*self.logs, reader.address())
            .instrument(info_span!("discover_voters"))
            .await
            .map_err(TallyError::Discovery)?;

        let lookups = try_join_all(voters.iter().map(|voter| {
            let reader = &reader;
            async move {
                let (deposits, slate) = tokio::try_join!(reader.deposits(voter), reader.votes(voter))
                    .map_err(|source| TallyError::AggregationFailure {
                        voter: *voter,
                        source,
                    })?;
                Ok::<_, TallyError>((*voter, deposits, slate))
            }
        }))
        .instrument(info_span!("voter_lookups", voters = voters.len()))
        .await?;

        let resolver = SlateResolver::new(reader, Arc::default(), self.config.max_slate_len)
            .with_shared(self.cache.clone());
        let choices: Vec<VoterChoice> = join_all(lookups.into_iter().map(
            |(voter, deposits, slate)| {
                let resolver = &resolver;
                async move {
                    VoterChoice {
                        voter,
                        deposits,
                        candidates: resolver.resolve(&slate).await,
                    }
                }
            },
        ))
        .instrument(info_span!("resolve_slates"))
        .await;

        let tally = VoteTally::fold(&choices)?;
        tracing::info!(
            voters = choices.len(),
            candidates = tally.len(),
            "vote tally computed"
        );
        Ok(tally)
    }
}
