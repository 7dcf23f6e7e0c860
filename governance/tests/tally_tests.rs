//! Integration tests for the tally pipeline against an in-memory chief:
//! lock logs → deposits/votes → slate resolution → fold.

use chief_governance::slate::read_slate;
use chief_governance::{
    discover_voters, SlateCache, SlateEnd, SlateResolver, TallyAggregator, TallyConfig,
    TallyError,
};
use chief_nullables::NullChief;
use chief_rpc::LogEntry;
use chief_types::{Address, MkrAmount, SlateId};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CHIEF: [u8; 20] = [0xc1; 20];

fn addr(byte: u8) -> Address {
    Address::new([byte; 20])
}

fn slate(byte: u8) -> SlateId {
    SlateId::new([byte; 32])
}

fn mkr(tokens: u64) -> MkrAmount {
    MkrAmount::from_whole(tokens)
}

fn null_chief() -> Arc<NullChief> {
    Arc::new(NullChief::new(Address::new(CHIEF)))
}

fn aggregator(chief: &Arc<NullChief>, config: TallyConfig) -> TallyAggregator<NullChief, NullChief> {
    TallyAggregator::new(chief.clone(), chief.clone(), config)
}

/// A(100) and B(300) vote S1 = {X, Y}; C(600) votes S2 = {Y}.
fn three_voter_chief() -> Arc<NullChief> {
    let chief = null_chief();
    chief.etch(slate(1), vec![addr(0x01), addr(0x02)]);
    chief.etch(slate(2), vec![addr(0x02)]);
    for (voter, tokens, choice) in [(0xa, 100, 1), (0xb, 300, 1), (0xc, 600, 2)] {
        chief.lock(addr(voter), mkr(tokens));
        chief.vote(addr(voter), slate(choice));
    }
    chief
}

fn percents(tally: &chief_governance::VoteTally, candidate: u8) -> Vec<(Address, String)> {
    tally
        .get(&addr(candidate))
        .expect("candidate in tally")
        .iter()
        .map(|c| (c.address, c.percent.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_voters_two_slates() {
    let chief = three_voter_chief();
    let tally = aggregator(&chief, TallyConfig::default())
        .vote_tally()
        .await
        .unwrap();

    assert_eq!(tally.len(), 2);
    assert_eq!(
        percents(&tally, 0x01),
        vec![(addr(0xb), "75.00".into()), (addr(0xa), "25.00".into())]
    );
    assert_eq!(
        percents(&tally, 0x02),
        vec![
            (addr(0xc), "60.00".into()),
            (addr(0xb), "30.00".into()),
            (addr(0xa), "10.00".into()),
        ]
    );
    let top = &tally.get(&addr(0x02)).unwrap()[0];
    assert_eq!(top.deposits, mkr(600));
}

#[tokio::test]
async fn voter_without_slate_contributes_nothing() {
    let chief = three_voter_chief();
    chief.lock(addr(0xd), mkr(5_000));

    let tally = aggregator(&chief, TallyConfig::default())
        .vote_tally()
        .await
        .unwrap();

    assert!(tally
        .iter()
        .all(|(_, contributions)| contributions.iter().all(|c| c.address != addr(0xd))));
    assert_eq!(percents(&tally, 0x01)[0].1, "75.00");
}

#[tokio::test]
async fn repeated_locks_count_voter_once() {
    let chief = null_chief();
    chief.etch(slate(1), vec![addr(0x01)]);
    chief.lock(addr(0xa), mkr(1));
    chief.lock(addr(0xa), mkr(2));
    chief.vote(addr(0xa), slate(1));

    let voters = discover_voters(&*chief, chief_governance::ChiefReader::address(&*chief))
        .await
        .unwrap();
    assert_eq!(voters, vec![addr(0xa)]);

    let tally = aggregator(&chief, TallyConfig::default())
        .vote_tally()
        .await
        .unwrap();
    let contributions = tally.get(&addr(0x01)).unwrap();
    assert_eq!(contributions.len(), 1);
    assert_eq!(contributions[0].deposits, mkr(3));
    assert_eq!(contributions[0].percent, "100.00");
}

#[tokio::test]
async fn unpadded_and_short_logs_are_handled() {
    let chief = null_chief();
    let chief_address = Address::new(CHIEF);
    chief.push_log(LogEntry::new(
        chief_address,
        vec![
            chief_governance::LOCK_TOPIC.to_string(),
            addr(0xe).to_string(),
        ],
    ));
    chief.push_log(LogEntry::new(
        chief_address,
        vec![chief_governance::LOCK_TOPIC.to_string()],
    ));

    let voters = discover_voters(&*chief, chief_address).await.unwrap();
    assert_eq!(voters, vec![addr(0xe)]);
}

#[tokio::test]
async fn percentages_sum_to_one_hundred_within_rounding() {
    let chief = null_chief();
    chief.etch(slate(1), vec![addr(0x01), addr(0x02), addr(0x03)]);
    chief.etch(slate(2), vec![addr(0x02)]);
    chief.etch(slate(3), vec![addr(0x03), addr(0x01)]);
    let weights = [7u64, 13, 29, 1, 1, 1, 333, 42];
    for (i, tokens) in weights.iter().enumerate() {
        let voter = addr(0x40 + i as u8);
        chief.lock(voter, mkr(*tokens));
        chief.vote(voter, slate(1 + (i % 3) as u8));
    }

    let tally = aggregator(&chief, TallyConfig::default())
        .vote_tally()
        .await
        .unwrap();

    for (candidate, contributions) in tally.iter() {
        let total: Decimal = contributions
            .iter()
            .map(|c| c.percent.parse::<Decimal>().unwrap())
            .sum();
        let tolerance = Decimal::new(5, 3) * Decimal::from(contributions.len());
        assert!(
            (total - Decimal::ONE_HUNDRED).abs() <= tolerance,
            "{candidate}: {total}"
        );
        assert!(contributions
            .windows(2)
            .all(|pair| pair[0].deposits >= pair[1].deposits));
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failed_lookup_fails_the_tally() {
    let chief = three_voter_chief();
    chief.fail_lookups_for(addr(0xb));

    let err = aggregator(&chief, TallyConfig::default())
        .vote_tally()
        .await
        .unwrap_err();

    match err {
        TallyError::AggregationFailure { voter, source } => {
            assert_eq!(voter, addr(0xb));
            assert!(!source.is_revert());
        }
        other => panic!("expected aggregation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_logs_fail_fast() {
    let chief = three_voter_chief();
    chief.make_logs_unreachable();

    let err = aggregator(&chief, TallyConfig::default())
        .vote_tally()
        .await
        .unwrap_err();

    assert!(matches!(err, TallyError::Discovery(_)));
    assert_eq!(chief.total_reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_chain_times_out() {
    let chief = three_voter_chief();
    chief.set_read_delay(Duration::from_secs(5));
    let config = TallyConfig {
        timeout_secs: 1,
        ..TallyConfig::default()
    };

    let err = aggregator(&chief, config).vote_tally().await.unwrap_err();
    assert!(matches!(err, TallyError::Timeout));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_the_run() {
    let chief = three_voter_chief();
    chief.set_read_delay(Duration::from_secs(10));
    let (tx, rx) = tokio::sync::broadcast::channel(1);
    tx.send(()).unwrap();

    let err = aggregator(&chief, TallyConfig::default())
        .vote_tally_until(rx)
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::Cancelled));
}

#[tokio::test]
async fn closed_shutdown_channel_does_not_cancel() {
    let chief = three_voter_chief();
    let (tx, rx) = tokio::sync::broadcast::channel::<()>(1);
    drop(tx);

    let tally = aggregator(&chief, TallyConfig::default())
        .vote_tally_until(rx)
        .await
        .unwrap();
    assert_eq!(tally.len(), 2);
}

// ---------------------------------------------------------------------------
// Slate resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shared_slate_is_read_once_per_run() {
    let chief = three_voter_chief();
    aggregator(&chief, TallyConfig::default())
        .vote_tally()
        .await
        .unwrap();

    // two entries plus the read that ends the list
    assert_eq!(chief.slate_reads(&slate(1)), 3);
    assert_eq!(chief.slate_reads(&slate(2)), 2);
}

#[tokio::test]
async fn injected_cache_survives_runs() {
    let chief = three_voter_chief();
    let cache = Arc::new(SlateCache::new());
    let aggregator = aggregator(&chief, TallyConfig::default()).with_cache(cache.clone());

    let first = aggregator.vote_tally().await.unwrap();
    let reads = chief.slate_reads(&slate(1));
    let second = aggregator.vote_tally().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(chief.slate_reads(&slate(1)), reads);
    assert_eq!(cache.len().await, 2);
}

#[tokio::test]
async fn transient_slate_failure_does_not_outlive_its_run() {
    let chief = null_chief();
    chief.etch(slate(1), vec![addr(0x01), addr(0x02)]);
    chief.lock(addr(0xa), mkr(10));
    chief.vote(addr(0xa), slate(1));
    chief.fail_slate_read_once(slate(1), 1);
    let cache = Arc::new(SlateCache::new());
    let aggregator = aggregator(&chief, TallyConfig::default()).with_cache(cache.clone());

    let first = aggregator.vote_tally().await.unwrap();
    assert_eq!(first.len(), 1);
    assert!(cache.is_empty().await);

    let second = aggregator.vote_tally().await.unwrap();
    assert_eq!(second.len(), 2);
    let (candidates, end) = cache.get(&slate(1)).await.unwrap();
    assert_eq!(&*candidates, &[addr(0x01), addr(0x02)]);
    assert_eq!(end, SlateEnd::Reverted);
}

#[tokio::test]
async fn capped_slate_is_not_shared() {
    let chief = null_chief();
    chief.etch(slate(4), (1..=6).map(addr).collect());
    let shared = Arc::new(SlateCache::new());
    let resolver = SlateResolver::new(chief.clone(), Arc::new(SlateCache::new()), 3)
        .with_shared(Some(shared.clone()));

    let (candidates, end) = resolver.resolve_with_end(&slate(4)).await;
    assert_eq!(candidates.len(), 3);
    assert_eq!(end, SlateEnd::LengthCap);
    assert!(shared.get(&slate(4)).await.is_none());

    // reused within the resolver's own cache
    resolver.resolve(&slate(4)).await;
    assert_eq!(chief.slate_reads(&slate(4)), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolutions_share_one_read_set() {
    let chief = null_chief();
    chief.etch(slate(7), vec![addr(1), addr(2), addr(3)]);
    chief.set_read_delay(Duration::from_millis(5));
    let resolver = Arc::new(SlateResolver::new(
        chief.clone(),
        Arc::new(SlateCache::new()),
        1024,
    ));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve(&slate(7)).await })
        })
        .collect();
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    assert_eq!(&*results[0], &[addr(1), addr(2), addr(3)]);
    assert_eq!(chief.slate_reads(&slate(7)), 4);
}

#[tokio::test]
async fn empty_slate_resolves_to_nothing() {
    let chief = null_chief();
    let (candidates, end) = read_slate(&*chief, &slate(9), 1024).await;
    assert!(candidates.is_empty());
    assert_eq!(end, SlateEnd::Reverted);
}

#[tokio::test]
async fn zero_slate_needs_no_reads() {
    let chief = null_chief();
    let resolver = SlateResolver::new(chief.clone(), Arc::new(SlateCache::new()), 1024);
    assert!(resolver.resolve(&SlateId::ZERO).await.is_empty());
    assert_eq!(chief.total_reads(), 0);
}

#[tokio::test]
async fn transport_failure_truncates_slate() {
    let chief = null_chief();
    chief.etch(slate(3), vec![addr(1), addr(2), addr(3)]);
    chief.fail_slate_read(slate(3), 1);

    let (candidates, end) = read_slate(&*chief, &slate(3), 1024).await;
    assert_eq!(candidates, vec![addr(1)]);
    assert_eq!(end, SlateEnd::ReadFailed);
}

#[tokio::test]
async fn length_cap_bounds_the_loop() {
    let chief = null_chief();
    chief.etch(slate(4), (1..=10).map(addr).collect());

    let (candidates, end) = read_slate(&*chief, &slate(4), 4).await;
    assert_eq!(candidates.len(), 4);
    assert_eq!(end, SlateEnd::LengthCap);
    assert_eq!(chief.slate_reads(&slate(4)), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_respect_concurrency_limit() {
    let chief = null_chief();
    chief.etch(slate(1), vec![addr(1)]);
    for i in 0..24u8 {
        chief.lock(addr(0x80 + i), mkr(1 + i as u64));
        chief.vote(addr(0x80 + i), slate(1));
    }
    chief.set_read_delay(Duration::from_millis(2));
    let config = TallyConfig {
        max_concurrent_reads: 3,
        ..TallyConfig::default()
    };

    let tally = aggregator(&chief, config).vote_tally().await.unwrap();
    assert_eq!(tally.get(&addr(1)).unwrap().len(), 24);
    assert!(chief.max_in_flight() <= 3, "saw {}", chief.max_in_flight());
    assert!(chief.max_in_flight() > 1);
}
