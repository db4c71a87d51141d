//! Shared secondary limiter behavior across concurrent resolutions

mod helpers;

use dbh_matcher::models::{MatchingMode, SearchCandidate, SourcePlatform, TrackDescriptor};
use dbh_matcher::services::SharedRateLimiter;
use helpers::{StubCatalog, TestMatcher};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

fn distinct_tracks(n: usize) -> Vec<TrackDescriptor> {
    (0..n)
        .map(|i| {
            TrackDescriptor::new(
                format!("Track {}", i),
                "Artist",
                SourcePlatform::Spotify,
                format!("sp-{}", i),
            )
        })
        .collect()
}

fn echo_secondary() -> std::sync::Arc<StubCatalog> {
    // Echo the query back as a perfect candidate: "artist track n"
    StubCatalog::new("dab", |query| {
        let title = query.trim_start_matches("artist ").to_string();
        Ok(vec![SearchCandidate::new(format!("dab-{}", title), title, "artist")])
    })
}

#[tokio::test]
async fn test_concurrent_resolutions_share_one_bucket() {
    let limiter = SharedRateLimiter::per_second("dab", 5.0).unwrap(); // 200ms period
    let harness = TestMatcher::with_limiter(StubCatalog::empty("qobuz"), echo_secondary(), limiter).await;

    let start = Instant::now();
    let mut join_set = JoinSet::new();
    for track in distinct_tracks(3) {
        let resolver = harness.resolver.clone();
        join_set.spawn(async move {
            resolver
                .resolve(&track, MatchingMode::Strict, &CancellationToken::new())
                .await
        });
    }

    let mut found = 0;
    while let Some(result) = join_set.join_next().await {
        if result.unwrap().is_found() {
            found += 1;
        }
    }
    let elapsed = start.elapsed();

    assert_eq!(found, 3);
    assert_eq!(harness.secondary.calls(), 3);
    // Burst 1: first call immediate, then one per 200ms
    assert!(
        elapsed >= Duration::from_millis(380),
        "3 calls at 5/s should take at least ~400ms, took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_primary_hits_bypass_the_limiter() {
    let limiter = SharedRateLimiter::per_second("dab", 1.0).unwrap();
    let primary = StubCatalog::new("qobuz", |query| {
        let title = query.trim_start_matches("artist ").to_string();
        Ok(vec![SearchCandidate::new(format!("q-{}", title), title, "artist")])
    });
    let harness = TestMatcher::with_limiter(primary, echo_secondary(), limiter).await;

    let start = Instant::now();
    let cancel = CancellationToken::new();
    for track in distinct_tracks(5) {
        let result = harness.resolver.resolve(&track, MatchingMode::Strict, &cancel).await;
        assert!(result.is_found());
    }

    assert!(start.elapsed() < Duration::from_millis(500));
    assert_eq!(harness.secondary.calls(), 0);
}

#[tokio::test]
async fn test_cancel_interrupts_limiter_wait() {
    let limiter = SharedRateLimiter::per_second("dab", 0.2).unwrap(); // 5s period
    let harness = TestMatcher::with_limiter(StubCatalog::empty("qobuz"), echo_secondary(), limiter).await;
    let tracks = distinct_tracks(2);

    // Drain the single token
    let first = harness
        .resolver
        .resolve(&tracks[0], MatchingMode::Strict, &CancellationToken::new())
        .await;
    assert!(first.is_found());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let second = harness.resolver.resolve(&tracks[1], MatchingMode::Strict, &cancel).await;

    assert!(!second.is_found());
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(harness.secondary.calls(), 1);
}
