//! Shared rate limiters
//!
//! Remote catalogs publish per-client quotas, so every conversion running in
//! the process must draw from the same bucket. A `SharedRateLimiter` is built
//! once at startup and cloned into each client; clones share one bucket.

use crate::error::{MatcherError, MatcherResult};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Token bucket handle (burst 1), or a no-op limiter
#[derive(Clone)]
pub struct SharedRateLimiter {
    name: &'static str,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl SharedRateLimiter {
    /// Sustained `requests_per_second` with a burst of one
    pub fn per_second(name: &'static str, requests_per_second: f64) -> MatcherResult<Self> {
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return Err(MatcherError::Config(format!(
                "{} rate must be positive, got {}",
                name, requests_per_second
            )));
        }

        let period = Duration::try_from_secs_f64(1.0 / requests_per_second).map_err(|e| {
            MatcherError::Config(format!("{} rate {} is too low: {}", name, requests_per_second, e))
        })?;
        let quota = Quota::with_period(period)
            .ok_or_else(|| {
                MatcherError::Config(format!("{} rate {} is too high", name, requests_per_second))
            })?
            .allow_burst(NonZeroU32::MIN);

        tracing::debug!(limiter = name, ?period, "Rate limiter created");

        Ok(Self {
            name,
            limiter: Some(Arc::new(RateLimiter::direct(quota))),
        })
    }

    /// Limiter that never waits
    pub fn unlimited(name: &'static str) -> Self {
        Self {
            name,
            limiter: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_unlimited(&self) -> bool {
        self.limiter.is_none()
    }

    /// Wait for a token, giving up if `cancel` fires first
    pub async fn acquire(&self, cancel: &CancellationToken) -> MatcherResult<()> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(limiter = self.name, "Rate limiter wait cancelled");
                Err(MatcherError::Cancelled)
            }
            _ = limiter.until_ready() => Ok(()),
        }
    }
}

impl std::fmt::Debug for SharedRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRateLimiter")
            .field("name", &self.name)
            .field("unlimited", &self.is_unlimited())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_rejects_non_positive_rates() {
        assert!(SharedRateLimiter::per_second("test", 0.0).is_err());
        assert!(SharedRateLimiter::per_second("test", -1.0).is_err());
        assert!(SharedRateLimiter::per_second("test", f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_rates_outside_duration_range() {
        let result = SharedRateLimiter::per_second("test", 1e-20);
        assert!(matches!(result, Err(MatcherError::Config(_))));

        // Period rounds to zero nanoseconds
        assert!(SharedRateLimiter::per_second("test", 1e12).is_err());
    }

    #[tokio::test]
    async fn test_second_acquire_waits_one_period() {
        let limiter = SharedRateLimiter::per_second("test", 4.0).unwrap(); // 250ms period
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(100), "First acquire should be immediate");

        limiter.acquire(&cancel).await.unwrap();
        assert!(
            start.elapsed() >= Duration::from_millis(200),
            "Second acquire should wait ~250ms, took {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_clones_share_one_bucket() {
        let limiter = SharedRateLimiter::per_second("test", 4.0).unwrap();
        let clone = limiter.clone();
        let cancel = CancellationToken::new();

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        clone.acquire(&cancel).await.unwrap();

        assert!(
            start.elapsed() >= Duration::from_millis(200),
            "Clone should have waited on the shared bucket, took {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_wait() {
        let limiter = SharedRateLimiter::per_second("test", 0.1).unwrap(); // 10s period
        let cancel = CancellationToken::new();
        limiter.acquire(&cancel).await.unwrap();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let result = limiter.acquire(&cancel).await;

        assert!(matches!(result, Err(MatcherError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = SharedRateLimiter::unlimited("test");
        let cancel = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..20 {
            limiter.acquire(&cancel).await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(limiter.is_unlimited());
    }
}
