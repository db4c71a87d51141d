//! Primary/secondary catalog search
//!
//! The primary catalog is tried first with no engine-side throttle. Only an
//! empty or failed primary search falls through to the secondary catalog,
//! whose calls draw from the process-wide secondary limiter.

use crate::models::SearchCandidate;
use crate::services::catalog::{CatalogSearch, SearchQuery};
use crate::services::rate_limiter::SharedRateLimiter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct SearchClient {
    primary: Arc<dyn CatalogSearch>,
    secondary: Arc<dyn CatalogSearch>,
    secondary_limiter: SharedRateLimiter,
}

impl SearchClient {
    pub fn new(
        primary: Arc<dyn CatalogSearch>,
        secondary: Arc<dyn CatalogSearch>,
        secondary_limiter: SharedRateLimiter,
    ) -> Self {
        Self {
            primary,
            secondary,
            secondary_limiter,
        }
    }

    /// Search for candidates; failures and cancellation yield an empty list
    pub async fn search(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Vec<SearchCandidate> {
        if cancel.is_cancelled() {
            return Vec::new();
        }

        let text = query.as_str();

        match self.primary.search(text).await {
            Ok(candidates) if !candidates.is_empty() => return candidates,
            Ok(_) => {
                tracing::debug!(
                    catalog = self.primary.name(),
                    query = %text,
                    "Primary search empty, falling back"
                );
            }
            Err(e) => {
                tracing::warn!(
                    catalog = self.primary.name(),
                    query = %text,
                    error = %e,
                    "Primary search failed, falling back"
                );
            }
        }

        if self.secondary_limiter.acquire(cancel).await.is_err() {
            return Vec::new();
        }

        match self.secondary.search(text).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(
                    catalog = self.secondary.name(),
                    query = %text,
                    error = %e,
                    "Secondary search failed"
                );
                Vec::new()
            }
        }
    }
}

/// Highest sampling rate, then highest bit depth; the earliest wins full ties
///
/// Candidates without an id are never selected.
pub fn select_best_quality(candidates: &[SearchCandidate]) -> Option<&SearchCandidate> {
    let mut iter = candidates.iter().filter(|c| c.has_id());
    let mut best = iter.next()?;

    for candidate in iter {
        let q = &candidate.audio_quality;
        let b = &best.audio_quality;
        if q.sampling_rate > b.sampling_rate
            || (q.sampling_rate == b.sampling_rate && q.bit_depth > b.bit_depth)
        {
            best = candidate;
        }
    }

    Some(best)
}
