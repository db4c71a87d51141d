//! ISRC enrichment pivot
//!
//! YouTube and CSV descriptors rarely carry an ISRC. Deriving one from
//! MusicBrainz lets the resolver take the exact-search path instead of a
//! fuzzy one, and lets registry rows keyed by ISRC serve those descriptors.

use crate::models::Isrc;
use crate::services::musicbrainz_client::{RecordingHit, RecordingLookup};
use crate::services::rate_limiter::SharedRateLimiter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Default score a top recording must exceed
pub const DEFAULT_MIN_SCORE: u32 = 80;

#[derive(Clone)]
pub struct EnrichmentPivot {
    lookup: Arc<dyn RecordingLookup>,
    limiter: SharedRateLimiter,
    min_score: u32,
}

impl EnrichmentPivot {
    pub fn new(lookup: Arc<dyn RecordingLookup>, limiter: SharedRateLimiter, min_score: u32) -> Self {
        Self {
            lookup,
            limiter,
            min_score,
        }
    }

    /// Derive an ISRC for `artist`/`title`
    ///
    /// Never fails: lookup errors, low scores, empty results and cancellation
    /// all yield `None`.
    pub async fn resolve_isrc(
        &self,
        artist: &str,
        title: &str,
        cancel: &CancellationToken,
    ) -> Option<Isrc> {
        if artist.trim().is_empty() && title.trim().is_empty() {
            return None;
        }

        self.limiter.acquire(cancel).await.ok()?;

        let hits = match self.lookup.search_recordings(artist, title).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(artist = %artist, title = %title, error = %e, "ISRC enrichment failed");
                return None;
            }
        };

        let isrc = accept_top_hit(&hits, self.min_score);
        match &isrc {
            Some(isrc) => {
                tracing::debug!(artist = %artist, title = %title, isrc = %isrc, "ISRC enriched")
            }
            None => tracing::debug!(
                artist = %artist,
                title = %title,
                hits = hits.len(),
                "No confident recording for enrichment"
            ),
        }
        isrc
    }
}

/// First valid ISRC of the top hit, if its score exceeds `min_score`
pub fn accept_top_hit(hits: &[RecordingHit], min_score: u32) -> Option<Isrc> {
    let top = hits.first()?;
    if top.score <= min_score {
        return None;
    }
    top.isrcs.iter().find_map(|raw| Isrc::parse(raw).ok())
}
