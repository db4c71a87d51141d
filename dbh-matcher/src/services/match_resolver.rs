//! Match resolver
//!
//! Resolves one `TrackDescriptor` to a destination catalog id:
//!
//! 1. Registry lookup by source id, then by ISRC
//! 2. ISRC enrichment for platforms that rarely carry one
//! 3. Exact search by ISRC, best audio quality wins
//! 4. Fuzzy search on `artist title`, scored with Jaro-Winkler
//!
//! Every fresh match is written back to the registry in the background, so
//! the next resolution of the same track is a cache hit.

use crate::db::TrackRegistry;
use crate::models::{
    Isrc, MatchResult, MatchSource, MatchingMode, RegistryEntry, RegistryKey, SearchCandidate,
    TrackDescriptor,
};
use crate::services::catalog::SearchQuery;
use crate::services::enrichment::EnrichmentPivot;
use crate::services::registry_writer::RegistryWriteHandle;
use crate::services::search_client::{select_best_quality, SearchClient};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct MatchResolver {
    registry: TrackRegistry,
    search: SearchClient,
    enrichment: Option<EnrichmentPivot>,
    writer: RegistryWriteHandle,
}

impl MatchResolver {
    pub fn new(registry: TrackRegistry, search: SearchClient, writer: RegistryWriteHandle) -> Self {
        Self {
            registry,
            search,
            enrichment: None,
            writer,
        }
    }

    /// Enable ISRC enrichment for YouTube and CSV descriptors
    pub fn with_enrichment(mut self, enrichment: EnrichmentPivot) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Resolve one descriptor
    ///
    /// Never fails: store, network and enrichment errors degrade to misses.
    /// Cancellation yields NOT_FOUND and schedules no write.
    pub async fn resolve(
        &self,
        track: &TrackDescriptor,
        mode: MatchingMode,
        cancel: &CancellationToken,
    ) -> MatchResult {
        let mut track = track.clone();

        if let Some(target_id) = self.check_cache(&track).await {
            return MatchResult::cached(track, target_id);
        }

        let mut isrc = track.valid_isrc();

        if isrc.is_none() && track.source_platform.typically_lacks_isrc() {
            if let Some(enrichment) = &self.enrichment {
                if let Some(found) = enrichment
                    .resolve_isrc(&track.artist, clean_title(&track.title), cancel)
                    .await
                {
                    track.isrc = Some(found.to_string());

                    if let Some(target_id) = self.registry.lookup(&RegistryKey::Isrc(found.clone())).await {
                        tracing::debug!(isrc = %found, target_id = %target_id, "Enriched ISRC hit registry");
                        return MatchResult::cached(track, target_id);
                    }
                    isrc = Some(found);
                }
            }
        }

        if cancel.is_cancelled() {
            return MatchResult::not_found(track);
        }

        if let Some(isrc) = isrc {
            if let Some(result) = self.exact_search(&track, isrc, cancel).await {
                return result;
            }
        }

        if cancel.is_cancelled() {
            return MatchResult::not_found(track);
        }

        self.fuzzy_search(track, mode, cancel).await
    }

    async fn check_cache(&self, track: &TrackDescriptor) -> Option<String> {
        if let Some(key) = RegistryKey::for_source(track.source_platform, &track.source_id) {
            if let Some(target_id) = self.registry.lookup(&key).await {
                return Some(target_id);
            }
        }

        let isrc = track.valid_isrc()?;
        self.registry.lookup(&RegistryKey::Isrc(isrc)).await
    }

    async fn exact_search(
        &self,
        track: &TrackDescriptor,
        isrc: Isrc,
        cancel: &CancellationToken,
    ) -> Option<MatchResult> {
        let candidates = self.search.search(&SearchQuery::Isrc(isrc), cancel).await;
        if cancel.is_cancelled() {
            return None;
        }

        let best = select_best_quality(&candidates)?.clone();
        tracing::info!(
            title = %track.title,
            artist = %track.artist,
            target_id = %best.id,
            "Exact ISRC match"
        );

        self.writer.schedule(RegistryEntry::for_track(&best.id, track));
        Some(MatchResult::matched(track.clone(), best, 1.0, MatchSource::Exact))
    }

    async fn fuzzy_search(
        &self,
        track: TrackDescriptor,
        mode: MatchingMode,
        cancel: &CancellationToken,
    ) -> MatchResult {
        let cleaned = clean_title(&track.title);
        let mut query = build_query(&track.artist, cleaned);
        if query.is_empty() {
            return MatchResult::not_found(track);
        }

        let mut candidates = self.search.search(&SearchQuery::Text(query.clone()), cancel).await;

        if candidates.is_empty() && cleaned != track.title.trim() && !cancel.is_cancelled() {
            query = build_query(&track.artist, &track.title);
            tracing::debug!(query = %query, "Retrying search with full title");
            candidates = self.search.search(&SearchQuery::Text(query.clone()), cancel).await;
        }

        if cancel.is_cancelled() {
            return MatchResult::not_found(track);
        }

        let Some((best, score)) = score_candidates(&query, &candidates, mode) else {
            tracing::info!(
                title = %track.title,
                artist = %track.artist,
                candidates = candidates.len(),
                mode = %mode,
                "No match"
            );
            return MatchResult::not_found(track);
        };

        let best = best.clone();
        tracing::info!(
            title = %track.title,
            artist = %track.artist,
            target_id = %best.id,
            score = score,
            "Fuzzy match"
        );

        self.writer.schedule(RegistryEntry::for_track(&best.id, &track));
        MatchResult::matched(track, best, score, MatchSource::Fuzzy)
    }
}

/// Title up to the first `(` or `[`, trimmed
///
/// Falls back to the whole title when nothing precedes the bracket.
pub fn clean_title(title: &str) -> &str {
    let head = title
        .find(|c: char| c == '(' || c == '[')
        .map(|idx| title[..idx].trim())
        .unwrap_or_else(|| title.trim());

    if head.is_empty() {
        title.trim()
    } else {
        head
    }
}

/// Lower-cased `artist title` search string
pub fn build_query(artist: &str, title: &str) -> String {
    format!("{} {}", artist.trim(), title.trim())
        .trim()
        .to_lowercase()
}

/// Best-scoring candidate the mode accepts, with its Jaro-Winkler score
///
/// The earliest candidate wins ties. Candidates without an id are skipped.
pub fn score_candidates<'a>(
    query: &str,
    candidates: &'a [SearchCandidate],
    mode: MatchingMode,
) -> Option<(&'a SearchCandidate, f64)> {
    let mut best: Option<(&SearchCandidate, f64)> = None;

    for candidate in candidates.iter().filter(|c| c.has_id()) {
        let score = strsim::jaro_winkler(query, &candidate.match_text());
        if !mode.accepts(score) {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("Blinding Lights (Official Video)"), "Blinding Lights");
        assert_eq!(clean_title("Song [Live] (Remix)"), "Song");
        assert_eq!(clean_title("  Plain Title  "), "Plain Title");
        assert_eq!(clean_title("(Intro)"), "(Intro)");
        assert_eq!(clean_title(""), "");
    }

    #[test]
    fn test_build_query() {
        assert_eq!(
            build_query("The Weeknd", "Blinding Lights"),
            "the weeknd blinding lights"
        );
        assert_eq!(build_query("", "Title"), "title");
        assert_eq!(build_query("  ", " "), "");
    }

    #[test]
    fn test_exact_text_scores_one() {
        let candidates = vec![SearchCandidate::new("1", "Blinding Lights", "The Weeknd")];
        let (best, score) =
            score_candidates("the weeknd blinding lights", &candidates, MatchingMode::Strict).unwrap();
        assert_eq!(best.id, "1");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_highest_score_wins_first_on_ties() {
        let candidates = vec![
            SearchCandidate::new("1", "One More Time (Radio Edit)", "Daft Punk"),
            SearchCandidate::new("2", "One More Time", "Daft Punk"),
            SearchCandidate::new("3", "One More Time", "Daft Punk"),
        ];
        let (best, score) =
            score_candidates("daft punk one more time", &candidates, MatchingMode::Lenient).unwrap();
        assert_eq!(best.id, "2");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_mode_threshold_applies() {
        let candidates = vec![SearchCandidate::new("1", "One More Time (Radio Edit)", "Daft Punk")];
        let lenient = score_candidates("daft punk one more time", &candidates, MatchingMode::Lenient);
        let (_, score) = lenient.unwrap();
        assert!(score >= 0.85 && score < 0.95, "score {}", score);

        assert!(score_candidates("daft punk one more time", &candidates, MatchingMode::Strict).is_none());
    }

    #[test]
    fn test_blank_id_candidate_never_wins() {
        let candidates = vec![
            SearchCandidate::new("", "Blinding Lights", "The Weeknd"),
            SearchCandidate::new("7", "Blinding Lights (Live)", "The Weeknd"),
        ];
        let (best, _) =
            score_candidates("the weeknd blinding lights", &candidates, MatchingMode::Lenient).unwrap();
        assert_eq!(best.id, "7");
        assert!(score_candidates("the weeknd blinding lights", &candidates[..1], MatchingMode::Lenient).is_none());
    }

    #[test]
    fn test_unrelated_candidates_rejected() {
        let candidates = vec![SearchCandidate::new("1", "Toxicity", "System of a Down")];
        assert!(score_candidates("daft punk one more time", &candidates, MatchingMode::Lenient).is_none());
    }
}
