//! MusicBrainz recording search
//!
//! Used only to derive an ISRC for descriptors that arrive without one.
//! Throttling is applied by the caller (`EnrichmentPivot`) through a shared
//! limiter, so several conversions never exceed the 1 req/s policy together.

use crate::error::{MatcherError, MatcherResult};
use async_trait::async_trait;
use serde::Deserialize;

const SEARCH_LIMIT: &str = "5";

/// One recording from a search, reduced to what enrichment needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingHit {
    /// Recording MBID
    pub id: String,
    /// Relevance score (0-100)
    pub score: u32,
    pub isrcs: Vec<String>,
}

/// Recording search seam
#[async_trait]
pub trait RecordingLookup: Send + Sync {
    /// Search recordings by artist and title, best match first
    async fn search_recordings(&self, artist: &str, title: &str) -> MatcherResult<Vec<RecordingHit>>;
}

#[derive(Debug, Deserialize)]
struct MBRecordingSearch {
    #[serde(default)]
    recordings: Vec<MBRecording>,
}

#[derive(Debug, Deserialize)]
struct MBRecording {
    id: String,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    isrcs: Vec<String>,
}

/// Escape a value for a quoted Lucene phrase
fn escape_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `artist:"…" AND recording:"…"`
pub fn build_recording_query(artist: &str, title: &str) -> String {
    format!(
        "artist:\"{}\" AND recording:\"{}\"",
        escape_phrase(artist.trim()),
        escape_phrase(title.trim())
    )
}

/// Decode a recording search body, keeping the API's ordering
pub fn parse_recording_search(body: &str) -> MatcherResult<Vec<RecordingHit>> {
    let search: MBRecordingSearch = serde_json::from_str(body)
        .map_err(|e| MatcherError::EnrichmentFailed(format!("Parse error: {}", e)))?;

    Ok(search
        .recordings
        .into_iter()
        .map(|r| RecordingHit {
            id: r.id,
            score: r.score.unwrap_or(0),
            isrcs: r.isrcs,
        })
        .collect())
}

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MusicBrainzClient {
    /// `http_client` must carry a descriptive User-Agent; MusicBrainz rejects
    /// anonymous clients
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RecordingLookup for MusicBrainzClient {
    async fn search_recordings(&self, artist: &str, title: &str) -> MatcherResult<Vec<RecordingHit>> {
        let url = format!("{}/recording", self.base_url);
        let query = build_recording_query(artist, title);

        tracing::debug!(query = %query, "Querying MusicBrainz recording search");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query.as_str()),
                ("fmt", "json"),
                ("limit", SEARCH_LIMIT),
            ])
            .send()
            .await
            .map_err(|e| MatcherError::EnrichmentFailed(format!("Network error: {}", e)))?;

        let status = response.status();

        if status == 503 {
            return Err(MatcherError::EnrichmentFailed(
                "Rate limit exceeded".to_string(),
            ));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MatcherError::EnrichmentFailed(format!(
                "API error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MatcherError::EnrichmentFailed(format!("Network error: {}", e)))?;

        parse_recording_search(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_escapes_quotes() {
        assert_eq!(
            build_recording_query("The Weeknd", "Blinding Lights"),
            r#"artist:"The Weeknd" AND recording:"Blinding Lights""#
        );
        assert_eq!(
            build_recording_query("A \"B\"", r"C\D"),
            r#"artist:"A \"B\"" AND recording:"C\\D""#
        );
    }

    #[test]
    fn test_parse_recording_search() {
        let body = r#"{
            "created": "2024-01-01T00:00:00.000Z",
            "count": 2,
            "offset": 0,
            "recordings": [
                {"id": "mbid-1", "score": 100, "title": "Blinding Lights", "isrcs": ["USUG11904206"]},
                {"id": "mbid-2", "score": 62, "title": "Blinding Lights (Remix)"}
            ]
        }"#;

        let hits = parse_recording_search(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].score, 100);
        assert_eq!(hits[0].isrcs, vec!["USUG11904206".to_string()]);
        assert!(hits[1].isrcs.is_empty());
    }

    #[test]
    fn test_parse_error_is_enrichment_failure() {
        assert!(matches!(
            parse_recording_search("nope"),
            Err(MatcherError::EnrichmentFailed(_))
        ));
    }
}
