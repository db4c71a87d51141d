//! DAB catalog adapter (secondary search)
//!
//! DAB is the destination catalog, but its search endpoint is throttled, so
//! it only runs when Qobuz comes back empty. Throttling lives in the search
//! client, not here.

use crate::error::{MatcherError, MatcherResult};
use crate::models::SearchCandidate;
use crate::services::catalog::CatalogSearch;
use async_trait::async_trait;
use serde::Deserialize;

const CATALOG: &str = "dab";

#[derive(Debug, Deserialize)]
struct DabSearchResponse {
    #[serde(default)]
    tracks: Vec<DabTrack>,
}

/// DAB ids come back as numbers or strings depending on the endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DabId {
    Number(u64),
    Text(String),
}

impl DabId {
    fn into_string(self) -> String {
        match self {
            DabId::Number(n) => n.to_string(),
            DabId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DabTrack {
    id: DabId,
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album_title: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    audio_quality: Option<DabAudioQuality>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DabAudioQuality {
    #[serde(default)]
    maximum_sample_rate: f64,
    #[serde(default)]
    maximum_bit_depth: u32,
    #[serde(default)]
    is_hi_res: bool,
}

impl From<DabTrack> for SearchCandidate {
    fn from(track: DabTrack) -> Self {
        let mut candidate = SearchCandidate::new(track.id.into_string(), track.title, track.artist);
        candidate.album = track.album_title.filter(|a| !a.is_empty());
        candidate.duration_secs = track.duration;

        if let Some(quality) = track.audio_quality {
            candidate = candidate.with_quality(quality.maximum_sample_rate, quality.maximum_bit_depth);
            candidate.audio_quality.is_hi_res = quality.is_hi_res;
        }

        candidate
    }
}

/// Decode a DAB `search` body
pub fn parse_search_response(body: &str) -> MatcherResult<Vec<SearchCandidate>> {
    let response: DabSearchResponse =
        serde_json::from_str(body).map_err(|e| MatcherError::SearchFailed {
            catalog: CATALOG,
            reason: format!("Parse error: {}", e),
        })?;

    Ok(response.tracks.into_iter().map(SearchCandidate::from).collect())
}

/// DAB API client
pub struct DabClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DabClient {
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn failure(reason: impl Into<String>) -> MatcherError {
        MatcherError::SearchFailed {
            catalog: CATALOG,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CatalogSearch for DabClient {
    fn name(&self) -> &'static str {
        CATALOG
    }

    async fn search(&self, query: &str) -> MatcherResult<Vec<SearchCandidate>> {
        let url = format!("{}/search", self.base_url);

        tracing::debug!(query = %query, "Querying DAB search");

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query), ("type", "track")])
            .bearer_auth(&self.token)
            .header(reqwest::header::COOKIE, format!("session={}", self.token))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Self::failure(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::failure(format!(
                "API error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::failure(format!("Network error: {}", e)))?;

        let candidates = parse_search_response(&body)?;
        tracing::debug!(query = %query, hits = candidates.len(), "DAB search complete");
        Ok(candidates)
    }
}
