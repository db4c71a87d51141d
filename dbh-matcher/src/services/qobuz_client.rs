//! Qobuz catalog adapter (primary search)
//!
//! Queries `track/search` and normalizes hits into `SearchCandidate`s.
//! Qobuz and DAB share track ids, so a Qobuz hit is directly usable as a
//! DAB target id.

use crate::error::{MatcherError, MatcherResult};
use crate::models::SearchCandidate;
use crate::services::catalog::CatalogSearch;
use async_trait::async_trait;
use serde::Deserialize;

const CATALOG: &str = "qobuz";

#[derive(Debug, Deserialize)]
struct QobuzSearchResponse {
    #[serde(default)]
    tracks: Option<QobuzTrackPage>,
}

#[derive(Debug, Deserialize)]
struct QobuzTrackPage {
    #[serde(default)]
    items: Vec<QobuzTrack>,
}

#[derive(Debug, Deserialize)]
struct QobuzTrack {
    id: u64,
    title: String,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    performer: Option<QobuzArtist>,
    #[serde(default)]
    album: Option<QobuzAlbum>,
}

#[derive(Debug, Deserialize)]
struct QobuzArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct QobuzAlbum {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<QobuzArtist>,
    #[serde(default)]
    maximum_sampling_rate: Option<f64>,
    #[serde(default)]
    maximum_bit_depth: Option<u32>,
    #[serde(default)]
    hires: Option<bool>,
}

impl From<QobuzTrack> for SearchCandidate {
    fn from(track: QobuzTrack) -> Self {
        let album = track.album;
        let artist = track
            .performer
            .map(|p| p.name)
            .or_else(|| album.as_ref().and_then(|a| a.artist.as_ref()).map(|a| a.name.clone()))
            .unwrap_or_default();

        let mut candidate = SearchCandidate::new(track.id.to_string(), track.title, artist);
        candidate.duration_secs = track.duration;

        if let Some(album) = album {
            candidate = candidate.with_quality(
                album.maximum_sampling_rate.unwrap_or(0.0),
                album.maximum_bit_depth.unwrap_or(0),
            );
            if let Some(hires) = album.hires {
                candidate.audio_quality.is_hi_res = hires;
            }
            candidate.album = album.title;
        }

        candidate
    }
}

/// Decode a `track/search` body
pub fn parse_search_response(body: &str) -> MatcherResult<Vec<SearchCandidate>> {
    let response: QobuzSearchResponse =
        serde_json::from_str(body).map_err(|e| MatcherError::SearchFailed {
            catalog: CATALOG,
            reason: format!("Parse error: {}", e),
        })?;

    Ok(response
        .tracks
        .map(|page| page.items.into_iter().map(SearchCandidate::from).collect())
        .unwrap_or_default())
}

/// Qobuz API client
pub struct QobuzClient {
    http_client: reqwest::Client,
    base_url: String,
    app_id: String,
    user_auth_token: String,
    limit: u32,
}

impl QobuzClient {
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        user_auth_token: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            user_auth_token: user_auth_token.into(),
            limit: limit.max(1),
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
impl CatalogSearch for QobuzClient {
    fn name(&self) -> &'static str {
        CATALOG
    }

    async fn search(&self, query: &str) -> MatcherResult<Vec<SearchCandidate>> {
        let url = format!("{}/track/search", self.base_url);
        let limit = self.limit.to_string();

        tracing::debug!(query = %query, "Querying Qobuz track search");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("limit", limit.as_str()),
                ("app_id", self.app_id.as_str()),
                ("user_auth_token", self.user_auth_token.as_str()),
            ])
            .header("X-App-Id", &self.app_id)
            .header("X-User-Auth-Token", &self.user_auth_token)
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
        tracing::debug!(query = %query, hits = candidates.len(), "Qobuz search complete");
        Ok(candidates)
    }
}
