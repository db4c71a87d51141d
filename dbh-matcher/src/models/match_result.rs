//! Resolution outcome returned to the caller

use crate::models::{SearchCandidate, TrackDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Similarity a fuzzy candidate needs in strict mode
pub const STRICT_THRESHOLD: f64 = 0.95;

/// Similarity a fuzzy candidate needs in lenient mode
pub const LENIENT_THRESHOLD: f64 = 0.85;

/// Caller-selected fuzzy acceptance policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingMode {
    Strict,
    #[default]
    Lenient,
}

impl MatchingMode {
    /// Parse a caller-supplied mode; anything but "strict" is lenient
    pub fn from_request(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("strict") {
            MatchingMode::Strict
        } else {
            MatchingMode::Lenient
        }
    }

    pub fn threshold(&self) -> f64 {
        match self {
            MatchingMode::Strict => STRICT_THRESHOLD,
            MatchingMode::Lenient => LENIENT_THRESHOLD,
        }
    }

    pub fn accepts(&self, score: f64) -> bool {
        score >= self.threshold()
    }
}

impl fmt::Display for MatchingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchingMode::Strict => f.write_str("strict"),
            MatchingMode::Lenient => f.write_str("lenient"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Found,
    NotFound,
}

/// Which resolution step produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    /// Registry hit, no network search
    Cache,
    /// ISRC search
    Exact,
    /// Scored artist/title search
    Fuzzy,
    None,
}

/// Per-track resolution outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The descriptor, possibly enriched with a discovered ISRC
    pub track: TrackDescriptor,
    pub status: MatchStatus,
    /// Present iff `status` is `Found`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub confidence: f64,
    /// Winning candidate, only for fresh (non-cached) matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<SearchCandidate>,
    pub source: MatchSource,
}

impl MatchResult {
    /// Registry hit: a stored mapping, verified by definition
    pub fn cached(track: TrackDescriptor, target_id: String) -> Self {
        Self {
            track,
            status: MatchStatus::Found,
            target_id: Some(target_id),
            confidence: 1.0,
            candidate: None,
            source: MatchSource::Cache,
        }
    }

    pub fn matched(
        track: TrackDescriptor,
        candidate: SearchCandidate,
        confidence: f64,
        source: MatchSource,
    ) -> Self {
        Self {
            track,
            status: MatchStatus::Found,
            target_id: Some(candidate.id.clone()),
            confidence: confidence.clamp(0.0, 1.0),
            candidate: Some(candidate),
            source,
        }
    }

    pub fn not_found(track: TrackDescriptor) -> Self {
        Self {
            track,
            status: MatchStatus::NotFound,
            target_id: None,
            confidence: 0.0,
            candidate: None,
            source: MatchSource::None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == MatchStatus::Found
    }
}
