//! Error types for dbh-matcher
//!
//! None of these escape `MatchResolver::resolve`: each is recovered where it
//! occurs (cache miss, zero results, no ISRC). They exist so adapters can
//! report what went wrong before the resolver degrades.

use thiserror::Error;

/// Matcher error type
#[derive(Debug, Error)]
pub enum MatcherError {
    /// Registry store unreachable or locked (recovered as a cache miss)
    #[error("Registry unavailable: {0}")]
    CacheUnavailable(String),

    /// Network or remote error from a catalog (recovered as zero results)
    #[error("{catalog} search failed: {reason}")]
    SearchFailed {
        catalog: &'static str,
        reason: String,
    },

    /// MusicBrainz lookup error (recovered as "no ISRC available")
    #[error("Enrichment failed: {0}")]
    EnrichmentFailed(String),

    /// Malformed ISRC (treated as absent)
    #[error("Invalid ISRC: {0:?}")]
    InvalidIsrc(String),

    /// Caller cancelled while waiting
    #[error("Operation cancelled")]
    Cancelled,

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<dbh_common::Error> for MatcherError {
    fn from(err: dbh_common::Error) -> Self {
        match err {
            dbh_common::Error::Config(msg) => MatcherError::Config(msg),
            other => MatcherError::CacheUnavailable(other.to_string()),
        }
    }
}

/// Result type for matcher operations
pub type MatcherResult<T> = Result<T, MatcherError>;
