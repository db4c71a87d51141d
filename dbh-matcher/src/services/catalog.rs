//! Catalog search seam
//!
//! Each remote catalog gets an adapter implementing `CatalogSearch`; the
//! search client only ever sees normalized `SearchCandidate`s.

use crate::error::MatcherResult;
use crate::models::{Isrc, SearchCandidate};
use async_trait::async_trait;

/// What to search a catalog for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Free text, `"artist title"`
    Text(String),
    /// Exact recording code
    Isrc(Isrc),
}

impl SearchQuery {
    /// Query string sent to the catalog
    pub fn as_str(&self) -> &str {
        match self {
            SearchQuery::Text(text) => text,
            SearchQuery::Isrc(isrc) => isrc.as_str(),
        }
    }
}

/// A remote catalog that can be searched for tracks
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Catalog name for logging
    fn name(&self) -> &'static str;

    /// Search the catalog
    ///
    /// # Errors
    /// `MatcherError::SearchFailed` on network, status or decode errors
    async fn search(&self, query: &str) -> MatcherResult<Vec<SearchCandidate>>;
}
