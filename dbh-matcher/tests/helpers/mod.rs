//! Test Helper Utilities
//!
//! Stub catalogs and a resolver harness backed by an in-memory registry

#![allow(dead_code)]

use async_trait::async_trait;
use dbh_matcher::db::TrackRegistry;
use dbh_matcher::error::{MatcherError, MatcherResult};
use dbh_matcher::models::SearchCandidate;
use dbh_matcher::services::{
    CatalogSearch, EnrichmentPivot, MatchResolver, RecordingHit, RecordingLookup, RegistryWriter,
    SearchClient, SharedRateLimiter,
};
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&str) -> MatcherResult<Vec<SearchCandidate>> + Send + Sync>;

/// Catalog stub that records every query it receives
pub struct StubCatalog {
    name: &'static str,
    responder: Responder,
    queries: Mutex<Vec<String>>,
}

impl StubCatalog {
    pub fn new<F>(name: &'static str, responder: F) -> Arc<Self>
    where
        F: Fn(&str) -> MatcherResult<Vec<SearchCandidate>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name,
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
        })
    }

    /// Always returns no results
    pub fn empty(name: &'static str) -> Arc<Self> {
        Self::new(name, |_| Ok(Vec::new()))
    }

    /// Returns `candidates` for every query
    pub fn fixed(name: &'static str, candidates: Vec<SearchCandidate>) -> Arc<Self> {
        Self::new(name, move |_| Ok(candidates.clone()))
    }

    /// Fails every query
    pub fn failing(name: &'static str) -> Arc<Self> {
        Self::new(name, move |_| {
            Err(MatcherError::SearchFailed {
                catalog: "stub",
                reason: "connection refused".to_string(),
            })
        })
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSearch for StubCatalog {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, query: &str) -> MatcherResult<Vec<SearchCandidate>> {
        self.queries.lock().unwrap().push(query.to_string());
        (self.responder)(query)
    }
}

/// MusicBrainz stub returning canned hits
pub struct StubRecordingLookup {
    hits: Option<Vec<RecordingHit>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubRecordingLookup {
    pub fn with_hits(hits: Vec<RecordingHit>) -> Arc<Self> {
        Arc::new(Self {
            hits: Some(hits),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            hits: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordingLookup for StubRecordingLookup {
    async fn search_recordings(&self, artist: &str, title: &str) -> MatcherResult<Vec<RecordingHit>> {
        self.calls
            .lock()
            .unwrap()
            .push((artist.to_string(), title.to_string()));
        self.hits
            .clone()
            .ok_or_else(|| MatcherError::EnrichmentFailed("API error 503".to_string()))
    }
}

pub fn recording(score: u32, isrc: &str) -> RecordingHit {
    RecordingHit {
        id: format!("mbid-{}", isrc),
        score,
        isrcs: vec![isrc.to_string()],
    }
}

/// Resolver wired to stubs, with handles for assertions
pub struct TestMatcher {
    pub resolver: MatchResolver,
    pub registry: TrackRegistry,
    pub writer: RegistryWriter,
    pub primary: Arc<StubCatalog>,
    pub secondary: Arc<StubCatalog>,
}

impl TestMatcher {
    pub async fn new(primary: Arc<StubCatalog>, secondary: Arc<StubCatalog>) -> Self {
        Self::with_limiter(primary, secondary, SharedRateLimiter::unlimited("dab")).await
    }

    pub async fn with_limiter(
        primary: Arc<StubCatalog>,
        secondary: Arc<StubCatalog>,
        limiter: SharedRateLimiter,
    ) -> Self {
        let registry = TrackRegistry::in_memory().await.unwrap();
        let writer = RegistryWriter::spawn(registry.clone(), 64);
        let search = SearchClient::new(primary.clone(), secondary.clone(), limiter);
        let resolver = MatchResolver::new(registry.clone(), search, writer.handle());

        Self {
            resolver,
            registry,
            writer,
            primary,
            secondary,
        }
    }

    pub fn with_enrichment(mut self, lookup: Arc<StubRecordingLookup>) -> Self {
        let pivot = EnrichmentPivot::new(lookup, SharedRateLimiter::unlimited("musicbrainz"), 80);
        self.resolver = self.resolver.with_enrichment(pivot);
        self
    }

    /// Wait until every scheduled registry write has landed
    pub async fn flush(&self) {
        self.writer.handle().flush().await;
    }

    pub fn network_calls(&self) -> usize {
        self.primary.calls() + self.secondary.calls()
    }
}
