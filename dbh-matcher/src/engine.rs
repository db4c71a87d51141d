//! Process-wide wiring
//!
//! Builds the shared pieces once: one HTTP client, one limiter per throttled
//! service, one registry writer. Every conversion in the process goes
//! through the same `MatchResolver`, so quotas hold across requests.

use crate::config::MatcherSettings;
use crate::db::TrackRegistry;
use crate::error::{MatcherError, MatcherResult};
use crate::services::{
    DabClient, EnrichmentPivot, MatchResolver, MusicBrainzClient, QobuzClient, RegistryWriter,
    SearchClient, SharedRateLimiter, WriterStats,
};
use std::sync::Arc;

pub struct MatcherEngine {
    resolver: MatchResolver,
    writer: RegistryWriter,
}

impl MatcherEngine {
    /// Wire the remote clients and start the registry writer
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(settings: &MatcherSettings, registry: TrackRegistry) -> MatcherResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(dbh_common::config::get_user_agent())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| MatcherError::Config(format!("HTTP client init failed: {}", e)))?;

        let qobuz = QobuzClient::new(
            http_client.clone(),
            &settings.qobuz_base_url,
            &settings.qobuz_app_id,
            &settings.qobuz_user_auth_token,
            settings.search_limit,
        );
        let dab = DabClient::new(http_client.clone(), &settings.dab_base_url, &settings.dab_token);
        let secondary_limiter =
            SharedRateLimiter::per_second("dab", settings.secondary_requests_per_second)?;
        let search = SearchClient::new(Arc::new(qobuz), Arc::new(dab), secondary_limiter);

        let writer = RegistryWriter::spawn(registry.clone(), settings.registry_queue_capacity);
        let mut resolver = MatchResolver::new(registry, search, writer.handle());

        if settings.enrichment_enabled {
            let musicbrainz = MusicBrainzClient::new(http_client, &settings.musicbrainz_base_url);
            let limiter = SharedRateLimiter::per_second(
                "musicbrainz",
                settings.enrichment_requests_per_second,
            )?;
            resolver = resolver.with_enrichment(EnrichmentPivot::new(
                Arc::new(musicbrainz),
                limiter,
                settings.enrichment_min_score,
            ));
        }

        tracing::info!(
            secondary_rps = settings.secondary_requests_per_second,
            enrichment = settings.enrichment_enabled,
            "Matcher engine ready"
        );

        Ok(Self { resolver, writer })
    }

    pub fn resolver(&self) -> &MatchResolver {
        &self.resolver
    }

    /// Drain pending registry writes and stop the writer
    pub async fn shutdown(self) -> WriterStats {
        let stats = self.writer.shutdown().await;
        tracing::info!(
            applied = stats.applied,
            failed = stats.failed,
            "Registry writer drained"
        );
        stats
    }
}
