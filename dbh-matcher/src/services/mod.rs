//! Catalog clients, rate limiting, enrichment and resolution

pub mod catalog;
pub mod dab_client;
pub mod enrichment;
pub mod match_resolver;
pub mod musicbrainz_client;
pub mod qobuz_client;
pub mod rate_limiter;
pub mod registry_writer;
pub mod search_client;

pub use catalog::{CatalogSearch, SearchQuery};
pub use dab_client::DabClient;
pub use enrichment::EnrichmentPivot;
pub use match_resolver::MatchResolver;
pub use musicbrainz_client::{MusicBrainzClient, RecordingHit, RecordingLookup};
pub use qobuz_client::QobuzClient;
pub use rate_limiter::SharedRateLimiter;
pub use registry_writer::{RegistryWriteHandle, RegistryWriter, WriterStats};
pub use search_client::{select_best_quality, SearchClient};
