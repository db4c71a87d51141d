//! Matcher settings resolved from the bootstrap configuration
//!
//! Credentials resolve environment first, then TOML. The catalogs refuse
//! anonymous requests, so a missing credential is a startup error rather
//! than a per-track failure.

use crate::error::{MatcherError, MatcherResult};
use crate::models::MatchingMode;
use dbh_common::config::{resolve_credential, TomlConfig};
use std::time::Duration;

pub const QOBUZ_APP_ID_ENV: &str = "QOBUZ_APP_ID";
pub const QOBUZ_USER_AUTH_TOKEN_ENV: &str = "QOBUZ_USER_AUTH_TOKEN";
pub const DAB_TOKEN_ENV: &str = "DAB_TOKEN";

/// Everything needed to build a `MatcherEngine`
#[derive(Debug, Clone)]
pub struct MatcherSettings {
    pub default_mode: MatchingMode,

    pub qobuz_base_url: String,
    pub qobuz_app_id: String,
    pub qobuz_user_auth_token: String,
    pub search_limit: u32,

    pub dab_base_url: String,
    pub dab_token: String,
    pub secondary_requests_per_second: f64,

    pub musicbrainz_base_url: String,
    pub enrichment_enabled: bool,
    pub enrichment_requests_per_second: f64,
    pub enrichment_min_score: u32,

    pub registry_queue_capacity: usize,
    pub request_timeout: Duration,
}

impl MatcherSettings {
    /// Resolve settings, failing if a catalog credential is missing
    pub fn resolve(config: &TomlConfig) -> MatcherResult<Self> {
        let catalogs = &config.catalogs;
        let matching = &config.matching;

        let qobuz_app_id = require(
            QOBUZ_APP_ID_ENV,
            catalogs.qobuz_app_id.as_deref(),
            "qobuz_app_id",
        )?;
        let qobuz_user_auth_token = require(
            QOBUZ_USER_AUTH_TOKEN_ENV,
            catalogs.qobuz_user_auth_token.as_deref(),
            "qobuz_user_auth_token",
        )?;
        let dab_token = require(DAB_TOKEN_ENV, catalogs.dab_token.as_deref(), "dab_token")?;

        Ok(Self {
            default_mode: MatchingMode::from_request(&matching.mode),
            qobuz_base_url: catalogs.qobuz_base_url.clone(),
            qobuz_app_id,
            qobuz_user_auth_token,
            search_limit: catalogs.search_limit,
            dab_base_url: catalogs.dab_base_url.clone(),
            dab_token,
            secondary_requests_per_second: matching.secondary_requests_per_second,
            musicbrainz_base_url: catalogs.musicbrainz_base_url.clone(),
            enrichment_enabled: matching.enrichment_enabled,
            enrichment_requests_per_second: matching.enrichment_requests_per_second,
            enrichment_min_score: matching.enrichment_min_score,
            registry_queue_capacity: matching.registry_queue_capacity,
            request_timeout: Duration::from_secs(catalogs.request_timeout_secs.max(1)),
        })
    }
}

fn require(env_var: &str, toml_value: Option<&str>, toml_key: &str) -> MatcherResult<String> {
    resolve_credential(env_var, toml_value).ok_or_else(|| {
        MatcherError::Config(format!(
            "{} not configured. Please configure using one of:\n\
             1. Environment: {}=your-value\n\
             2. TOML config: [catalogs] {} = \"your-value\"",
            toml_key, env_var, toml_key
        ))
    })
}
