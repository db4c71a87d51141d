//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file. Everything in it has a
//! built-in default, so a missing file is not an error unless the path was
//! given explicitly.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DBH_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "DBH_ROOT_FOLDER";

/// Registry database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "registry.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for the registry database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Registry database path, relative paths resolve against the root folder
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote catalog endpoints and credentials
    #[serde(default)]
    pub catalogs: CatalogConfig,

    /// Matching and throttling parameters
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Remote catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_qobuz_base_url")]
    pub qobuz_base_url: String,

    #[serde(default = "default_dab_base_url")]
    pub dab_base_url: String,

    #[serde(default = "default_musicbrainz_base_url")]
    pub musicbrainz_base_url: String,

    /// Qobuz application id (overridden by `QOBUZ_APP_ID`)
    #[serde(default)]
    pub qobuz_app_id: Option<String>,

    /// Qobuz user auth token (overridden by `QOBUZ_USER_AUTH_TOKEN`)
    #[serde(default)]
    pub qobuz_user_auth_token: Option<String>,

    /// DAB session token (overridden by `DAB_TOKEN`)
    #[serde(default)]
    pub dab_token: Option<String>,

    /// Maximum candidates requested per primary catalog search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Total HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            qobuz_base_url: default_qobuz_base_url(),
            dab_base_url: default_dab_base_url(),
            musicbrainz_base_url: default_musicbrainz_base_url(),
            qobuz_app_id: None,
            qobuz_user_auth_token: None,
            dab_token: None,
            search_limit: default_search_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Default matching mode ("strict" or "lenient")
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Sustained rate for the secondary catalog (shared token bucket, burst 1)
    #[serde(default = "default_secondary_rate")]
    pub secondary_requests_per_second: f64,

    /// Sustained rate for MusicBrainz enrichment lookups (burst 1)
    #[serde(default = "default_enrichment_rate")]
    pub enrichment_requests_per_second: f64,

    /// Derive ISRCs for descriptors that lack one
    #[serde(default = "default_true")]
    pub enrichment_enabled: bool,

    /// MusicBrainz relevance score a top result must exceed (0-100)
    #[serde(default = "default_enrichment_min_score")]
    pub enrichment_min_score: u32,

    /// Pending registry writes before new ones are dropped
    #[serde(default = "default_registry_queue_capacity")]
    pub registry_queue_capacity: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            secondary_requests_per_second: default_secondary_rate(),
            enrichment_requests_per_second: default_enrichment_rate(),
            enrichment_enabled: true,
            enrichment_min_score: default_enrichment_min_score(),
            registry_queue_capacity: default_registry_queue_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_qobuz_base_url() -> String {
    "https://www.qobuz.com/api.json/0.2".to_string()
}

fn default_dab_base_url() -> String {
    "https://dabmusic.xyz/api".to_string()
}

fn default_musicbrainz_base_url() -> String {
    "https://musicbrainz.org/ws/2".to_string()
}

fn default_search_limit() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_mode() -> String {
    "lenient".to_string()
}

fn default_secondary_rate() -> f64 {
    1.5
}

fn default_enrichment_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_enrichment_min_score() -> u32 {
    80
}

fn default_registry_queue_capacity() -> usize {
    256
}

/// Standard User-Agent for outbound HTTP clients
///
/// MusicBrainz rejects anonymous clients, so every client sends this.
pub fn get_user_agent() -> String {
    format!(
        "DBH-Matcher/{} (https://github.com/sherlockholmesat221b/dbh-go-srv)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Load TOML configuration from an explicit path
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Locate the config file
///
/// Priority: CLI argument → `DBH_CONFIG` → `<config_dir>/dbh/config.toml`.
/// The platform default is only returned when it exists.
pub fn locate_config_file(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("dbh").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load configuration, falling back to built-in defaults when no file exists
///
/// An explicitly named file (CLI or `DBH_CONFIG`) must exist and parse.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match locate_config_file(cli_arg) {
        Some(path) => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            debug!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Root folder resolution
///
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    get_default_root_folder()
}

/// Registry database path for a resolved root folder
pub fn database_path(root_folder: &Path, toml_config: &TomlConfig) -> PathBuf {
    match &toml_config.database_path {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => root_folder.join(path),
        None => root_folder.join(DEFAULT_DATABASE_FILE),
    }
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dbh"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Resolve a credential: environment variable first, then TOML
///
/// Blank values are ignored at every tier.
pub fn resolve_credential(env_var_name: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var_name).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} set in both environment and TOML config, using environment",
            env_var_name
        );
    }

    env_value.or_else(|| toml_value.map(str::to_string))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_usage_policies() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.matching.secondary_requests_per_second, 1.5);
        assert_eq!(config.matching.enrichment_requests_per_second, 1.0);
        assert_eq!(config.matching.enrichment_min_score, 80);
        assert!(config.matching.enrichment_enabled);
        assert!(config.catalogs.musicbrainz_base_url.contains("/ws/2"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            root_folder = "/srv/dbh"

            [matching]
            mode = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/dbh")));
        assert_eq!(config.matching.mode, "strict");
        assert_eq!(config.matching.registry_queue_capacity, 256);
        assert_eq!(config.catalogs.search_limit, 5);
    }

    #[test]
    fn test_database_path_resolution() {
        let root = Path::new("/srv/dbh");
        let mut config = TomlConfig::default();
        assert_eq!(database_path(root, &config), root.join("registry.db"));

        config.database_path = Some(PathBuf::from("cache/reg.db"));
        assert_eq!(database_path(root, &config), root.join("cache/reg.db"));

        config.database_path = Some(PathBuf::from("/var/lib/reg.db"));
        assert_eq!(database_path(root, &config), PathBuf::from("/var/lib/reg.db"));
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_user_agent_format() {
        let ua = get_user_agent();
        assert!(ua.starts_with("DBH-Matcher/"));
        assert!(ua.contains("github.com"));
    }
}
