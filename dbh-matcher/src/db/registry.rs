//! Track registry cache
//!
//! Maps Spotify ids, YouTube ids and ISRCs to the DAB track they resolved to.
//! Lookups never fail the caller: an unavailable store is a cache miss.
//! Upserts merge into the existing row in a single statement.

use crate::error::{MatcherError, MatcherResult};
use crate::models::{RegistryEntry, RegistryKey};
use crate::utils::retry_on_lock;
use chrono::{DateTime, SecondsFormat, Utc};
use dbh_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Longest an upsert keeps retrying on lock contention
const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 2000;

/// First non-empty value wins per column; `last_updated` always refreshes.
const UPSERT_SQL: &str = r#"
    INSERT INTO track_registry (target_id, isrc, spotify_id, youtube_id, last_updated)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(target_id) DO UPDATE SET
        isrc = CASE WHEN track_registry.isrc = '' THEN excluded.isrc ELSE track_registry.isrc END,
        spotify_id = CASE WHEN track_registry.spotify_id = '' THEN excluded.spotify_id ELSE track_registry.spotify_id END,
        youtube_id = CASE WHEN track_registry.youtube_id = '' THEN excluded.youtube_id ELSE track_registry.youtube_id END,
        last_updated = excluded.last_updated
"#;

/// SQLite-backed registry cache
#[derive(Clone)]
pub struct TrackRegistry {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl TrackRegistry {
    /// Wrap an initialized pool (schema must exist)
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    /// Open or create the registry database at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = dbh_common::db::init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory registry
    pub async fn in_memory() -> Result<Self> {
        let pool = dbh_common::db::init_memory_database().await?;
        Ok(Self::new(pool))
    }

    pub fn with_max_lock_wait_ms(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Resolve a key to its target id, treating any store error as a miss
    pub async fn lookup(&self, key: &RegistryKey) -> Option<String> {
        match self.try_lookup(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    column = key.column(),
                    key = %key.value(),
                    error = %e,
                    "Registry lookup skipped"
                );
                None
            }
        }
    }

    /// Resolve a key to its target id
    ///
    /// Empty keys never match: empty columns mean "unknown". When several
    /// rows share a key, the earliest inserted row wins; merges keep a row's
    /// rowid, so the answer never changes once given.
    pub async fn try_lookup(&self, key: &RegistryKey) -> MatcherResult<Option<String>> {
        let value = key.value().trim();
        if value.is_empty() {
            return Ok(None);
        }

        // Column names come from a closed enum, never from input
        let sql = format!(
            "SELECT target_id FROM track_registry WHERE {} = ? ORDER BY rowid LIMIT 1",
            key.column()
        );

        let target_id: Option<String> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MatcherError::from(dbh_common::Error::Database(e)))?;

        if let Some(id) = &target_id {
            tracing::debug!(column = key.column(), key = %value, target_id = %id, "Registry hit");
        }

        Ok(target_id)
    }

    /// Insert a row, or merge identifiers into the existing row for `target_id`
    pub async fn upsert(&self, entry: &RegistryEntry) -> Result<()> {
        let target_id = entry.target_id.trim();
        if target_id.is_empty() {
            return Err(Error::InvalidInput(
                "Registry entry requires a target id".to_string(),
            ));
        }

        let isrc = entry.isrc.trim();
        let spotify_id = entry.spotify_id.trim();
        let youtube_id = entry.youtube_id.trim();
        // Fixed-width timestamps so the text column sorts chronologically
        let last_updated = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        retry_on_lock("registry_upsert", self.max_lock_wait_ms, || async {
            sqlx::query(UPSERT_SQL)
                .bind(target_id)
                .bind(isrc)
                .bind(spotify_id)
                .bind(youtube_id)
                .bind(&last_updated)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

            Ok(())
        })
        .await?;

        tracing::debug!(
            target_id = %target_id,
            isrc = %isrc,
            spotify_id = %spotify_id,
            youtube_id = %youtube_id,
            "Registry upsert applied"
        );

        Ok(())
    }

    /// Load the full row for a target id
    pub async fn get(&self, target_id: &str) -> Result<Option<RegistryEntry>> {
        let row = sqlx::query(
            r#"
            SELECT target_id, isrc, spotify_id, youtube_id, last_updated
            FROM track_registry
            WHERE target_id = ?
            "#,
        )
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let last_updated: String = row.get("last_updated");
            RegistryEntry {
                target_id: row.get("target_id"),
                isrc: row.get("isrc"),
                spotify_id: row.get("spotify_id"),
                youtube_id: row.get("youtube_id"),
                last_updated: DateTime::parse_from_rfc3339(&last_updated)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            }
        }))
    }

    /// Number of resolved tracks
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM track_registry")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
