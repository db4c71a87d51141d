//! Database initialization
//!
//! Opens (or creates) the registry database in WAL mode so cache lookups are
//! never blocked by an in-flight upsert, then creates the schema idempotently.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout, set on every pooled connection
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
///
/// Journal mode, synchronous level and busy timeout are connection options,
/// so each connection the pool opens gets them, not just the first.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL allows concurrent readers with one writer
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_track_registry_table(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the registry schema
///
/// Limited to a single connection: every `:memory:` connection is its own
/// database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    create_track_registry_table(&pool).await?;

    Ok(pool)
}

/// Create the track registry table
///
/// One row per resolved destination track. Empty strings mark identifiers
/// that are not known yet.
pub async fn create_track_registry_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track_registry (
            target_id TEXT PRIMARY KEY,
            isrc TEXT NOT NULL DEFAULT '',
            spotify_id TEXT NOT NULL DEFAULT '',
            youtube_id TEXT NOT NULL DEFAULT '',
            last_updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (index, column) in [
        ("idx_track_registry_isrc", "isrc"),
        ("idx_track_registry_spotify_id", "spotify_id"),
        ("idx_track_registry_youtube_id", "youtube_id"),
    ] {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON track_registry({})",
            index, column
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    Ok(())
}
