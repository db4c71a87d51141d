//! Tests for registry database initialization

use dbh_common::db::init::{init_database, init_memory_database, BUSY_TIMEOUT_MS};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("registry.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("registry.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_wal_mode_enabled() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("registry.db"))
        .await
        .unwrap();

    let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn test_pragmas_apply_to_every_connection() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("registry.db"))
        .await
        .unwrap();

    // Hold several connections at once so the pool has to open new ones
    let mut connections = Vec::new();
    for _ in 0..3 {
        connections.push(pool.acquire().await.unwrap());
    }

    for conn in connections.iter_mut() {
        let busy_timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        assert_eq!(busy_timeout, BUSY_TIMEOUT_MS as i64);

        // NORMAL = 1
        let synchronous: i64 = sqlx::query_scalar("PRAGMA synchronous")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        assert_eq!(synchronous, 1);
    }
}

#[tokio::test]
async fn test_registry_table_and_indexes_exist() {
    let pool = init_memory_database().await.unwrap();

    let indexes: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'track_registry' AND name LIKE 'idx_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(
        indexes,
        vec![
            "idx_track_registry_isrc".to_string(),
            "idx_track_registry_spotify_id".to_string(),
            "idx_track_registry_youtube_id".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_schema_creation_is_idempotent() {
    let pool = init_memory_database().await.unwrap();

    dbh_common::db::create_track_registry_table(&pool)
        .await
        .expect("second schema creation should be a no-op");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM track_registry")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
