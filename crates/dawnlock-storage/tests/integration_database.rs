//! Integration tests for the on-disk preference database
//!
//! Run with: cargo test --package dawnlock-storage --test integration_database

use std::sync::Arc;

use dawnlock_core::{AlarmConfig, AlarmTime, TagId};
use dawnlock_storage::{Database, DatabaseConfig, PreferenceStore, Preferences};
use tempfile::TempDir;
use tokio::sync::Barrier;

fn config_in(dir: &TempDir) -> DatabaseConfig {
    let path = dir.path().join("nested").join("dawnlock.db");
    DatabaseConfig::new(path.to_string_lossy().into_owned())
}

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='preferences'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 1);

    db.close().await;
}

#[tokio::test]
async fn test_ringing_marker_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let db = Database::new(config_in(&dir)).await.unwrap();
        let prefs = Preferences::new(db.preference_store());
        prefs
            .save_alarm_config(&AlarmConfig::enabled_at(AlarmTime::new(6, 30).unwrap()))
            .await
            .unwrap();
        prefs
            .register_tag(&TagId::from_bytes(vec![0x04, 0xA2, 0x2B, 0x9C]).unwrap())
            .await
            .unwrap();
        prefs.set_ringing(true).await.unwrap();
        db.close().await;
    }

    let db = Database::new(config_in(&dir)).await.unwrap();
    let prefs = Preferences::new(db.preference_store());

    assert!(prefs.is_ringing().await.unwrap());
    let config = prefs.alarm_config().await.unwrap();
    assert_eq!(config.time.map(|t| t.to_string()).as_deref(), Some("06:30"));
    assert!(config.enabled);
    assert_eq!(
        prefs.registered_tag().await.unwrap().map(|t| t.to_hex()),
        Some("04:a2:2b:9c".to_string())
    );

    db.close().await;
}

#[tokio::test]
async fn test_missing_database_without_create_fails() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir).create_if_missing(false);

    assert!(Database::new(config).await.is_err());
}

#[tokio::test]
async fn test_concurrent_writers_last_wins() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(config_in(&dir)).await.unwrap();

    const NUM_WRITERS: usize = 8;
    let barrier = Arc::new(Barrier::new(NUM_WRITERS));

    let handles: Vec<_> = (0..NUM_WRITERS)
        .map(|i| {
            let store = db.preference_store();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                store.set_int("ALARM_MINUTE", i as i64).await
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let minute = db
        .preference_store()
        .get_int("ALARM_MINUTE", -1)
        .await
        .unwrap();
    assert!((0..NUM_WRITERS as i64).contains(&minute));

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM preferences")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);

    db.close().await;
}
