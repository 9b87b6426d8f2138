//! Tests for the Chan builder pattern

use std::sync::Arc;

use chan::{ChanBuilder, ChanBuilderError, LockoutPolicy, MemoryRepositoryProvider};

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_with_sqlite() {
    let chan = ChanBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Chan");

    chan.health_check().await.expect("Health check failed");
    assert_eq!(chan.lockout_policy(), &LockoutPolicy::default());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_with_sqlite_pool() {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite");

    let chan = ChanBuilder::new()
        .with_sqlite_pool(pool)
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Chan");

    chan.health_check().await.expect("Health check failed");
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_manual_migration() {
    let chan = ChanBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .build()
        .await
        .expect("Failed to build Chan");

    // Nothing has been created yet
    assert!(chan.lockout_status("ana@chan.mx").await.is_err());

    chan.migrate().await.expect("Migration failed");
    let status = chan.lockout_status("ana@chan.mx").await.unwrap();
    assert!(!status.is_locked);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_reports_connection_failure() {
    let result = ChanBuilder::new()
        .with_sqlite("sqlite:///nonexistent-dir/chan/chan.db")
        .await;

    assert!(matches!(
        result,
        Err(ChanBuilderError::StorageConnection(_))
    ));
}

#[tokio::test]
async fn test_builder_with_memory_repositories() {
    let policy = LockoutPolicy::default().with_max_attempts(2);

    let chan = ChanBuilder::new()
        .with_repositories(Arc::new(MemoryRepositoryProvider::new()))
        .with_lockout_policy(policy.clone())
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Chan");

    assert_eq!(chan.lockout_policy(), &policy);

    chan.attempt_login("ghost@chan.mx", "whatever-pass").await.unwrap();
    chan.attempt_login("ghost@chan.mx", "whatever-pass").await.unwrap();
    assert!(chan.is_locked("ghost@chan.mx").await.unwrap());
}
