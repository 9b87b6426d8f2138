//! SQLite storage backend for the CHAN Tiendas login guard.
//!
//! Attempt records live in the `login_attempts` table, keyed by normalized
//! identifier; accounts and roles live in `accounts` and `roles`. Timestamps
//! are stored as unix seconds.
//!
//! ```rust,no_run
//! use chan_storage_sqlite::SqliteStorage;
//! use chan_core::RepositoryProvider;
//!
//! # async fn example() -> Result<(), chan_core::Error> {
//! let storage = SqliteStorage::connect("sqlite://chan.db").await?;
//! let repositories = storage.into_repository_provider();
//! repositories.migrate().await?;
//! # Ok(())
//! # }
//! ```

pub mod migrations;
pub mod repositories;

use std::str::FromStr;

use chan_core::{Error, error::StorageError};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use repositories::{
    SqliteAccountRepository, SqliteAttemptRepository, SqliteRepositoryProvider,
};

/// A connected SQLite database.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database at `url`, creating the file if needed.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| {
                tracing::error!(error = %e, url, "Invalid SQLite connection URL");
                Error::Storage(StorageError::Connection(e.to_string()))
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url, "Failed to connect to SQLite");
                Error::Storage(StorageError::Connection(e.to_string()))
            })?;

        tracing::debug!(url, "Connected to SQLite");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn into_repository_provider(self) -> SqliteRepositoryProvider {
        SqliteRepositoryProvider::new(self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chan_core::RepositoryProvider;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let storage = SqliteStorage::connect("sqlite::memory:")
            .await
            .expect("Failed to connect");
        let provider = storage.into_repository_provider();
        provider.migrate().await.unwrap();
        provider.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let err = SqliteStorage::connect("sqlite:///nonexistent-dir/chan/chan.db")
            .await
            .err()
            .expect("Missing parent directory must be rejected");
        assert!(matches!(err, Error::Storage(StorageError::Connection(_))));
    }
}
