//! Repository implementations for SQLite storage

pub mod account;
pub mod attempt;

pub use account::SqliteAccountRepository;
pub use attempt::SqliteAttemptRepository;

use async_trait::async_trait;
use chan_core::{
    Error,
    error::StorageError,
    repositories::{AccountRepositoryProvider, AttemptRepositoryProvider, RepositoryProvider},
};
use chan_migration::MigrationManager;
use sqlx::SqlitePool;

use crate::migrations::{SqliteMigrationManager, all_migrations};

/// Repository provider implementation for SQLite
///
/// Both repositories share one connection pool.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    attempts: SqliteAttemptRepository,
    accounts: SqliteAccountRepository,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            attempts: SqliteAttemptRepository::new(pool.clone()),
            accounts: SqliteAccountRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AttemptRepositoryProvider for SqliteRepositoryProvider {
    type AttemptRepo = SqliteAttemptRepository;

    fn attempts(&self) -> &Self::AttemptRepo {
        &self.attempts
    }
}

impl AccountRepositoryProvider for SqliteRepositoryProvider {
    type AccountRepo = SqliteAccountRepository;

    fn accounts(&self) -> &Self::AccountRepo {
        &self.accounts
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&all_migrations()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;
        Ok(())
    }
}
