//! Versioned schema migrations shared by the storage backends.
//!
//! A backend implements [`MigrationManager`] once for its database and lists
//! its [`Migration`]s in version order. Applied versions are tracked in the
//! `_chan_migrations` table.

use async_trait::async_trait;
use chan_core::error::StorageError;
use sqlx::Database;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<MigrationError> for chan_core::Error {
    fn from(err: MigrationError) -> Self {
        chan_core::Error::Storage(StorageError::Migration(err.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[async_trait]
pub trait Migration<DB: Database>: Send + Sync {
    /// Execute the migration
    async fn up<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Rollback the migration
    async fn down<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64, // unix seconds
}

#[async_trait]
pub trait MigrationManager<DB: Database>: Send + Sync {
    fn get_migration_table_name(&self) -> &str {
        "_chan_migrations"
    }

    /// Initialize migration tracking table
    async fn initialize(&self) -> Result<()>;

    /// Apply pending migrations
    async fn up(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Rollback migrations
    async fn down(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Get list of applied migrations
    async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>>;

    /// Check if specific migration was applied
    async fn is_applied(&self, version: i64) -> Result<bool>;
}
