//! Builder pattern for constructing Chan instances
//!
//! The builder checks at compile time that storage is configured before
//! [`ChanBuilder::build`] can be called.
//!
//! # Example
//!
//! ```rust,no_run
//! use chan::ChanBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build with SQLite and auto-migration
//!     let chan = ChanBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     // Or build without auto-migration and run manually
//!     let chan = ChanBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .build()
//!         .await?;
//!     chan.migrate().await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chan_core::{
    LockoutPolicy, RepositoryProvider,
    clock::{Clock, SystemClock},
};

use crate::Chan;

/// Errors that can occur when building a Chan instance.
#[derive(Debug, thiserror::Error)]
pub enum ChanBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Marker type indicating no storage has been configured yet.
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

/// A type-safe builder for constructing [`Chan`] instances.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build
pub struct ChanBuilder<Storage> {
    storage: Storage,
    lockout_policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
    apply_migrations: bool,
}

impl Default for ChanBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl ChanBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Lockout: enabled, 5 attempts, 5 minute lockout
    /// - Clock: system clock
    /// - Apply migrations: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            lockout_policy: LockoutPolicy::default(),
            clock: Arc::new(SystemClock),
            apply_migrations: false,
        }
    }

    /// Use any repository provider, e.g. [`MemoryRepositoryProvider`](crate::MemoryRepositoryProvider).
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> ChanBuilder<WithStorage<R>> {
        ChanBuilder {
            storage: WithStorage { repositories },
            lockout_policy: self.lockout_policy,
            clock: self.clock,
            apply_migrations: self.apply_migrations,
        }
    }
}

#[cfg(feature = "sqlite")]
impl ChanBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://path/to/chan.db")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<ChanBuilder<WithStorage<crate::SqliteRepositoryProvider>>, ChanBuilderError> {
        let storage = crate::SqliteStorage::connect(url)
            .await
            .map_err(|e| ChanBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(storage.into_repository_provider())))
    }

    /// Configure SQLite storage with an existing connection pool.
    pub fn with_sqlite_pool(
        self,
        pool: sqlx::SqlitePool,
    ) -> ChanBuilder<WithStorage<crate::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::SqliteRepositoryProvider::new(pool)))
    }
}

impl<R: RepositoryProvider> ChanBuilder<WithStorage<R>> {
    /// Configure the lockout policy.
    ///
    /// Default: enabled with 5 attempts and a 5 minute lockout
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use chan::{ChanBuilder, LockoutPolicy};
    /// use chrono::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let chan = ChanBuilder::new()
    ///     .with_sqlite("sqlite::memory:")
    ///     .await?
    ///     .with_lockout_policy(
    ///         LockoutPolicy::default()
    ///             .with_max_attempts(3)
    ///             .with_lockout_duration(Duration::minutes(30)),
    ///     )
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_lockout_policy(mut self, policy: LockoutPolicy) -> Self {
        self.lockout_policy = policy;
        self
    }

    /// Set the clock used to measure lockout windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set whether to automatically apply database migrations during build.
    ///
    /// Default: false
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    /// Build the Chan instance, running migrations first if requested.
    pub async fn build(self) -> Result<Chan<R>, ChanBuilderError> {
        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| ChanBuilderError::Migration(e.to_string()))?;
        }

        tracing::debug!(
            lockout_enabled = self.lockout_policy.enabled,
            max_attempts = self.lockout_policy.max_attempts,
            lockout_seconds = self.lockout_policy.lockout_duration.num_seconds(),
            "Building Chan"
        );

        Ok(Chan::from_parts(
            self.storage.repositories,
            self.lockout_policy,
            self.clock,
        ))
    }
}
