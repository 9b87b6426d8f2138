//! Repository traits for the data access layer
//!
//! Services talk to storage only through these traits.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits give access to one repository type
//! - [`RepositoryProvider`] combines the providers with lifecycle methods

pub mod account;
pub mod adapter;
pub mod attempt;
pub mod memory;

pub use account::AccountRepository;
pub use adapter::{AccountRepositoryAdapter, AttemptRepositoryAdapter};
pub use attempt::AttemptRepository;
pub use memory::{MemoryAccountRepository, MemoryAttemptRepository, MemoryRepositoryProvider};

use async_trait::async_trait;

use crate::Error;

/// Provider trait for attempt repository access.
pub trait AttemptRepositoryProvider: Send + Sync + 'static {
    /// The attempt repository implementation type
    type AttemptRepo: AttemptRepository;

    /// Get the attempt repository
    fn attempts(&self) -> &Self::AttemptRepo;
}

/// Provider trait for account repository access.
pub trait AccountRepositoryProvider: Send + Sync + 'static {
    /// The account repository implementation type
    type AccountRepo: AccountRepository;

    /// Get the account repository
    fn accounts(&self) -> &Self::AccountRepo;
}

/// Provider trait that storage backends implement to expose all repositories.
///
/// # Example
///
/// ```rust,ignore
/// use chan_core::repositories::*;
///
/// struct MyStorage { /* ... */ }
///
/// impl AttemptRepositoryProvider for MyStorage {
///     type AttemptRepo = MyAttemptRepository;
///     fn attempts(&self) -> &Self::AttemptRepo { &self.attempts }
/// }
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: AttemptRepositoryProvider + AccountRepositoryProvider {
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
