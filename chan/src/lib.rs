//! # Chan
//!
//! Sign-in for the CHAN Tiendas back office, with per-account lockout after
//! repeated failed attempts.
//!
//! A [`Chan`] instance wires a storage backend, the bundled password
//! verifier and the login attempt guard together. Every identifier that
//! reaches the guard is trimmed and lowercased first, so `Ana@Chan.mx` and
//! `ana@chan.mx` share one failure counter.
//!
//! ## Storage Support
//!
//! - SQLite (feature `sqlite`, enabled by default)
//! - Any type implementing [`RepositoryProvider`], e.g. the in-memory
//!   [`MemoryRepositoryProvider`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use chan::{ChanBuilder, LockoutPolicy, NewAccount, Role};
//! use chrono::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let chan = ChanBuilder::new()
//!         .with_sqlite("sqlite://chan.db")
//!         .await?
//!         .with_lockout_policy(
//!             LockoutPolicy::default()
//!                 .with_max_attempts(5)
//!                 .with_lockout_duration(Duration::minutes(5)),
//!         )
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     chan.register_account(NewAccount::new("ana@chan.mx", "s3cret-pass", Role::Administrator))
//!         .await?;
//!
//!     let profile = chan.login_with_password("ana@chan.mx", "s3cret-pass").await?;
//!     println!("Welcome, {}", profile.display_name());
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use chan_core::{
    clock::{Clock, SystemClock},
    repositories::{AccountRepositoryAdapter, AttemptRepositoryAdapter},
    services::{AccountService, PasswordVerifier},
    validation::normalize_identifier,
};

pub mod builder;

pub use builder::{ChanBuilder, ChanBuilderError, NoStorage, WithStorage};

/// Re-export core types from chan_core
pub use chan_core::{
    AccountId, Error, LockoutPolicy, LockoutStatus, LoginGuardService, LoginOutcome, ManualClock,
    NewAccount, Profile, RejectReason, RepositoryProvider, Role,
    error::{AuthError, StorageError, ValidationError, VerifierError},
    repositories::MemoryRepositoryProvider,
};

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use chan_storage_sqlite::{SqliteRepositoryProvider, SqliteStorage};

type Guard<R> = LoginGuardService<AttemptRepositoryAdapter<R>, PasswordVerifier<AccountRepositoryAdapter<R>>>;

/// Entry point for sign-in, registration and lockout administration.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Chan<R: RepositoryProvider> {
    repositories: Arc<R>,
    guard: Arc<Guard<R>>,
    account_service: Arc<AccountService<AccountRepositoryAdapter<R>>>,
}

impl<R: RepositoryProvider> Chan<R> {
    /// Create an instance with the default [`LockoutPolicy`] and the system
    /// clock.
    pub fn new(repositories: Arc<R>) -> Self {
        Self::from_parts(repositories, LockoutPolicy::default(), Arc::new(SystemClock))
    }

    pub(crate) fn from_parts(
        repositories: Arc<R>,
        policy: LockoutPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accounts = Arc::new(AccountRepositoryAdapter::new(repositories.clone()));
        let attempts = Arc::new(AttemptRepositoryAdapter::new(repositories.clone()));
        let verifier = Arc::new(PasswordVerifier::new(accounts.clone()));

        Self {
            guard: Arc::new(LoginGuardService::with_clock(
                attempts, verifier, policy, clock,
            )),
            account_service: Arc::new(AccountService::new(accounts)),
            repositories,
        }
    }

    /// Replace the lockout policy, keeping storage and clock.
    pub fn with_lockout_policy(self, policy: LockoutPolicy) -> Self {
        self.rebuild(policy, None)
    }

    /// Replace the clock used for lockout windows.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        let policy = self.guard.policy().clone();
        self.rebuild(policy, Some(clock))
    }

    fn rebuild(self, policy: LockoutPolicy, clock: Option<Arc<dyn Clock>>) -> Self {
        let clock = clock.unwrap_or_else(|| self.guard.clock());
        Self::from_parts(self.repositories, policy, clock)
    }

    pub fn lockout_policy(&self) -> &LockoutPolicy {
        self.guard.policy()
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }
}

impl<R: RepositoryProvider> Chan<R> {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidCredentials` for a wrong password or unknown
    ///   email. The two are indistinguishable.
    /// - `AuthError::AccountLocked` while the account is locked; carries the
    ///   seconds left on the lock.
    /// - `Error::Verifier` / `Error::Storage` for infrastructure failures.
    ///   Check [`Error::is_retryable`].
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<Profile, Error> {
        self.attempt_login(email, password).await?.into_result()
    }

    /// Sign in and return the full [`LoginOutcome`], including the attempts
    /// remaining before a lockout.
    pub async fn attempt_login(&self, email: &str, password: &str) -> Result<LoginOutcome, Error> {
        let identifier = normalize_identifier(email);
        self.guard.check_and_consume(&identifier, password).await
    }

    /// Register a new account.
    pub async fn register_account(&self, new_account: NewAccount) -> Result<Profile, Error> {
        self.account_service.register(new_account).await
    }

    pub async fn find_profile(&self, email: &str) -> Result<Option<Profile>, Error> {
        self.account_service.find_by_email(email).await
    }

    /// Set a new password and lift any lockout on the account.
    ///
    /// # Errors
    ///
    /// `StorageError::Bookkeeping` if the new password was saved but the
    /// attempt record could not be cleared. The reset itself stands; the
    /// account stays locked until the window ends or [`Chan::unlock`]
    /// succeeds.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<Profile, Error> {
        let profile = self
            .account_service
            .reset_password(email, new_password)
            .await?;

        if let Err(e) = self.guard.unlock(&profile.email).await {
            tracing::error!(
                email = %profile.email,
                error = %e,
                "Password changed but lockout not cleared"
            );
            return Err(Error::Storage(StorageError::Bookkeeping(format!(
                "password changed but lockout not cleared: {e}"
            ))));
        }
        Ok(profile)
    }
}

impl<R: RepositoryProvider> Chan<R> {
    pub async fn lockout_status(&self, email: &str) -> Result<LockoutStatus, Error> {
        self.guard
            .lockout_status(&normalize_identifier(email))
            .await
    }

    pub async fn is_locked(&self, email: &str) -> Result<bool, Error> {
        self.guard.is_locked(&normalize_identifier(email)).await
    }

    /// Administrator unlock. Returns whether the account was locked.
    pub async fn unlock(&self, email: &str) -> Result<bool, Error> {
        self.guard.unlock(&normalize_identifier(email)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn memory_chan(policy: LockoutPolicy) -> (Chan<MemoryRepositoryProvider>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ));
        let chan = Chan::new(Arc::new(MemoryRepositoryProvider::new()))
            .with_lockout_policy(policy)
            .with_clock(clock.clone());
        (chan, clock)
    }

    #[tokio::test]
    async fn test_identifier_is_normalized() {
        let (chan, _) = memory_chan(LockoutPolicy::default().with_max_attempts(2));
        chan.register_account(NewAccount::new("ana@chan.mx", "s3cret-pass", Role::Collaborator))
            .await
            .unwrap();

        chan.attempt_login("  ANA@chan.mx ", "wrong-pass").await.unwrap();
        chan.attempt_login("ana@CHAN.MX", "wrong-pass").await.unwrap();

        assert!(chan.is_locked("Ana@Chan.mx").await.unwrap());
        let status = chan.lockout_status("ana@chan.mx").await.unwrap();
        assert_eq!(status.identifier, "ana@chan.mx");
        assert_eq!(status.failed_attempts, 2);
    }

    #[tokio::test]
    async fn test_with_clock_keeps_policy() {
        let policy = LockoutPolicy::default().with_max_attempts(3);
        let (chan, clock) = memory_chan(policy.clone());
        assert_eq!(chan.lockout_policy(), &policy);

        for _ in 0..3 {
            chan.attempt_login("ghost@chan.mx", "nope-nope").await.unwrap();
        }
        assert!(chan.is_locked("ghost@chan.mx").await.unwrap());

        clock.advance(Duration::minutes(5));
        assert!(!chan.is_locked("ghost@chan.mx").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_password_unlocks() {
        let (chan, _) = memory_chan(LockoutPolicy::default().with_max_attempts(1));
        chan.register_account(NewAccount::new("ana@chan.mx", "s3cret-pass", Role::Administrator))
            .await
            .unwrap();

        chan.attempt_login("ana@chan.mx", "wrong-pass").await.unwrap();
        assert!(chan.is_locked("ana@chan.mx").await.unwrap());

        chan.reset_password("ANA@chan.mx", "brand-new-pass").await.unwrap();
        assert!(!chan.is_locked("ana@chan.mx").await.unwrap());

        let profile = chan
            .login_with_password("ana@chan.mx", "brand-new-pass")
            .await
            .unwrap();
        assert!(profile.is_admin());
    }
}
