use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    Error,
    account::{Account, AccountId},
    attempt::AttemptRecord,
    policy::LockoutPolicy,
    repositories::{AccountRepository, AttemptRepository, RepositoryProvider},
};

/// Adapter that wraps a RepositoryProvider and implements AttemptRepository
pub struct AttemptRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AttemptRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AttemptRepository for AttemptRepositoryAdapter<R> {
    async fn find(&self, identifier: &str) -> Result<Option<AttemptRecord>, Error> {
        self.provider.attempts().find(identifier).await
    }

    async fn upsert(&self, record: &AttemptRecord) -> Result<(), Error> {
        self.provider.attempts().upsert(record).await
    }

    async fn delete(&self, identifier: &str) -> Result<bool, Error> {
        self.provider.attempts().delete(identifier).await
    }

    async fn record_failure(
        &self,
        identifier: &str,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<AttemptRecord, Error> {
        self.provider
            .attempts()
            .record_failure(identifier, policy, now)
            .await
    }
}

/// Adapter that wraps a RepositoryProvider and implements AccountRepository
pub struct AccountRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AccountRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AccountRepository for AccountRepositoryAdapter<R> {
    async fn create(&self, account: &Account) -> Result<(), Error> {
        self.provider.accounts().create(account).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.provider.accounts().find_by_email(email).await
    }

    async fn set_password_hash(&self, account_id: &AccountId, hash: &str) -> Result<(), Error> {
        self.provider
            .accounts()
            .set_password_hash(account_id, hash)
            .await
    }
}
