//! Process-local repositories backed by [`DashMap`].
//!
//! Useful for single-instance deployments and tests. Nothing survives a
//! restart, so a lockout here is only as durable as the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    Error,
    account::{Account, AccountId},
    attempt::AttemptRecord,
    error::{AuthError, StorageError},
    policy::LockoutPolicy,
    repositories::{
        AccountRepository, AccountRepositoryProvider, AttemptRepository,
        AttemptRepositoryProvider, RepositoryProvider,
    },
};

/// In-memory attempt store keyed by identifier.
#[derive(Debug, Default)]
pub struct MemoryAttemptRepository {
    records: DashMap<String, AttemptRecord>,
}

impl MemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AttemptRepository for MemoryAttemptRepository {
    async fn find(&self, identifier: &str) -> Result<Option<AttemptRecord>, Error> {
        Ok(self.records.get(identifier).map(|r| r.value().clone()))
    }

    async fn upsert(&self, record: &AttemptRecord) -> Result<(), Error> {
        self.records
            .insert(record.identifier.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, identifier: &str) -> Result<bool, Error> {
        Ok(self.records.remove(identifier).is_some())
    }

    async fn record_failure(
        &self,
        identifier: &str,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<AttemptRecord, Error> {
        // The entry guard holds the shard lock for the whole read-modify-write.
        match self.records.entry(identifier.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().register_failure(policy, now)?;
                Ok(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                let mut record = AttemptRecord::new(identifier, now);
                record.register_failure(policy, now)?;
                Ok(entry.insert(record).value().clone())
            }
        }
    }
}

/// In-memory account store keyed by email.
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    accounts: DashMap<String, Account>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), Error> {
        match self.accounts.entry(account.profile.email.clone()) {
            Entry::Occupied(_) => Err(Error::Auth(AuthError::AccountExists)),
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        Ok(self.accounts.get(email).map(|a| a.value().clone()))
    }

    async fn set_password_hash(&self, account_id: &AccountId, hash: &str) -> Result<(), Error> {
        let mut account = self
            .accounts
            .iter_mut()
            .find(|a| &a.profile.account_id == account_id)
            .ok_or(Error::Storage(StorageError::NotFound))?;
        account.password_hash = hash.to_string();
        Ok(())
    }
}

/// Repository provider holding both in-memory stores.
#[derive(Debug, Default)]
pub struct MemoryRepositoryProvider {
    attempts: MemoryAttemptRepository,
    accounts: MemoryAccountRepository,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptRepositoryProvider for MemoryRepositoryProvider {
    type AttemptRepo = MemoryAttemptRepository;

    fn attempts(&self) -> &Self::AttemptRepo {
        &self.attempts
    }
}

impl AccountRepositoryProvider for MemoryRepositoryProvider {
    type AccountRepo = MemoryAccountRepository;

    fn accounts(&self) -> &Self::AccountRepo {
        &self.accounts
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Profile, Role};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn test_record_failure_creates_then_increments() {
        let repo = MemoryAttemptRepository::new();
        let policy = LockoutPolicy::default().with_max_attempts(2);

        let record = repo.record_failure("a@b.com", &policy, t0()).await.unwrap();
        assert_eq!(record.failure_count, 1);
        assert!(record.locked_until.is_none());

        let record = repo.record_failure("a@b.com", &policy, t0()).await.unwrap();
        assert_eq!(record.failure_count, 2);
        assert_eq!(record.locked_until, Some(t0() + Duration::minutes(5)));

        let stored = repo.find("a@b.com").await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_out_of_range_lock_leaves_no_record() {
        let repo = MemoryAttemptRepository::new();
        let policy = LockoutPolicy::default().with_max_attempts(1);

        let err = repo
            .record_failure("a@b.com", &policy, DateTime::<Utc>::MAX_UTC)
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(repo.find("a@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let repo = MemoryAttemptRepository::new();
        let policy = LockoutPolicy::default();
        repo.record_failure("a@b.com", &policy, t0()).await.unwrap();

        assert!(repo.delete("a@b.com").await.unwrap());
        assert!(!repo.delete("a@b.com").await.unwrap());
        assert!(repo.find("a@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_record() {
        let repo = MemoryAttemptRepository::new();
        let mut record = AttemptRecord::new("a@b.com", t0());
        record.failure_count = 3;
        repo.upsert(&record).await.unwrap();

        record.failure_count = 1;
        repo.upsert(&record).await.unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(
            repo.find("a@b.com").await.unwrap().unwrap().failure_count,
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_failures_are_not_lost() {
        let repo = Arc::new(MemoryAttemptRepository::new());
        let policy = LockoutPolicy::default().with_max_attempts(1000);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repo = Arc::clone(&repo);
                let policy = policy.clone();
                tokio::spawn(async move {
                    repo.record_failure("a@b.com", &policy, t0()).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let record = repo.find("a@b.com").await.unwrap().unwrap();
        assert_eq!(record.failure_count, 50);
    }

    #[tokio::test]
    async fn test_account_create_rejects_duplicates() {
        let repo = MemoryAccountRepository::new();
        let account = Account {
            profile: Profile::new(AccountId::new_random(), "ana@chan.mx")
                .with_role(Role::Collaborator),
            password_hash: "hash".to_string(),
        };
        repo.create(&account).await.unwrap();

        let err = repo.create(&account).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccountExists)));
    }

    #[tokio::test]
    async fn test_set_password_hash() {
        let repo = MemoryAccountRepository::new();
        let id = AccountId::new_random();
        let account = Account {
            profile: Profile::new(id.clone(), "ana@chan.mx"),
            password_hash: "old".to_string(),
        };
        repo.create(&account).await.unwrap();

        repo.set_password_hash(&id, "new").await.unwrap();
        let stored = repo.find_by_email("ana@chan.mx").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new");

        let missing = repo
            .set_password_hash(&AccountId::new_random(), "x")
            .await
            .unwrap_err();
        assert!(matches!(missing, Error::Storage(StorageError::NotFound)));
    }
}
