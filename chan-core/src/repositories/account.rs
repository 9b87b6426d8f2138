use async_trait::async_trait;

use crate::{
    Error,
    account::{Account, AccountId},
};

/// Repository for stored accounts
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Store a new account. Fails with `AuthError::AccountExists` if the
    /// email is taken.
    async fn create(&self, account: &Account) -> Result<(), Error>;

    /// Find an account by its (normalized) email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error>;

    /// Replace an account's password hash
    async fn set_password_hash(&self, account_id: &AccountId, hash: &str) -> Result<(), Error>;
}
