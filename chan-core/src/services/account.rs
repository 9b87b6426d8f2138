use std::sync::Arc;

use crate::{
    Error,
    account::{Account, AccountId, NewAccount, Profile},
    error::AuthError,
    repositories::AccountRepository,
    validation::{normalize_identifier, validate_email, validate_name, validate_password},
};

/// Service for account registration and password changes
pub struct AccountService<A: AccountRepository> {
    repository: Arc<A>,
}

impl<A: AccountRepository> AccountService<A> {
    pub fn new(repository: Arc<A>) -> Self {
        Self { repository }
    }

    /// Register an account. The email is normalized before it is stored so it
    /// matches the identifier used at sign-in.
    pub async fn register(&self, new_account: NewAccount) -> Result<Profile, Error> {
        let email = normalize_identifier(&new_account.email);
        validate_email(&email)?;
        validate_password(&new_account.password)?;
        validate_name("first name", new_account.first_name.as_deref())?;
        validate_name("last name", new_account.last_name.as_deref())?;

        let mut profile =
            Profile::new(AccountId::new_random(), email).with_role(new_account.role);
        profile.first_name = new_account.first_name;
        profile.last_name = new_account.last_name;
        profile.phone = new_account.phone;

        let account = Account {
            profile,
            password_hash: hash_password(&new_account.password),
        };
        self.repository.create(&account).await?;

        tracing::info!(
            account_id = %account.profile.account_id,
            role = ?account.profile.role,
            "Registered account"
        );
        Ok(account.profile)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, Error> {
        Ok(self
            .repository
            .find_by_email(&normalize_identifier(email))
            .await?
            .map(|account| account.profile))
    }

    /// Replace the password for an account.
    ///
    /// Returns the account's profile so callers can clear its lockout.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<Profile, Error> {
        validate_password(new_password)?;

        let account = self
            .repository
            .find_by_email(&normalize_identifier(email))
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        self.repository
            .set_password_hash(&account.profile.account_id, &hash_password(new_password))
            .await?;

        tracing::info!(account_id = %account.profile.account_id, "Password reset");
        Ok(account.profile)
    }
}

fn hash_password(password: &str) -> String {
    password_auth::generate_hash(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        account::Role, error::ValidationError, repositories::MemoryAccountRepository,
    };

    fn service() -> AccountService<MemoryAccountRepository> {
        AccountService::new(Arc::new(MemoryAccountRepository::new()))
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let service = service();
        let profile = service
            .register(
                NewAccount::new(" Ana@Chan.MX ", "password123", Role::Collaborator)
                    .with_name("Ana", Some("Pérez".to_string()))
                    .with_phone("+52 55 1234 5678"),
            )
            .await
            .unwrap();

        assert_eq!(profile.email, "ana@chan.mx");
        assert_eq!(profile.display_name(), "Ana Pérez");
        assert!(profile.account_id.is_valid());

        let found = service.find_by_email("ANA@chan.mx").await.unwrap().unwrap();
        assert_eq!(found, profile);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let service = service();
        let account = NewAccount::new("ana@chan.mx", "password123", Role::Administrator);
        service.register(account.clone()).await.unwrap();

        let err = service.register(account).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccountExists)));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let service = service();

        let err = service
            .register(NewAccount::new("not-an-email", "password123", Role::Collaborator))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidEmail(_))
        ));

        let err = service
            .register(NewAccount::new("ana@chan.mx", "short", Role::Collaborator))
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[tokio::test]
    async fn test_reset_password_unknown_account() {
        let service = service();
        let err = service
            .reset_password("ghost@chan.mx", "password456")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
    }
}
