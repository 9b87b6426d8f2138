//! Password credential verification against stored accounts.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use password_auth::VerifyError;

use crate::{
    error::VerifierError,
    repositories::AccountRepository,
    verifier::{CredentialVerifier, Verification},
};

/// Hash checked when no account matches, so unknown emails cost the same
/// as wrong passwords.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| password_auth::generate_hash("chan-tiendas-no-such-account"));

/// [`CredentialVerifier`] checking an email/password pair against an
/// [`AccountRepository`].
pub struct PasswordVerifier<A: AccountRepository> {
    accounts: Arc<A>,
}

impl<A: AccountRepository> PasswordVerifier<A> {
    pub fn new(accounts: Arc<A>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl<A: AccountRepository> CredentialVerifier for PasswordVerifier<A> {
    type Credential = str;

    async fn verify(
        &self,
        identifier: &str,
        credential: &str,
    ) -> Result<Verification, VerifierError> {
        let account = self
            .accounts
            .find_by_email(identifier)
            .await
            .map_err(|e| VerifierError::Unavailable(e.to_string()))?;

        let hash = match &account {
            Some(account) => account.password_hash.clone(),
            None => DUMMY_HASH.clone(),
        };
        let password = credential.to_string();

        // Hashing is CPU bound; keep it off the async workers.
        let checked =
            tokio::task::spawn_blocking(move || password_auth::verify_password(password, &hash))
                .await
                .map_err(|e| VerifierError::Unavailable(e.to_string()))?;

        match (checked, account) {
            (Ok(()), Some(account)) => Ok(Verification::Verified(account.profile)),
            (Ok(()), None) | (Err(VerifyError::PasswordInvalid), _) => Ok(Verification::Rejected),
            (Err(e), _) => {
                tracing::error!(error = %e, "Stored password hash could not be parsed");
                Err(VerifierError::Unavailable(
                    "stored password hash is unreadable".to_string(),
                ))
            }
        }
    }
}
