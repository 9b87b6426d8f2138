//! The credential verifier seam.
//!
//! The guard decides *whether* to check a credential; a [`CredentialVerifier`]
//! does the actual checking. The guard never learns why a check failed.

use async_trait::async_trait;

use crate::{account::Profile, error::VerifierError};

/// Result of a completed credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The credential matched; carries the account profile.
    Verified(Profile),
    /// The credential did not match, or the account does not exist.
    Rejected,
}

/// Checks a credential for an identifier.
///
/// Return `Err(VerifierError::Unavailable)` only for infrastructure failures
/// (network, storage, timeouts). Those are not counted toward a lockout.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Credential type, never inspected by the guard.
    type Credential: Send + Sync + ?Sized;

    async fn verify(
        &self,
        identifier: &str,
        credential: &Self::Credential,
    ) -> Result<Verification, VerifierError>;
}
