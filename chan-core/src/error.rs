use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Verifier error: {0}")]
    Verifier(#[from] VerifierError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked, retry in {retry_after_seconds} seconds")]
    AccountLocked { retry_after_seconds: i64 },

    #[error("Account already exists")]
    AccountExists,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,

    /// A lockout counter write did not persist. The stored attempt state
    /// may no longer match what the caller was told.
    #[error("Lockout bookkeeping may be inconsistent: {0}")]
    Bookkeeping(String),
}

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Credential verifier unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::InvalidCredentials) | Error::Auth(AuthError::AccountLocked { .. })
        )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Infrastructure failures the caller may retry. None of these count
    /// toward a lockout.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Verifier(VerifierError::Unavailable(_))
                | Error::Storage(StorageError::Connection(_))
                | Error::Storage(StorageError::Database(_))
                | Error::Storage(StorageError::Bookkeeping(_))
        )
    }
}
