//! Login attempt guard.
//!
//! Tracks consecutive failed sign-ins per identifier and refuses further
//! attempts for a cooldown window once a threshold is reached.
//!
//! # Behavior
//!
//! - While an identifier is locked, attempts are refused without calling the
//!   verifier.
//! - A credential rejection increments the failure count (atomically, in the
//!   store) and locks the identifier when the count reaches the threshold.
//! - A successful sign-in deletes the identifier's record.
//! - Verifier outages and store read failures are returned as errors and
//!   leave the failure count untouched.
//! - Expired locks are not swept. The failure count carries over, so one more
//!   failure after expiry locks the identifier again.
//!
//! # Example
//!
//! ```rust,ignore
//! use chan_core::services::LoginGuardService;
//!
//! let guard = LoginGuardService::new(attempts, verifier, LockoutPolicy::default());
//!
//! match guard.check_and_consume("ana@chan.mx", "hunter22").await? {
//!     LoginOutcome::Authenticated(profile) => { /* start a session */ }
//!     LoginOutcome::Rejected { attempts_remaining, .. } => { /* generic error */ }
//!     LoginOutcome::LockedOut { remaining, .. } => { /* show countdown */ }
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    Error,
    account::Profile,
    attempt::{LockoutState, LockoutStatus, ceil_seconds},
    clock::{Clock, SystemClock},
    error::{AuthError, StorageError},
    policy::LockoutPolicy,
    repositories::AttemptRepository,
    verifier::{CredentialVerifier, Verification},
};

/// Why a credential was rejected. Deliberately coarse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidCredentials,
}

/// Outcome of a guarded sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Profile),
    /// The verifier rejected the credential; the failure was counted.
    Rejected {
        reason: RejectReason,
        /// `None` when the policy does not disclose it.
        attempts_remaining: Option<u32>,
        /// Set when this failure triggered a lockout.
        locked_until: Option<DateTime<Utc>>,
    },
    /// Refused without checking the credential.
    LockedOut {
        remaining: Duration,
        locked_until: DateTime<Utc>,
    },
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated(_))
    }

    /// Collapse into a `Result`, mapping refusals onto [`AuthError`].
    pub fn into_result(self) -> Result<Profile, Error> {
        match self {
            LoginOutcome::Authenticated(profile) => Ok(profile),
            LoginOutcome::LockedOut { remaining, .. } => Err(AuthError::AccountLocked {
                retry_after_seconds: ceil_seconds(remaining),
            }
            .into()),
            // A failure that triggers the lock still reads as a plain rejection;
            // the countdown is reported from the next attempt on.
            LoginOutcome::Rejected { .. } => Err(AuthError::InvalidCredentials.into()),
        }
    }
}

/// Service deciding whether a sign-in attempt may reach the verifier.
///
/// # Thread Safety
///
/// The service is `Send + Sync` and can be shared across tasks. Failure
/// counting is atomic in the store; the lock check and the increment are
/// separate steps, so attempts racing past the check may all be verified.
pub struct LoginGuardService<R: AttemptRepository, V: CredentialVerifier> {
    repository: Arc<R>,
    verifier: Arc<V>,
    clock: Arc<dyn Clock>,
    policy: LockoutPolicy,
}

impl<R: AttemptRepository, V: CredentialVerifier> LoginGuardService<R, V> {
    /// Create a guard using the system clock.
    pub fn new(repository: Arc<R>, verifier: Arc<V>, policy: LockoutPolicy) -> Self {
        Self::with_clock(repository, verifier, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        verifier: Arc<V>,
        policy: LockoutPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            verifier,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.enabled
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Run one guarded sign-in attempt.
    ///
    /// # Errors
    ///
    /// - `Error::Storage` if the attempt record cannot be read (the verifier
    ///   is not called).
    /// - `Error::Verifier` if the verifier is unreachable (nothing counted).
    /// - `StorageError::Bookkeeping` if the outcome was decided but the
    ///   counter update did not persist.
    pub async fn check_and_consume(
        &self,
        identifier: &str,
        credential: &V::Credential,
    ) -> Result<LoginOutcome, Error> {
        if !self.policy.enabled {
            return Ok(match self.verifier.verify(identifier, credential).await? {
                Verification::Verified(profile) => LoginOutcome::Authenticated(profile),
                Verification::Rejected => LoginOutcome::Rejected {
                    reason: RejectReason::InvalidCredentials,
                    attempts_remaining: None,
                    locked_until: None,
                },
            });
        }

        let now = self.clock.now();
        let record = self.repository.find(identifier).await?;

        if let Some(LockoutState::LockedOut { until }) =
            record.as_ref().map(|r| r.state_at(&self.policy, now))
        {
            tracing::debug!(
                identifier,
                locked_until = %until,
                "Refusing sign-in attempt for locked identifier"
            );
            return Ok(LoginOutcome::LockedOut {
                remaining: until - now,
                locked_until: until,
            });
        }

        let verification = self
            .verifier
            .verify(identifier, credential)
            .await
            .inspect_err(|e| {
                tracing::warn!(identifier, error = %e, "Credential verifier unavailable");
            })?;

        match verification {
            Verification::Verified(profile) => {
                if record.is_some() {
                    self.repository
                        .delete(identifier)
                        .await
                        .map_err(|e| bookkeeping_error(identifier, "clear", e))?;
                }
                tracing::debug!(identifier, "Sign-in succeeded");
                Ok(LoginOutcome::Authenticated(profile))
            }
            Verification::Rejected => {
                let updated = self
                    .repository
                    .record_failure(identifier, &self.policy, self.clock.now())
                    .await
                    .map_err(|e| bookkeeping_error(identifier, "record", e))?;

                if let Some(locked_until) = updated.locked_until {
                    tracing::info!(
                        identifier,
                        failure_count = updated.failure_count,
                        %locked_until,
                        "Identifier locked after repeated failed sign-ins"
                    );
                } else {
                    tracing::debug!(
                        identifier,
                        failure_count = updated.failure_count,
                        "Recorded failed sign-in"
                    );
                }

                Ok(LoginOutcome::Rejected {
                    reason: RejectReason::InvalidCredentials,
                    attempts_remaining: self
                        .policy
                        .disclose_attempts_remaining
                        .then(|| self.policy.attempts_remaining(updated.failure_count)),
                    locked_until: updated.locked_until,
                })
            }
        }
    }

    /// Current lockout status, without touching the verifier.
    pub async fn lockout_status(&self, identifier: &str) -> Result<LockoutStatus, Error> {
        if !self.policy.enabled {
            return Ok(LockoutStatus::unlocked(identifier));
        }

        let status = match self.repository.find(identifier).await? {
            Some(record) => LockoutStatus::from_record(&record, self.clock.now()),
            None => LockoutStatus::unlocked(identifier),
        };
        Ok(status)
    }

    pub async fn is_locked(&self, identifier: &str) -> Result<bool, Error> {
        Ok(self.lockout_status(identifier).await?.is_locked)
    }

    /// Clear an identifier's record regardless of its state, e.g. after an
    /// administrator unlock or a password reset.
    ///
    /// Works on the stored record even when the policy is disabled, so locks
    /// left over from an earlier enabled policy can still be cleared.
    ///
    /// # Returns
    ///
    /// `true` if the stored record held an unexpired lock.
    pub async fn unlock(&self, identifier: &str) -> Result<bool, Error> {
        let now = self.clock.now();
        let was_locked = self
            .repository
            .find(identifier)
            .await?
            .is_some_and(|record| record.is_locked_at(now));
        self.repository.delete(identifier).await?;
        if was_locked {
            tracing::info!(identifier, "Identifier unlocked");
        }
        Ok(was_locked)
    }
}

fn bookkeeping_error(identifier: &str, action: &str, source: Error) -> Error {
    tracing::error!(
        identifier,
        action,
        error = %source,
        "Failed to persist sign-in attempt bookkeeping"
    );
    Error::Storage(StorageError::Bookkeeping(format!(
        "could not {action} attempt record: {source}"
    )))
}
