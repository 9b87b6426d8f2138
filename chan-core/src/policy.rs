//! Lockout policy configuration.

use chrono::{DateTime, Duration, Utc};

use crate::{Error, error::ValidationError};

/// Shortest lockout a policy will apply.
pub const MIN_LOCKOUT_SECONDS: i64 = 1;

/// Longest lockout a policy will apply.
pub const MAX_LOCKOUT_DAYS: i64 = 365;

/// Configuration for login attempt throttling.
///
/// # Defaults
///
/// - Enabled
/// - 5 consecutive failures before lockout
/// - 5 minute lockout
/// - Remaining attempts are disclosed on rejection
///
/// # Example
///
/// ```rust
/// use chan_core::LockoutPolicy;
/// use chrono::Duration;
///
/// let policy = LockoutPolicy::default()
///     .with_max_attempts(3)
///     .with_lockout_duration(Duration::minutes(15))
///     .with_disclose_attempts_remaining(false);
///
/// assert_eq!(policy.max_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// When false the guard forwards every attempt to the verifier and never
    /// touches the attempt store.
    pub enabled: bool,
    /// Consecutive failures that trigger a lockout. Always at least 1.
    pub max_attempts: u32,
    /// How long a lockout lasts once triggered. Applied within
    /// [`MIN_LOCKOUT_SECONDS`]..=[`MAX_LOCKOUT_DAYS`] even when set directly.
    pub lockout_duration: Duration,
    /// Whether rejections report how many attempts remain.
    pub disclose_attempts_remaining: bool,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            lockout_duration: Duration::minutes(5),
            disclose_attempts_remaining: true,
        }
    }
}

impl LockoutPolicy {
    /// A policy that never locks anything out.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the failure threshold. Zero is clamped to 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the lockout length, clamped to between one second and a year.
    pub fn with_lockout_duration(mut self, lockout_duration: Duration) -> Self {
        self.lockout_duration = clamp_lockout(lockout_duration);
        self
    }

    pub fn with_disclose_attempts_remaining(mut self, disclose: bool) -> Self {
        self.disclose_attempts_remaining = disclose;
        self
    }

    /// Attempts left before a lockout after `failures` consecutive failures.
    pub fn attempts_remaining(&self, failures: u32) -> u32 {
        self.max_attempts.saturating_sub(failures)
    }

    /// When a lockout triggered at `now` ends.
    ///
    /// # Errors
    ///
    /// `ValidationError::InvalidField` if the end falls outside the
    /// representable date range.
    pub fn lock_until(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, Error> {
        now.checked_add_signed(clamp_lockout(self.lockout_duration))
            .ok_or_else(|| {
                ValidationError::InvalidField(format!(
                    "lockout starting at {now} ends out of range"
                ))
                .into()
            })
    }
}

fn clamp_lockout(duration: Duration) -> Duration {
    duration.clamp(
        Duration::seconds(MIN_LOCKOUT_SECONDS),
        Duration::days(MAX_LOCKOUT_DAYS),
    )
}
