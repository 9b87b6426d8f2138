//! Failed login bookkeeping types.
//!
//! One [`AttemptRecord`] exists per identifier. It is created by the first
//! failed attempt, updated by each later failure and removed by the next
//! successful sign-in. Expired locks are never swept; they are observed the
//! next time the identifier is used.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, policy::LockoutPolicy};

/// Consecutive failure count and lock state for one identifier.
///
/// The identifier need not belong to a real account. Records are kept for
/// unknown identifiers too, so lockout behavior does not reveal which
/// accounts exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub identifier: String,
    pub failure_count: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(identifier: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            failure_count: 0,
            locked_until: None,
            updated_at: now,
        }
    }

    /// Whether the lock, if any, is still in force at `now`.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Time left on an active lock.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    /// Apply one more failure. Locks when the threshold is reached.
    ///
    /// Stores without an atomic increment primitive build on this; the
    /// result must be written back in the same critical section it was read.
    /// On error the record is left unchanged.
    pub fn register_failure(
        &mut self,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let failure_count = self.failure_count.saturating_add(1);
        let locked_until = if failure_count >= policy.max_attempts {
            Some(policy.lock_until(now)?)
        } else {
            None
        };

        self.failure_count = failure_count;
        self.locked_until = locked_until;
        self.updated_at = now;
        Ok(())
    }

    pub fn state_at(&self, policy: &LockoutPolicy, now: DateTime<Utc>) -> LockoutState {
        match self.locked_until {
            Some(until) if until > now => LockoutState::LockedOut { until },
            _ if self.failure_count == 0 => LockoutState::Clean,
            // An expired lock keeps its failure count: the next failure re-arms it.
            _ => LockoutState::Warned {
                failures: self.failure_count,
                remaining: policy.attempts_remaining(self.failure_count),
            },
        }
    }
}

/// Where an identifier sits in the lockout cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutState {
    /// No failures on record.
    Clean,
    /// Some failures, not currently locked.
    Warned { failures: u32, remaining: u32 },
    /// Attempts are refused until `until`.
    LockedOut { until: DateTime<Utc> },
}

/// Snapshot of an identifier's lockout status, for display and admin views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub identifier: String,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    /// Seconds remaining on the lock, measured when the status was taken.
    pub retry_after_seconds: Option<i64>,
}

impl LockoutStatus {
    pub fn unlocked(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            failed_attempts: 0,
            is_locked: false,
            locked_until: None,
            retry_after_seconds: None,
        }
    }

    pub fn from_record(record: &AttemptRecord, now: DateTime<Utc>) -> Self {
        let remaining = record.remaining_at(now);
        Self {
            identifier: record.identifier.clone(),
            failed_attempts: record.failure_count,
            is_locked: remaining.is_some(),
            locked_until: remaining.and(record.locked_until),
            retry_after_seconds: remaining.map(ceil_seconds),
        }
    }
}

/// Round a duration up to whole seconds so a countdown never reads zero
/// while the lock is still active.
pub(crate) fn ceil_seconds(duration: Duration) -> i64 {
    let secs = duration.num_seconds();
    if duration > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_register_failure_locks_at_threshold() {
        let policy = LockoutPolicy::default().with_max_attempts(3);
        let mut record = AttemptRecord::new("a@b.com", t0());

        record.register_failure(&policy, t0()).unwrap();
        record.register_failure(&policy, t0()).unwrap();
        assert_eq!(record.failure_count, 2);
        assert!(record.locked_until.is_none());

        record.register_failure(&policy, t0()).unwrap();
        assert_eq!(record.failure_count, 3);
        assert_eq!(record.locked_until, Some(t0() + policy.lockout_duration));
    }

    #[test]
    fn test_state_transitions() {
        let policy = LockoutPolicy::default().with_max_attempts(2);
        let mut record = AttemptRecord::new("a@b.com", t0());
        assert_eq!(record.state_at(&policy, t0()), LockoutState::Clean);

        record.register_failure(&policy, t0()).unwrap();
        assert_eq!(
            record.state_at(&policy, t0()),
            LockoutState::Warned {
                failures: 1,
                remaining: 1
            }
        );

        record.register_failure(&policy, t0()).unwrap();
        let until = t0() + policy.lockout_duration;
        assert_eq!(
            record.state_at(&policy, t0()),
            LockoutState::LockedOut { until }
        );

        // Expired lock carries the failure count over.
        let later = until + Duration::seconds(1);
        assert_eq!(
            record.state_at(&policy, later),
            LockoutState::Warned {
                failures: 2,
                remaining: 0
            }
        );
    }

    #[test]
    fn test_register_failure_overflow_leaves_record_unchanged() {
        let policy = LockoutPolicy::default().with_max_attempts(1);
        let mut record = AttemptRecord::new("a@b.com", t0());

        let err = record
            .register_failure(&policy, DateTime::<Utc>::MAX_UTC)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(record, AttemptRecord::new("a@b.com", t0()));
    }

    #[test]
    fn test_negative_duration_still_locks() {
        let mut policy = LockoutPolicy::default().with_max_attempts(1);
        policy.lockout_duration = Duration::minutes(-5);
        let mut record = AttemptRecord::new("a@b.com", t0());

        record.register_failure(&policy, t0()).unwrap();
        assert!(record.is_locked_at(t0()));
    }

    #[test]
    fn test_lock_boundary_is_exclusive() {
        let policy = LockoutPolicy::default().with_max_attempts(1);
        let mut record = AttemptRecord::new("a@b.com", t0());
        record.register_failure(&policy, t0()).unwrap();

        let until = t0() + policy.lockout_duration;
        assert!(record.is_locked_at(until - Duration::seconds(1)));
        assert!(!record.is_locked_at(until));
    }

    #[test]
    fn test_status_from_record_rounds_countdown_up() {
        let policy = LockoutPolicy::default().with_max_attempts(1);
        let mut record = AttemptRecord::new("a@b.com", t0());
        record.register_failure(&policy, t0()).unwrap();

        let now = t0() + Duration::milliseconds(1500);
        let status = LockoutStatus::from_record(&record, now);
        assert!(status.is_locked);
        assert_eq!(status.retry_after_seconds, Some(299));
        assert_eq!(status.failed_attempts, 1);
    }

    #[test]
    fn test_status_from_expired_record() {
        let policy = LockoutPolicy::default().with_max_attempts(1);
        let mut record = AttemptRecord::new("a@b.com", t0());
        record.register_failure(&policy, t0()).unwrap();

        let status = LockoutStatus::from_record(&record, t0() + Duration::hours(1));
        assert!(!status.is_locked);
        assert!(status.locked_until.is_none());
        assert!(status.retry_after_seconds.is_none());
        assert_eq!(status.failed_attempts, 1);
    }
}
