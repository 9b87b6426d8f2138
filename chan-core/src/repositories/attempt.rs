//! Repository trait for login attempt bookkeeping.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, attempt::AttemptRecord, policy::LockoutPolicy};

/// Keyed store of [`AttemptRecord`]s, one per identifier.
///
/// # Security Considerations
///
/// - Records must be kept for identifiers with no matching account, to avoid
///   leaking which accounts exist.
/// - [`record_failure`](Self::record_failure) must be a single atomic
///   operation. Concurrent failures for the same identifier may not be lost.
/// - Errors must be returned, never swallowed: a lost write is a lost lockout.
#[async_trait]
pub trait AttemptRepository: Send + Sync + 'static {
    /// Load the record for an identifier.
    async fn find(&self, identifier: &str) -> Result<Option<AttemptRecord>, Error>;

    /// Insert or replace the record for `record.identifier`.
    async fn upsert(&self, record: &AttemptRecord) -> Result<(), Error>;

    /// Remove the record for an identifier.
    ///
    /// # Returns
    ///
    /// `true` if a record existed.
    async fn delete(&self, identifier: &str) -> Result<bool, Error>;

    /// Atomically count one more failure for an identifier.
    ///
    /// Creates the record at `failure_count = 1` if none exists. When the new
    /// count reaches `policy.max_attempts`, `locked_until` becomes
    /// [`LockoutPolicy::lock_until`]; otherwise it is cleared.
    ///
    /// # Returns
    ///
    /// The record as stored after the increment.
    async fn record_failure(
        &self,
        identifier: &str,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<AttemptRecord, Error>;
}
