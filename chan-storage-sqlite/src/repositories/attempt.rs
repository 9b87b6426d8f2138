//! SQLite implementation of the login attempt repository.

use async_trait::async_trait;
use chan_core::{
    AttemptRecord, Error, LockoutPolicy, error::StorageError,
    repositories::AttemptRepository,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// SQLite repository for login attempt records.
pub struct SqliteAttemptRepository {
    pool: SqlitePool,
}

impl SqliteAttemptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAttemptRecord {
    identifier: String,
    failure_count: i64,
    locked_until: Option<i64>,
    updated_at: i64,
}

impl TryFrom<SqliteAttemptRecord> for AttemptRecord {
    type Error = Error;

    fn try_from(row: SqliteAttemptRecord) -> Result<Self, Self::Error> {
        let locked_until = row.locked_until.map(from_timestamp).transpose()?;
        Ok(AttemptRecord {
            identifier: row.identifier,
            failure_count: u32::try_from(row.failure_count.max(0)).unwrap_or(u32::MAX),
            locked_until,
            updated_at: from_timestamp(row.updated_at)?,
        })
    }
}

/// Unix seconds, rounded up so a stored lock never ends early.
fn ceil_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp() + i64::from(dt.timestamp_subsec_nanos() > 0)
}

fn from_timestamp(ts: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| {
        Error::Storage(StorageError::Database(format!(
            "Invalid timestamp in login_attempts: {ts}"
        )))
    })
}

#[async_trait]
impl AttemptRepository for SqliteAttemptRepository {
    async fn find(&self, identifier: &str) -> Result<Option<AttemptRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteAttemptRecord>(
            r#"
            SELECT identifier, failure_count, locked_until, updated_at
            FROM login_attempts
            WHERE identifier = ?1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load login attempt record");
            StorageError::Database("Failed to load login attempt record".to_string())
        })?;

        row.map(AttemptRecord::try_from).transpose()
    }

    async fn upsert(&self, record: &AttemptRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO login_attempts (identifier, failure_count, locked_until, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(identifier) DO UPDATE SET
                failure_count = excluded.failure_count,
                locked_until = excluded.locked_until,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.identifier)
        .bind(i64::from(record.failure_count))
        .bind(record.locked_until.map(ceil_timestamp))
        .bind(record.updated_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to upsert login attempt record");
            StorageError::Database("Failed to upsert login attempt record".to_string())
        })?;

        Ok(())
    }

    async fn delete(&self, identifier: &str) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM login_attempts WHERE identifier = ?1")
            .bind(identifier)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete login attempt record");
                StorageError::Database("Failed to delete login attempt record".to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_failure(
        &self,
        identifier: &str,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<AttemptRecord, Error> {
        let lock_until = ceil_timestamp(policy.lock_until(now)?);

        // Single statement: the increment and the lock decision read the
        // same row version, so concurrent failures cannot be lost.
        let row = sqlx::query_as::<_, SqliteAttemptRecord>(
            r#"
            INSERT INTO login_attempts (identifier, failure_count, locked_until, updated_at)
            VALUES (?1, 1, CASE WHEN 1 >= ?2 THEN ?3 ELSE NULL END, ?4)
            ON CONFLICT(identifier) DO UPDATE SET
                failure_count = login_attempts.failure_count + 1,
                locked_until = CASE
                    WHEN login_attempts.failure_count + 1 >= ?2 THEN ?3
                    ELSE NULL
                END,
                updated_at = ?4
            RETURNING identifier, failure_count, locked_until, updated_at
            "#,
        )
        .bind(identifier)
        .bind(i64::from(policy.max_attempts))
        .bind(lock_until)
        .bind(now.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to record failed login attempt");
            StorageError::Database("Failed to record failed login attempt".to_string())
        })?;

        row.try_into()
    }
}
