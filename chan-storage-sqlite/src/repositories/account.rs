use async_trait::async_trait;
use chan_core::{
    Account, AccountId, Error, Profile, Role,
    error::{AuthError, StorageError},
    repositories::AccountRepository,
};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteAccount {
    id: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    role_name: Option<String>,
    password_hash: String,
}

impl From<SqliteAccount> for Account {
    fn from(row: SqliteAccount) -> Self {
        Account {
            profile: Profile {
                account_id: AccountId::new(&row.id),
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
                role: row.role_name.as_deref().map(Role::from_name),
            },
            password_hash: row.password_hash,
        }
    }
}

fn database_error(context: &str, e: sqlx::Error) -> Error {
    tracing::error!(error = %e, "{context}");
    Error::Storage(StorageError::Database(context.to_string()))
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), Error> {
        let profile = &account.profile;
        let now = Utc::now().timestamp();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("Failed to begin transaction", e))?;

        let role_id: Option<i64> = match &profile.role {
            Some(role) => {
                sqlx::query("INSERT OR IGNORE INTO roles (name) VALUES (?1)")
                    .bind(role.name())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| database_error("Failed to create role", e))?;

                let id: i64 = sqlx::query_scalar("SELECT id FROM roles WHERE name = ?1")
                    .bind(role.name())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| database_error("Failed to resolve role", e))?;
                Some(id)
            }
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, first_name, last_name, phone, role_id, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(profile.account_id.as_str())
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(role_id)
        .bind(&account.password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                Error::Auth(AuthError::AccountExists)
            } else {
                database_error("Failed to create account", e)
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| database_error("Failed to commit account", e))?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, SqliteAccount>(
            r#"
            SELECT a.id, a.email, a.first_name, a.last_name, a.phone,
                   r.name AS role_name, a.password_hash
            FROM accounts a
            LEFT JOIN roles r ON r.id = a.role_id
            WHERE a.email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to find account", e))?;

        Ok(row.map(Account::from))
    }

    async fn set_password_hash(&self, account_id: &AccountId, hash: &str) -> Result<(), Error> {
        let result =
            sqlx::query("UPDATE accounts SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(hash)
                .bind(Utc::now().timestamp())
                .bind(account_id.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("Failed to set password hash", e))?;

        if result.rows_affected() == 0 {
            return Err(Error::Storage(StorageError::NotFound));
        }
        Ok(())
    }
}
