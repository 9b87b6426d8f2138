//! Schema migrations for the SQLite backend.
//!
//! Each migration runs in its own transaction together with the row that
//! records it in the tracking table, so a failed step leaves no trace.

use async_trait::async_trait;
use chan_migration::{Migration, MigrationError, MigrationManager, MigrationRecord};
use sqlx::{Database, Sqlite, SqlitePool};

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run one migration step and update the tracking table in the same
    /// transaction. Steps already in the requested state are skipped.
    async fn apply(
        &self,
        migration: &dyn Migration<Sqlite>,
        direction: Direction,
    ) -> Result<(), MigrationError> {
        let version = migration.version();
        let applied = self.is_applied(version).await?;
        if applied == matches!(direction, Direction::Up) {
            return Ok(());
        }

        let table = self.get_migration_table_name();
        let mut tx = self.pool.begin().await?;
        let conn = &mut *tx as &mut <Sqlite as Database>::Connection;

        match direction {
            Direction::Up => {
                tracing::info!(version, name = migration.name(), "Applying migration");
                migration.up(conn).await?;
                sqlx::query(&format!("INSERT INTO {table} (version, name) VALUES (?1, ?2)"))
                    .bind(version)
                    .bind(migration.name())
                    .execute(&mut *tx)
                    .await?;
            }
            Direction::Down => {
                tracing::info!(version, name = migration.name(), "Rolling back migration");
                migration.down(conn).await?;
                sqlx::query(&format!("DELETE FROM {table} WHERE version = ?1"))
                    .bind(version)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Versions must be listed strictly ascending.
fn check_order(migrations: &[Box<dyn Migration<Sqlite>>]) -> Result<(), MigrationError> {
    for pair in migrations.windows(2) {
        if pair[0].version() >= pair[1].version() {
            return Err(MigrationError::Migration(format!(
                "migration {} listed after {}",
                pair[1].version(),
                pair[0].version()
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl MigrationManager<Sqlite> for SqliteMigrationManager {
    async fn initialize(&self) -> Result<(), MigrationError> {
        let table = self.get_migration_table_name();
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            )"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn up(&self, migrations: &[Box<dyn Migration<Sqlite>>]) -> Result<(), MigrationError> {
        check_order(migrations)?;
        for migration in migrations {
            self.apply(migration.as_ref(), Direction::Up).await?;
        }
        Ok(())
    }

    async fn down(&self, migrations: &[Box<dyn Migration<Sqlite>>]) -> Result<(), MigrationError> {
        check_order(migrations)?;
        for migration in migrations.iter().rev() {
            self.apply(migration.as_ref(), Direction::Down).await?;
        }
        Ok(())
    }

    async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        let table = self.get_migration_table_name();
        let records = sqlx::query_as::<_, MigrationRecord>(&format!(
            "SELECT version, name, applied_at FROM {table} ORDER BY version"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let table = self.get_migration_table_name();
        let applied = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {table} WHERE version = ?1)"
        ))
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }
}

/// All migrations for this backend, in version order.
pub fn all_migrations() -> Vec<Box<dyn Migration<Sqlite>>> {
    vec![
        Box::new(CreateRolesTable),
        Box::new(CreateAccountsTable),
        Box::new(CreateLoginAttemptsTable),
    ]
}

pub struct CreateRolesTable;

#[async_trait]
impl Migration<Sqlite> for CreateRolesTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateRolesTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                UNIQUE(name)
            );"#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO roles (name, description) VALUES
                ('admin', 'Manages products, machines and accounts'),
                ('collaborator', 'Restocks machines and scans inventory');"#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS roles")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateAccountsTable;

#[async_trait]
impl Migration<Sqlite> for CreateAccountsTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateAccountsTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                first_name TEXT,
                last_name TEXT,
                phone TEXT,
                role_id INTEGER REFERENCES roles(id),
                password_hash TEXT NOT NULL,
                created_at INTEGER DEFAULT (unixepoch()),
                updated_at INTEGER DEFAULT (unixepoch()),
                UNIQUE(email)
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS accounts")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateLoginAttemptsTable;

#[async_trait]
impl Migration<Sqlite> for CreateLoginAttemptsTable {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &str {
        "CreateLoginAttemptsTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        // No foreign key to accounts: unknown identifiers are tracked too.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS login_attempts (
                identifier TEXT PRIMARY KEY,
                failure_count INTEGER NOT NULL DEFAULT 0,
                locked_until INTEGER,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS login_attempts")
            .execute(conn)
            .await?;
        Ok(())
    }
}
