//! SQLite store (embedded, no external dependencies)

use super::{insert_error, read_error, AccountRow};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use tandem_core::{Account, StorePort};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url`, e.g. `sqlite://tandem.db`
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", url);

        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid SQLite URL: {}", url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database at: {}", url))?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database. One connection that never recycles, since
    /// every new connection would see an empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Account table ready");
        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                balance REAL NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StorePort for SqliteStore {
    async fn get_by_name(&self, name: &str) -> tandem_core::Result<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, name, balance FROM accounts WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error)?;

        Ok(row.map(Account::from))
    }

    async fn insert(&self, account: &Account) -> tandem_core::Result<i64> {
        tracing::debug!("Persisting {} in database", account.name);

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (name, balance)
            VALUES (?1, ?2)
            "#,
        )
        .bind(&account.name)
        .bind(account.balance)
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(result.last_insert_rowid())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::Error;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = SqliteStore::in_memory().await.unwrap();

        let id = assert_ok!(store.insert(&Account::new("alice", 100.5)).await);
        let found = assert_ok!(store.get_by_name("alice").await);

        assert_eq!(found, Some(Account::new("alice", 100.5).with_id(id)));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = SqliteStore::in_memory().await.unwrap();

        assert_eq!(assert_ok!(store.get_by_name("nobody").await), None);
    }

    #[tokio::test]
    async fn test_ids_are_assigned_by_store() {
        let store = SqliteStore::in_memory().await.unwrap();

        let first = assert_ok!(store.insert(&Account::new("a", 1.0)).await);
        let second = assert_ok!(store.insert(&Account::new("b", 2.0)).await);

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_insert_failure() {
        let store = SqliteStore::in_memory().await.unwrap();

        assert_ok!(store.insert(&Account::new("alice", 1.0)).await);
        let err = assert_err!(store.insert(&Account::new("alice", 2.0)).await);

        assert!(matches!(err, Error::StoreInsertFailure(_)));
        // First row stays as it was
        let found = assert_ok!(store.get_by_name("alice").await).unwrap();
        assert_eq!(found.balance, 1.0);
    }

    #[tokio::test]
    async fn test_closed_pool_is_store_unavailable() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.pool.close().await;

        assert!(matches!(
            store.get_by_name("alice").await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.insert(&Account::new("alice", 1.0)).await,
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_file_database() {
        let dir = std::env::temp_dir().join(format!("tandem-sqlite-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let url = format!("sqlite://{}", dir.join("accounts.db").display());

        let store = SqliteStore::connect(&url, 2).await.unwrap();
        assert_ok!(store.insert(&Account::new("zoe", 4.0)).await);
        store.pool.close().await;

        let reopened = SqliteStore::connect(&url, 2).await.unwrap();
        assert_eq!(
            reopened.get_by_name("zoe").await.unwrap().map(|a| a.balance),
            Some(4.0)
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
