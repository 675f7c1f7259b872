//! Storage layer
//!
//! Cache backends: DashMap (in-memory) or Redis.
//! Store backends: SQLite (embedded) or PostgreSQL.

pub mod memory;
pub mod postgres;
pub mod redis_cache;
pub mod sqlite;

pub use memory::MemoryCache;
pub use postgres::PostgresStore;
pub use redis_cache::RedisCache;
pub use sqlite::SqliteStore;

use tandem_core::{Account, Error};

/// Map a driver error from an insert to the store error taxonomy
pub(crate) fn insert_error(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::StoreInsertFailure(db.message().to_string())
        }
        _ => Error::StoreUnavailable(e.to_string()),
    }
}

pub(crate) fn read_error(e: sqlx::Error) -> Error {
    Error::StoreUnavailable(e.to_string())
}

// Helper struct for sqlx query_as, shared by both SQL backends
#[derive(sqlx::FromRow)]
pub(crate) struct AccountRow {
    id: i64,
    name: String,
    balance: f64,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        Account::new(r.name, r.balance).with_id(r.id)
    }
}
