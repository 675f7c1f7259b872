//! Store port

use crate::Result;
use async_trait::async_trait;
use tandem_types::Account;

/// Durable backend holding account rows keyed by name
#[async_trait]
pub trait StorePort: Send + Sync {
    /// Exact-match lookup by account name
    async fn get_by_name(&self, name: &str) -> Result<Option<Account>>;

    /// Append a new row and return the surrogate id the store assigned.
    /// Never updates in place.
    async fn insert(&self, account: &Account) -> Result<i64>;

    /// Short label used in log lines
    fn name(&self) -> &'static str;
}
