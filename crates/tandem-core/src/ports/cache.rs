//! Cache port

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Fast key/value backend holding pre-encoded account bytes.
///
/// `get` distinguishes a miss (`Ok(None)`) from a backend failure
/// (`Err(Error::CacheUnavailable)`).
#[async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value. The entry
    /// disappears on its own once `ttl` has elapsed.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Short label used in log lines
    fn name(&self) -> &'static str;
}
