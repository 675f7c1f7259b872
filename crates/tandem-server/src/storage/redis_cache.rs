//! Redis cache backend

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use std::time::Duration;
use tandem_core::{CachePort, Error, Result};
use tokio::sync::OnceCell;
use tracing::info;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis-backed cache.
///
/// The connection is opened on first use and re-attempted on later calls if
/// that fails, so the server can start while Redis is still down.
pub struct RedisCache {
    client: Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisCache {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| Error::CacheUnavailable(format!("invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            conn: OnceCell::new(),
        })
    }

    /// Build a cache from an address (`host:port`), password and DB index
    pub fn with_addr(addr: &str, password: Option<&str>, db: i64) -> Result<Self> {
        Self::new(&connection_url(addr, password, db))
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                info!("Connecting to Redis");
                let conn = tokio::time::timeout(
                    CONNECT_TIMEOUT,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                .map_err(|_| Error::CacheUnavailable("Redis connection timed out".into()))?
                .map_err(|e| {
                    Error::CacheUnavailable(format!("Redis connection failed: {}", e))
                })?;
                info!("Redis connection established");
                Ok::<_, Error>(conn)
            })
            .await?;

        Ok(conn.clone())
    }
}

#[async_trait]
impl CachePort for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| Error::CacheUnavailable(format!("Redis GET failed: {}", e)))
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let ttl_ms = px_millis(ttl);

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| Error::CacheUnavailable(format!("Redis SET failed: {}", e)))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// `SET ... PX` argument: at least 1 (PX rejects 0), saturating at `u64::MAX`
fn px_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

pub fn connection_url(addr: &str, password: Option<&str>, db: i64) -> String {
    match password.filter(|p| !p.is_empty()) {
        Some(password) => format!("redis://:{}@{}/{}", password, addr, db),
        None => format!("redis://{}/{}", addr, db),
    }
}
