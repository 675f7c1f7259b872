//! Read/write coordination between the cache and the store
//!
//! Reads are cache-aside: the cache is asked first and the store is the
//! fallback for misses, cache errors and undecodable cache values.
//!
//! Writes go to both backends at once. Each half runs on its own task with a
//! deadline, and the caller gets a [`WriteReport`] only after both halves have
//! reported. Nothing is rolled back when only one half succeeds.

use crate::codec;
use crate::config::CoordinatorConfig;
use crate::error::{Backend, Error, Result};
use crate::ports::{CachePort, StorePort};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tandem_types::Account;
use tracing::{debug, error, info, warn};

/// Where a read was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Cache,
    Store,
    /// Neither backend knows the name
    NotFound,
    /// Cache could not answer and the store failed too
    StoreUnavailable,
}

impl std::fmt::Display for ReadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadSource::Cache => write!(f, "cache"),
            ReadSource::Store => write!(f, "store"),
            ReadSource::NotFound => write!(f, "not-found"),
            ReadSource::StoreUnavailable => write!(f, "store-unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    pub account: Option<Account>,
    pub source: ReadSource,
}

impl ReadOutcome {
    fn found(account: Account, source: ReadSource) -> Self {
        Self {
            account: Some(account),
            source,
        }
    }

    fn missing(source: ReadSource) -> Self {
        Self {
            account: None,
            source,
        }
    }
}

/// Aggregate result of a dual-write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Both backends accepted the write
    Committed,
    /// Exactly one backend accepted the write
    Partial,
    Failed,
}

/// Per-backend outcome of a dual-write
#[derive(Debug)]
pub struct WriteReport {
    pub cache: Result<()>,
    /// Surrogate id assigned by the store
    pub store: Result<i64>,
}

impl WriteReport {
    pub fn status(&self) -> WriteStatus {
        match (self.cache.is_ok(), self.store.is_ok()) {
            (true, true) => WriteStatus::Committed,
            (false, false) => WriteStatus::Failed,
            _ => WriteStatus::Partial,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.status() == WriteStatus::Committed
    }

    pub fn store_id(&self) -> Option<i64> {
        self.store.as_ref().ok().copied()
    }

    /// Backend that rejected a partial write. `None` unless exactly one half
    /// failed, or when the failure was not a backend's (e.g. a panicked task).
    pub fn failed_backend(&self) -> Option<Backend> {
        match (&self.cache, &self.store) {
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => e.backend(),
            _ => None,
        }
    }
}

pub struct Coordinator {
    cache: Arc<dyn CachePort>,
    store: Arc<dyn StorePort>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        cache: Arc<dyn CachePort>,
        store: Arc<dyn StorePort>,
        config: CoordinatorConfig,
    ) -> Self {
        info!(
            cache = cache.name(),
            store = store.name(),
            ttl = ?config.cache_ttl,
            deadline = ?config.write_deadline,
            "Coordinator ready"
        );
        Self {
            cache,
            store,
            config,
        }
    }

    /// Look an account up by name. Never fails; backend trouble shows up in
    /// [`ReadOutcome::source`].
    pub async fn read(&self, name: &str) -> ReadOutcome {
        match self.cache.get(name).await {
            Ok(Some(bytes)) => match codec::decode(&bytes) {
                Ok(account) => {
                    debug!(key = name, "Key found in cache");
                    return ReadOutcome::found(account, ReadSource::Cache);
                }
                Err(e) => {
                    warn!(key = name, error = %e, "Unreadable cache value, treating as miss");
                }
            },
            Ok(None) => {
                debug!(key = name, "Key not found in cache");
            }
            Err(e) => {
                error!(
                    key = name,
                    backend = self.cache.name(),
                    error = %e,
                    "Cache read failed"
                );
            }
        }

        self.read_from_store(name).await
    }

    async fn read_from_store(&self, name: &str) -> ReadOutcome {
        debug!(key = name, "Reading from store");
        match self.store.get_by_name(name).await {
            Ok(Some(account)) => {
                if self.config.repopulate_on_read {
                    self.repopulate(&account).await;
                }
                ReadOutcome::found(account, ReadSource::Store)
            }
            Ok(None) => {
                debug!(key = name, "Key not found in store");
                ReadOutcome::missing(ReadSource::NotFound)
            }
            Err(e) => {
                error!(
                    key = name,
                    backend = self.store.name(),
                    error = %e,
                    "Store read failed"
                );
                ReadOutcome::missing(ReadSource::StoreUnavailable)
            }
        }
    }

    async fn repopulate(&self, account: &Account) {
        let cached = Account::new(account.name.clone(), account.balance);
        let result = match codec::encode(&cached) {
            Ok(bytes) => {
                self.cache
                    .put(&cached.name, bytes, self.config.cache_ttl)
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!(key = %cached.name, "Cache repopulated from store"),
            Err(e) => warn!(key = %cached.name, error = %e, "Cache repopulation failed"),
        }
    }

    /// Write an account to the cache and the store concurrently and wait for
    /// both.
    ///
    /// Returns `Err` only when the account itself is unusable; backend
    /// failures are reported per slot in the [`WriteReport`].
    pub async fn write(&self, account: Account) -> Result<WriteReport> {
        let bytes = codec::encode(&account)?;
        let deadline = self.config.write_deadline;
        let ttl = self.config.cache_ttl;
        let key = account.name.clone();

        debug!(key = %key, "Setting cache value and persisting to store");

        let cache = Arc::clone(&self.cache);
        let cache_key = key.clone();
        let cache_task = tokio::spawn(bounded(Backend::Cache, deadline, async move {
            cache.put(&cache_key, bytes, ttl).await
        }));

        let store = Arc::clone(&self.store);
        let store_task = tokio::spawn(bounded(Backend::Store, deadline, async move {
            store.insert(&account).await
        }));

        let (cache, store) = tokio::join!(cache_task, store_task);
        let report = WriteReport {
            cache: cache.unwrap_or_else(|e| Err(e.into())),
            store: store.unwrap_or_else(|e| Err(e.into())),
        };

        match report.status() {
            WriteStatus::Committed => {
                info!(key = %key, "Written successfully to cache and store");
            }
            WriteStatus::Partial => {
                warn!(
                    key = %key,
                    failed = ?report.failed_backend(),
                    cache = %slot_label(&report.cache),
                    store = %slot_label(&report.store),
                    "Partial write, backends may diverge until the cache entry expires"
                );
            }
            WriteStatus::Failed => {
                error!(
                    key = %key,
                    cache = %slot_label(&report.cache),
                    store = %slot_label(&report.store),
                    "Write failed on both backends"
                );
            }
        }

        Ok(report)
    }
}

/// Run one half of a dual-write under a deadline
async fn bounded<T>(
    backend: Backend,
    deadline: Duration,
    op: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(deadline, op).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            backend,
            after: deadline,
        }),
    }
}

fn slot_label<T>(slot: &Result<T>) -> String {
    match slot {
        Ok(_) => "ok".to_string(),
        Err(e) => e.to_string(),
    }
}
