//! Error types for Tandem

use std::time::Duration;
use tandem_types::AccountError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the dual-write an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Cache,
    Store,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Cache => write!(f, "cache"),
            Backend::Store => write!(f, "store"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store insert failed: {0}")]
    StoreInsertFailure(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(#[from] AccountError),

    #[error("{backend} did not answer within {after:?}")]
    Timeout { backend: Backend, after: Duration },

    #[error("Task error: {0}")]
    Task(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// The backend this error originated from, if any
    pub fn backend(&self) -> Option<Backend> {
        match self {
            Error::CacheUnavailable(_) | Error::DecodeError(_) => Some(Backend::Cache),
            Error::StoreUnavailable(_) | Error::StoreInsertFailure(_) => Some(Backend::Store),
            Error::Timeout { backend, .. } => Some(*backend),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Task(e.to_string())
    }
}
