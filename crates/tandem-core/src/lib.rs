//! Tandem Core Library
//!
//! Read/write coordination between a fast cache and a durable store:
//! cache-aside reads and a concurrent dual-write that waits for both backends.

// Re-export pure types from tandem-types
pub use tandem_types::*;

pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ports;

pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, ReadOutcome, ReadSource, WriteReport, WriteStatus};
pub use error::{Backend, Error, Result};
pub use ports::{CachePort, StorePort};
