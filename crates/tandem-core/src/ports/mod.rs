//! Port traits (interfaces) for the two backends

pub mod cache;
pub mod store;

pub use cache::CachePort;
pub use store::StorePort;
