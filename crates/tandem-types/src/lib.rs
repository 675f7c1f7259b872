//! Tandem Types - Pure type definitions
//!
//! This crate contains only plain data types with no async runtime
//! dependencies. Both the cache and the store speak in terms of [`Account`].

pub mod account;

pub use account::*;
