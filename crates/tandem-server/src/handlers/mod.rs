//! HTTP handlers

pub mod accounts;
pub mod health;

pub use health::health;
