//! Coordinator configuration

use crate::error::{Error, Result};
use std::time::Duration;

/// Cache entry lifetime used when nothing else is configured
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// How long a single backend write may take before it counts as failed
pub const DEFAULT_WRITE_DEADLINE: Duration = Duration::from_secs(5);

/// Settings injected into [`crate::Coordinator`] at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// TTL applied to every cache write
    pub cache_ttl: Duration,
    /// Upper bound on each half of a dual-write
    pub write_deadline: Duration,
    /// Copy store hits back into the cache on a read miss
    pub repopulate_on_read: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            write_deadline: DEFAULT_WRITE_DEADLINE,
            repopulate_on_read: false,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_write_deadline(mut self, deadline: Duration) -> Self {
        self.write_deadline = deadline;
        self
    }

    pub fn with_repopulate_on_read(mut self, enabled: bool) -> Self {
        self.repopulate_on_read = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl.is_zero() {
            return Err(Error::Config("cache TTL must be greater than zero".into()));
        }
        if self.write_deadline.is_zero() {
            return Err(Error::Config(
                "write deadline must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert!(!config.repopulate_on_read);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_durations_rejected() {
        let config = CoordinatorConfig::default().with_cache_ttl(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = CoordinatorConfig::default().with_write_deadline(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
