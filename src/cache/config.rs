//! Cache provider configuration.
//!
//! Controls which backend the provider attempts at startup via the `[cache]`
//! settings section.

use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1_500;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Networked store URL (`redis://…`). `None` selects the in-process backend.
    pub redis_url: Option<String>,
    /// Upper bound on the single startup connection attempt.
    pub connect_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            redis_url: settings.redis_url.clone(),
            connect_timeout: settings.connect_timeout,
        }
    }
}

impl CacheConfig {
    pub fn in_process() -> Self {
        Self::default()
    }

    pub fn networked(url: impl Into<String>) -> Self {
        Self {
            redis_url: Some(url.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.connect_timeout, Duration::from_millis(1_500));
    }

    #[test]
    fn networked_keeps_default_timeout() {
        let config = CacheConfig::networked("redis://127.0.0.1:6379");
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(config.connect_timeout, Duration::from_millis(1_500));
    }
}
