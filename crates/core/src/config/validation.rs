//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn is_token(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_whitespace)
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL with a host
    /// - `cache_prefix` or `version` is empty or contains whitespace
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `install_concurrency` is outside 1..=16
    /// - an allowlist entry is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.origin_url()?;

        if !is_token(&self.cache_prefix) {
            return Err(invalid("cache_prefix", "must be non-empty without whitespace"));
        }
        if let Some(version) = &self.version
            && !is_token(version)
        {
            return Err(invalid("version", "must be non-empty without whitespace"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !(1..=16).contains(&self.install_concurrency) {
            return Err(invalid("install_concurrency", "must be between 1 and 16"));
        }

        if self.allowlist_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(invalid("allowlist_hosts", "entries must not be blank"));
        }

        if self.precache.is_empty() {
            tracing::warn!("precache list is empty; install will store nothing and offline start will fail");
        }

        Ok(())
    }
}
