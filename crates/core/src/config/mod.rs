//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::generation::GenerationId;
use crate::manifest::{DEFAULT_PRECACHE, PrecacheManifest};

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the application is served from. Requests to any other origin
    /// are cross-origin.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix of every generation name.
    ///
    /// Set via SHELLCACHE_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deploy version. When unset, one is derived from the startup clock.
    ///
    /// Set via SHELLCACHE_VERSION environment variable. All-digit values
    /// such as `20251123` are read as text.
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,

    /// Application shell paths fetched on install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Third-party host substrings the worker may proxy and cache.
    ///
    /// Set via SHELLCACHE_ALLOWLIST_HOSTS environment variable.
    #[serde(default = "default_allowlist_hosts")]
    pub allowlist_hosts: Vec<String>,

    /// User-Agent string for network requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest response body written to the cache, in bytes. Bigger
    /// responses are still served, just never stored.
    ///
    /// Set via SHELLCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum manifest fetches in flight during install.
    ///
    /// Set via SHELLCACHE_INSTALL_CONCURRENCY environment variable.
    #[serde(default = "default_install_concurrency")]
    pub install_concurrency: usize,
}

/// Accept a version written as either a string or a number.
///
/// Env and TOML providers type `20251123` as an integer.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(Option::<Version>::deserialize(deserializer)?.map(|version| match version {
        Version::Text(s) => s,
        Version::Unsigned(n) => n.to_string(),
        Version::Signed(n) => n.to_string(),
        Version::Float(n) => n.to_string(),
    }))
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_cache_prefix() -> String {
    "historia-cantada".into()
}

fn default_precache() -> Vec<String> {
    DEFAULT_PRECACHE.iter().map(|p| p.to_string()).collect()
}

fn default_allowlist_hosts() -> Vec<String> {
    ["unpkg.com", "googleapis.com", "gstatic.com", "googletagmanager.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_install_concurrency() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            db_path: default_db_path(),
            cache_prefix: default_cache_prefix(),
            version: None,
            precache: default_precache(),
            allowlist_hosts: default_allowlist_hosts(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            install_concurrency: default_install_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.origin.trim())
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(url),
            _ => Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL with a host".into() }),
        }
    }

    /// The generation this process installs and activates.
    pub fn generation(&self, now: DateTime<Utc>) -> GenerationId {
        GenerationId::resolve(&self.cache_prefix, self.version.as_deref(), now)
    }

    pub fn manifest(&self) -> PrecacheManifest {
        PrecacheManifest::new(self.precache.iter().cloned())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
