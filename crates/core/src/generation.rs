//! Versioned cache generation names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of one cache generation, e.g. `historia-cantada-v20251123`.
///
/// Changing the name between deploys is what triggers a fresh install and
/// the eviction of everything the previous deploy stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(String);

impl GenerationId {
    /// Build `<prefix>-<version>`.
    pub fn new(prefix: &str, version: &str) -> Self {
        Self(format!("{}-{}", prefix.trim(), version.trim()))
    }

    /// Resolve the generation for this process.
    ///
    /// An explicit version wins; otherwise one is derived from `now` so that
    /// every deploy lands in a distinct, chronologically ordered generation.
    pub fn resolve(prefix: &str, version: Option<&str>, now: DateTime<Utc>) -> Self {
        match version {
            Some(v) => Self::new(prefix, v),
            None => Self::new(prefix, &now.format("v%Y%m%d%H%M%S").to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GenerationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
