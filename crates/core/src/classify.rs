//! Request classification.
//!
//! Maps an outbound request to the retrieval strategy the router applies.
//! The function is pure and total: every (method, URL) pair lands in exactly
//! one class, first match wins:
//!
//! 1. non-GET → [`RequestClass::NonCacheable`]
//! 2. cross-origin, host on the allowlist → [`RequestClass::AllowedCrossOrigin`]
//! 3. cross-origin otherwise → [`RequestClass::BlockedCrossOrigin`]
//! 4. same-origin data path → [`RequestClass::RuntimeData`]
//! 5. same-origin otherwise → [`RequestClass::StaticAsset`]

use serde::{Deserialize, Serialize};
use std::fmt;
use url::{Origin, Url};

/// Path segment marking runtime content data.
const DATA_SEGMENT: &str = "/data/";

/// Suffix marking runtime content data.
const DATA_SUFFIX: &str = ".json";

/// Retrieval class of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Same-origin GET outside the data path: cache-first.
    StaticAsset,
    /// Same-origin GET under the data path: network-first.
    RuntimeData,
    /// Cross-origin GET to an allowlisted host: network with cache fallback.
    AllowedCrossOrigin,
    /// Cross-origin GET to any other host: left to the caller.
    BlockedCrossOrigin,
    /// Any non-GET method: passthrough.
    NonCacheable,
}

impl RequestClass {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestClass::StaticAsset => "static_asset",
            RequestClass::RuntimeData => "runtime_data",
            RequestClass::AllowedCrossOrigin => "allowed_cross_origin",
            RequestClass::BlockedCrossOrigin => "blocked_cross_origin",
            RequestClass::NonCacheable => "non_cacheable",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier bound to the application origin and cross-origin allowlist.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Origin,
    allowlist: Vec<String>,
}

impl Classifier {
    /// Build a classifier for `origin`.
    ///
    /// Allowlist entries are host substrings; they are lower-cased so the
    /// match is case-insensitive against the (already lower-case) host.
    pub fn new(origin: &Url, allowlist: &[String]) -> Self {
        Self {
            origin: origin.origin(),
            allowlist: allowlist
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn classify(&self, method: &str, url: &Url) -> RequestClass {
        if !method.trim().eq_ignore_ascii_case("GET") {
            return RequestClass::NonCacheable;
        }

        if url.origin() != self.origin {
            return if self.is_allowed_host(url) {
                RequestClass::AllowedCrossOrigin
            } else {
                RequestClass::BlockedCrossOrigin
            };
        }

        if is_data_path(url.path()) { RequestClass::RuntimeData } else { RequestClass::StaticAsset }
    }

    fn is_allowed_host(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.allowlist.iter().any(|allowed| host.contains(allowed.as_str()))
    }
}

fn is_data_path(path: &str) -> bool {
    path.contains(DATA_SEGMENT) || path.ends_with(DATA_SUFFIX)
}
