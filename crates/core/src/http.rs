//! Request and response values passed between the router, the network and
//! the store.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// An inbound request descriptor as seen by the interception layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRequest {
    /// HTTP method, upper-cased.
    pub method: String,
    /// Absolute, canonicalized URL.
    pub url: Url,
}

impl WorkerRequest {
    pub fn new(method: impl AsRef<str>, url: Url) -> Self {
        Self { method: method.as_ref().trim().to_ascii_uppercase(), url }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// A complete response: status, headers and a fully buffered body.
///
/// The body is `Bytes` so handing a copy to a background write-back is a
/// refcount bump rather than a buffer copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    /// URL the response was ultimately served from (after redirects).
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseData {
    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
