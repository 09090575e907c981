//! cache_get tool implementation.
//!
//! Looks up the stored response for a request without touching the network.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::CacheWorker;
use shellcache_core::Error;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL or a path relative to the app origin.
    pub url: String,

    /// HTTP method the entry was stored under (default: GET).
    pub method: Option<String>,

    /// Include the body as UTF-8 text (default: true).
    pub include_body: Option<bool>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub key_hash: String,
    pub generation: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub stored_at: String,
    pub body_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Implementation of the cache_get tool.
///
/// Entries from the worker's own generation win over leftovers from older
/// generations, matching what a live request would be served.
pub async fn get_impl(worker: &CacheWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let method = params.method.as_deref().unwrap_or("GET");
    let request = worker.request(method, &params.url)?;

    let entry = worker
        .db()
        .match_request(&request, worker.generation().as_str())
        .await?
        .ok_or_else(|| Error::CacheMiss(request.url.to_string()))?;

    let body = params
        .include_body
        .unwrap_or(true)
        .then(|| String::from_utf8_lossy(&entry.response.body).to_string());

    let output = CacheGetOutput {
        key_hash: entry.key_hash,
        generation: entry.generation,
        url: entry.url,
        status: entry.response.status,
        body_len: entry.response.body.len(),
        headers: entry.response.headers,
        stored_at: entry.stored_at,
        body,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, output_json, worker};

    fn params(url: &str) -> CacheGetParams {
        CacheGetParams { url: url.into(), method: None, include_body: None }
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let worker = worker(StubNetwork::with(&[]), "v1", &[]).await;
        let err = get_impl(&worker, params("./index.html")).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let net = StubNetwork::with(&[("https://exhibit.example/index.html", 200, "<p>hi</p>")]);
        let worker = worker(net, "v1", &["./index.html"]).await;
        worker.install().await.unwrap();

        let output = output_json(&get_impl(&worker, params("./index.html")).await.unwrap());
        assert_eq!(output["generation"], "app-v1");
        assert_eq!(output["url"], "https://exhibit.example/index.html");
        assert_eq!(output["status"], 200);
        assert_eq!(output["body"], "<p>hi</p>");
        assert_eq!(output["body_len"], 9);
    }

    #[tokio::test]
    async fn test_get_impl_without_body() {
        let net = StubNetwork::with(&[("https://exhibit.example/index.html", 200, "<p>hi</p>")]);
        let worker = worker(net, "v1", &["./index.html"]).await;
        worker.install().await.unwrap();

        let mut p = params("https://exhibit.example/index.html");
        p.include_body = Some(false);
        let output = output_json(&get_impl(&worker, p).await.unwrap());
        assert!(output.get("body").is_none());
        assert_eq!(output["body_len"], 9);
    }

    #[tokio::test]
    async fn test_get_impl_method_is_part_of_key() {
        let net = StubNetwork::with(&[("https://exhibit.example/index.html", 200, "x")]);
        let worker = worker(net, "v1", &["./index.html"]).await;
        worker.install().await.unwrap();

        let mut p = params("./index.html");
        p.method = Some("POST".into());
        assert!(get_impl(&worker, p).await.is_err());
    }
}
