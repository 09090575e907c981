//! worker_fetch tool implementation.
//!
//! Runs one request through the interception layer: classification, then
//! the class's retrieval strategy.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{CacheWorker, Interception, ResponseSource};
use shellcache_core::Error;

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path relative to the app origin (e.g. "./app.js").
    pub url: String,

    /// HTTP method (default: GET). Only GET requests ever touch the cache.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    /// False when the worker declined the request (caller should fetch it
    /// directly, uncached).
    pub handled: bool,
    /// Canonical request URL.
    pub url: String,
    /// Request class, e.g. "static_asset" or "runtime_data".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// "network" or "cache".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Response body, decoded as UTF-8 (lossy).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub body_len: usize,
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &CacheWorker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let request = worker.request(&params.method, &params.url)?;
    let url = request.url.to_string();

    let output = match worker.handle(request).await? {
        Interception::Unhandled => WorkerFetchOutput {
            handled: false,
            url,
            class: None,
            source: None,
            status: None,
            headers: Vec::new(),
            body: None,
            body_len: 0,
        },
        Interception::Response(served) => {
            let source = match served.source {
                ResponseSource::Network => "network",
                ResponseSource::Cache => "cache",
            };
            WorkerFetchOutput {
                handled: true,
                url,
                class: Some(served.class.to_string()),
                source: Some(source.to_string()),
                status: Some(served.response.status),
                body_len: served.response.body.len(),
                body: Some(String::from_utf8_lossy(&served.response.body).to_string()),
                headers: served.response.headers,
            }
        }
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize response: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, output_json, worker};

    fn params(url: &str) -> WorkerFetchParams {
        WorkerFetchParams { url: url.into(), method: default_method() }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let worker = worker(StubNetwork::with(&[]), "v1", &[]).await;
        let result = fetch_impl(&worker, params("")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_static_asset_then_offline() {
        let net = StubNetwork::with(&[("https://exhibit.example/index.html", 200, "<h1>Exhibit</h1>")]);
        let worker = worker(net.clone(), "v1", &[]).await;

        let first = output_json(&fetch_impl(&worker, params("./index.html")).await.unwrap());
        assert_eq!(first["handled"], true);
        assert_eq!(first["class"], "static_asset");
        assert_eq!(first["source"], "network");
        assert_eq!(first["body"], "<h1>Exhibit</h1>");

        net.go_offline();
        let second = output_json(&fetch_impl(&worker, params("./index.html")).await.unwrap());
        assert_eq!(second["source"], "cache");
        assert_eq!(second["status"], 200);
        assert_eq!(second["body_len"], 16);
    }

    #[tokio::test]
    async fn test_fetch_blocked_cross_origin_unhandled() {
        let worker = worker(StubNetwork::with(&[]), "v1", &[]).await;
        let output = output_json(&fetch_impl(&worker, params("https://tracker.example/p.gif")).await.unwrap());
        assert_eq!(output["handled"], false);
        assert!(output.get("class").is_none());
    }

    #[tokio::test]
    async fn test_fetch_network_failure_is_error() {
        let worker = worker(StubNetwork::with(&[]), "v1", &[]).await;
        let err = fetch_impl(&worker, params("/data/songs.json")).await.unwrap_err();
        assert_eq!(err.code.0, -32013);
    }

    #[tokio::test]
    async fn test_fetch_result_is_valid_json() {
        let net = StubNetwork::with(&[("https://exhibit.example/app.js", 200, "let x = \"\\u0000\";")]);
        let worker = worker(net, "v1", &[]).await;

        let result = fetch_impl(&worker, params("./app.js")).await.unwrap();
        let output: WorkerFetchOutput = serde_json::from_value(output_json(&result)).unwrap();
        assert!(output.handled);
        assert_eq!(output.status, Some(200));
        assert_eq!(output.body_len, output.body.unwrap().len());
    }

    #[test]
    fn test_default_method() {
        let params: WorkerFetchParams = serde_json::from_str(r#"{"url":"/"}"#).unwrap();
        assert_eq!(params.method, "GET");
    }
}
