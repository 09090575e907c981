//! worker_status tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::CacheWorker;
use shellcache_core::Error;

/// Parameters for the worker_status tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusParams {}

/// Implementation of the worker_status tool.
///
/// Reports the lifecycle state, this process's generation, the generation
/// recorded as current in the store, and per-generation entry counts.
pub async fn status_impl(worker: &CacheWorker, _params: WorkerStatusParams) -> Result<CallToolResult, McpError> {
    let status = worker.status().await?;
    let json = serde_json::to_string_pretty(&status)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize status: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, output_json, worker, worker_on};
    use shellcache_core::CacheDb;

    #[tokio::test]
    async fn test_status_fresh_worker() {
        let worker = worker(StubNetwork::with(&[]), "v1", &[]).await;
        let output = output_json(&status_impl(&worker, WorkerStatusParams::default()).await.unwrap());

        assert_eq!(output["state"], "installing");
        assert_eq!(output["generation"], "app-v1");
        assert!(output["current_marker"].is_null());
        assert_eq!(output["generations"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_status_after_upgrade() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = StubNetwork::with(&[
            ("https://exhibit.example/", 200, "root"),
            ("https://exhibit.example/index.html", 200, "index"),
        ]);

        let old = worker_on(db.clone(), net.clone(), "v1", &["./", "./index.html"]);
        old.install_and_activate().await.unwrap();

        let new = worker_on(db.clone(), net, "v2", &["./index.html"]);
        new.install_and_activate().await.unwrap();

        let output = output_json(&status_impl(&new, WorkerStatusParams::default()).await.unwrap());
        assert_eq!(output["state"], "active");
        assert_eq!(output["current_marker"], "app-v2");

        let generations = output["generations"].as_array().unwrap();
        assert_eq!(generations.len(), 1);
        assert_eq!(generations[0]["generation"], "app-v2");
        assert_eq!(generations[0]["entries"], 1);
    }
}
