//! cache_purge tool implementation.
//!
//! Deletes whole generations: one by name, or every generation other than
//! the worker's own.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::CacheWorker;
use shellcache_core::Error;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete every entry owned by this generation.
    pub generation: Option<String>,

    /// Delete every generation except the worker's current one.
    pub stale_only: Option<bool>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Generations that had entries removed.
    pub generations: Vec<String>,
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &CacheWorker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let stale_only = params.stale_only.unwrap_or(false);
    if params.generation.is_none() && !stale_only {
        return Err(Error::InvalidInput("At least one of generation or stale_only must be specified".to_string()).into());
    }

    let current = worker.generation().as_str();
    let mut targets = Vec::new();

    if let Some(generation) = params.generation {
        let generation = generation.trim().to_string();
        if generation.is_empty() {
            return Err(Error::InvalidInput("generation cannot be empty".to_string()).into());
        }
        targets.push(generation);
    }

    if stale_only {
        for generation in worker.db().list_generations().await? {
            if generation != current && !targets.contains(&generation) {
                targets.push(generation);
            }
        }
    }

    let mut output = CachePurgeOutput { generations: Vec::new(), deleted: 0 };
    for generation in targets {
        let deleted = worker.db().delete_generation(&generation).await?;
        if deleted > 0 {
            tracing::info!(%generation, deleted, "purged generation");
            output.generations.push(generation);
            output.deleted += deleted;
        }
    }

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, output_json, worker_on};
    use shellcache_core::CacheDb;

    const PAGES: &[(&str, u16, &str)] = &[
        ("https://exhibit.example/index.html", 200, "index"),
        ("https://exhibit.example/app.js", 200, "js"),
    ];

    /// Store with `app-v1` holding two entries and `app-v2` holding one.
    async fn two_generations() -> (CacheDb, CacheWorker) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = StubNetwork::with(PAGES);
        worker_on(db.clone(), net.clone(), "v1", &["./index.html", "./app.js"])
            .install()
            .await
            .unwrap();
        let current = worker_on(db.clone(), net, "v2", &["./index.html"]);
        current.install().await.unwrap();
        (db, current)
    }

    #[tokio::test]
    async fn test_purge_stale_only() {
        let (db, worker) = two_generations().await;

        let params = CachePurgeParams { generation: None, stale_only: Some(true) };
        let output = output_json(&purge_impl(&worker, params).await.unwrap());
        assert_eq!(output["deleted"], 2);
        assert_eq!(output["generations"][0], "app-v1");

        assert_eq!(db.list_generations().await.unwrap(), vec!["app-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_purge_named_generation() {
        let (db, worker) = two_generations().await;

        let params = CachePurgeParams { generation: Some("app-v2".into()), stale_only: None };
        let result = purge_impl(&worker, params).await.unwrap();
        let output: CachePurgeOutput = serde_json::from_value(output_json(&result)).unwrap();
        assert_eq!(output.deleted, 1);
        assert_eq!(db.count_entries().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_purge_unknown_generation_deletes_nothing() {
        let (db, worker) = two_generations().await;

        let params = CachePurgeParams { generation: Some("app-v0".into()), stale_only: None };
        let output = output_json(&purge_impl(&worker, params).await.unwrap());
        assert_eq!(output["deleted"], 0);
        assert_eq!(db.count_entries().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_purge_no_params() {
        let (_db, worker) = two_generations().await;
        let params = CachePurgeParams { generation: None, stale_only: Some(false) };

        let result = purge_impl(&worker, params).await;
        assert!(result.is_err());
    }
}
