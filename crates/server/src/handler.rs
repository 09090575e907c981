//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the cache worker.
use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::{WorkerFetchParams, WorkerStatusParams, fetch_impl, status_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::CacheWorker;
use std::sync::Arc;

/// The main MCP server handler for shellcache-worker.
#[derive(Clone)]
pub struct ShellcacheServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<CacheWorker>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellcacheServer {
    /// Create a new server handler around a shared worker.
    pub fn new(worker: Arc<CacheWorker>) -> Self {
        Self { tool_router: Self::tool_router(), worker }
    }

    /// Route one request through the worker.
    #[tool(
        description = "Fetch a URL through the offline cache worker. Static assets are served cache-first, runtime data network-first with cached fallback, allowlisted cross-origin requests fall back to cache when offline. Returns handled=false for blocked cross-origin requests."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report lifecycle state, active generation, and per-generation entry counts.")]
    async fn worker_status(&self, params: Parameters<WorkerStatusParams>) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker, params.0).await
    }

    /// Read a stored response without going to the network.
    #[tool(description = "Look up the cached response for a URL without touching the network.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }

    #[tool(description = "Delete cached generations, either one by name or every generation except the current one.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for ShellcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache-worker".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
