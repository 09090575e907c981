//! shellcache-worker server entry point.
//!
//! Boots the cache worker (install then activate for the configured
//! generation) and serves it over MCP on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use chrono::Utc;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{CacheWorker, FetchConfig, HttpFetcher, WorkerConfig};
use shellcache_core::{AppConfig, CacheDb};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let worker_config = WorkerConfig::from_app(&config, Utc::now())?;

    tracing::info!(
        origin = %worker_config.origin,
        generation = %worker_config.generation,
        db_path = %config.db_path.display(),
        "Starting shellcache-worker on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);
    let worker = Arc::new(CacheWorker::new(db, network, worker_config));

    let (install, activate) = worker.install_and_activate().await?;
    tracing::info!(
        generation = %install.generation,
        stored = install.stored.len(),
        failed = install.failed.len(),
        evicted = activate.evicted_generations.len(),
        "worker active"
    );

    let handler = handler::ShellcacheServer::new(worker.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    worker.flush_pending_writes().await;

    Ok(())
}
