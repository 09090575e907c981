//! The cache worker service.
//!
//! One [`CacheWorker`] is built per process with its store, network and
//! generation injected. It exposes the lifecycle (`install`, `activate`) and
//! the interception entry point (`handle`) as ordinary async methods.
//!
//! Request tasks share nothing but the store handle; every store mutation is
//! a single per-key statement, and background write-backs are tracked so
//! shutdown can drain them.

pub mod lifecycle;
pub mod router;

#[cfg(test)]
pub(crate) mod mock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shellcache_core::cache::GenerationStats;
use shellcache_core::{
    AppConfig, CacheDb, Classifier, ConfigError, Error, GenerationId, PrecacheManifest, RequestClass, ResponseData,
    WorkerRequest,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{Network, resolve};

pub use lifecycle::{ActivateReport, InstallReport, LifecycleState, ManifestFailure};

/// Static settings a worker is built with.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub allowlist_hosts: Vec<String>,
    pub generation: GenerationId,
    pub manifest: PrecacheManifest,
    pub install_concurrency: usize,
    /// Largest body written to the store; bigger responses are served only.
    pub max_entry_bytes: usize,
}

impl WorkerConfig {
    /// Derive worker settings from the loaded application config.
    ///
    /// `now` only matters when no explicit version is configured.
    pub fn from_app(config: &AppConfig, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: config.origin_url()?,
            allowlist_hosts: config.allowlist_hosts.clone(),
            generation: config.generation(now),
            manifest: config.manifest(),
            install_concurrency: config.install_concurrency.max(1),
            max_entry_bytes: config.max_bytes,
        })
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
}

/// A response produced by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedResponse {
    pub class: RequestClass,
    pub source: ResponseSource,
    pub response: ResponseData,
}

/// Result of intercepting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// The worker produced a response.
    Response(ServedResponse),
    /// The worker declined; the caller performs a plain network request.
    Unhandled,
}

impl Interception {
    pub fn into_response(self) -> Option<ServedResponse> {
        match self {
            Interception::Response(served) => Some(served),
            Interception::Unhandled => None,
        }
    }
}

/// Snapshot of worker and store state.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub state: LifecycleState,
    pub generation: String,
    /// Generation recorded as current in the store, if activation ever ran.
    pub current_marker: Option<String>,
    pub generations: Vec<GenerationStats>,
}

/// Long-lived request-interception service.
pub struct CacheWorker {
    db: CacheDb,
    network: Arc<dyn Network>,
    classifier: Classifier,
    config: WorkerConfig,
    state: RwLock<LifecycleState>,
    lifecycle_lock: Mutex<()>,
    pending_writes: Mutex<JoinSet<()>>,
}

impl CacheWorker {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, config: WorkerConfig) -> Self {
        let classifier = Classifier::new(&config.origin, &config.allowlist_hosts);
        Self {
            db,
            network,
            classifier,
            config,
            state: RwLock::new(LifecycleState::Installing),
            lifecycle_lock: Mutex::new(()),
            pending_writes: Mutex::new(JoinSet::new()),
        }
    }

    pub fn generation(&self) -> &GenerationId {
        &self.config.generation
    }

    pub fn origin(&self) -> &Url {
        &self.config.origin
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Resolve a raw URL against the origin and build a request for it.
    pub fn request(&self, method: &str, raw_url: &str) -> Result<WorkerRequest, Error> {
        if method.trim().is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }
        let url = resolve(&self.config.origin, raw_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(WorkerRequest::new(method, url))
    }

    /// Interception entry point for a raw (method, URL) pair.
    pub async fn intercept(&self, method: &str, raw_url: &str) -> Result<Interception, Error> {
        let request = self.request(method, raw_url)?;
        self.handle(request).await
    }

    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        Ok(WorkerStatus {
            state: self.state().await,
            generation: self.config.generation.to_string(),
            current_marker: self.db.current_generation().await?,
            generations: self.db.generation_stats().await?,
        })
    }

    /// Whether a live response may be written to the store.
    ///
    /// Only 2xx responses within the size limit are kept.
    pub(crate) fn storable(&self, request: &WorkerRequest, response: &ResponseData) -> bool {
        if !response.is_success() {
            return false;
        }
        if response.body.len() > self.config.max_entry_bytes {
            tracing::warn!(
                url = %request.url,
                bytes = response.body.len(),
                limit = self.config.max_entry_bytes,
                "response exceeds store limit; served without storing"
            );
            return false;
        }
        true
    }

    /// Store a copy of `response` in the background.
    ///
    /// Failures are logged; the caller has already returned the live
    /// response. Finished tasks are reaped here so the set stays small.
    pub(crate) async fn spawn_write_back(&self, request: WorkerRequest, response: ResponseData) {
        let db = self.db.clone();
        let generation = self.config.generation.clone();

        let mut pending = self.pending_writes.lock().await;
        while pending.try_join_next().is_some() {}

        pending.spawn(async move {
            if let Err(e) = db.put_entry(generation.as_str(), &request, &response).await {
                tracing::warn!(url = %request.url, error = %e, "write-back failed; network response already served");
            }
        });
    }

    /// Wait for every outstanding background write-back.
    pub async fn flush_pending_writes(&self) {
        let mut pending = self.pending_writes.lock().await;
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "write-back task aborted");
            }
        }
    }
}
