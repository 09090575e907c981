//! Generation lifecycle: install the precache manifest, then activate.
//!
//! ```text
//! Installing ──install──▶ Installed ──activate──▶ Activating ──▶ Active
//! ```
//!
//! `Installing` is the state of a freshly built worker. `activate` may be
//! re-run from `Activating` (after a failed attempt) or `Active`; eviction
//! is idempotent so the end state is the same. There is no way back to
//! `Installing` short of a new process with a new generation.

use serde::Serialize;
use shellcache_core::{CacheDb, Error, GenerationId, WorkerRequest};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use super::CacheWorker;
use crate::fetch::{Network, resolve};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Installing,
    Installed,
    Activating,
    Active,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
        };
        f.write_str(s)
    }
}

/// A manifest entry that did not make it into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestFailure {
    pub path: String,
    pub reason: String,
}

/// Outcome of [`CacheWorker::install`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Manifest paths stored, in manifest order.
    pub stored: Vec<String>,
    /// Manifest paths that failed, in manifest order.
    pub failed: Vec<ManifestFailure>,
}

/// Outcome of [`CacheWorker::activate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub generation: String,
    pub evicted_generations: Vec<String>,
    pub deleted_entries: u64,
}

impl CacheWorker {
    /// Populate this worker's generation with the precache manifest.
    ///
    /// Every entry is fetched independently, at most `install_concurrency`
    /// at a time. An entry that fails (transport error, non-2xx status,
    /// store error) is logged and reported but never fails the install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let _guard = self.lifecycle_lock.lock().await;
        let state = self.state().await;
        if state != LifecycleState::Installing {
            return Err(Error::InvalidTransition { operation: "install", state: state.to_string() });
        }

        let generation = self.config.generation.clone();
        tracing::info!(%generation, entries = self.config.manifest.len(), "installing generation");

        let semaphore = Arc::new(Semaphore::new(self.config.install_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        let mut outcomes: Vec<Option<Result<(), String>>> = vec![None; self.config.manifest.len()];

        for (index, path) in self.config.manifest.paths().iter().enumerate() {
            let url = match resolve(&self.config.origin, path) {
                Ok(url) => url,
                Err(e) => {
                    outcomes[index] = Some(Err(e.to_string()));
                    continue;
                }
            };

            let semaphore = semaphore.clone();
            let db = self.db.clone();
            let network = self.network.clone();
            let generation = generation.clone();
            let max_bytes = self.config.max_entry_bytes;

            join_set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => precache_entry(&db, network.as_ref(), &generation, url, max_bytes).await,
                    Err(e) => Err(e.to_string()),
                };
                (index, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => outcomes[index] = Some(result),
                Err(e) => tracing::warn!(error = %e, "precache task aborted"),
            }
        }

        let mut report = InstallReport { generation: generation.to_string(), stored: Vec::new(), failed: Vec::new() };
        for (path, outcome) in self.config.manifest.paths().iter().zip(outcomes) {
            match outcome {
                Some(Ok(())) => report.stored.push(path.clone()),
                Some(Err(reason)) => {
                    let err = Error::ManifestEntry { path: path.clone(), reason: reason.clone() };
                    tracing::warn!(%generation, "{err}");
                    report.failed.push(ManifestFailure { path: path.clone(), reason });
                }
                None => report
                    .failed
                    .push(ManifestFailure { path: path.clone(), reason: "precache task aborted".into() }),
            }
        }

        *self.state.write().await = LifecycleState::Installed;
        tracing::info!(
            %generation,
            stored = report.stored.len(),
            failed = report.failed.len(),
            "generation installed"
        );

        Ok(report)
    }

    /// Make this worker's generation current and evict every other one.
    ///
    /// Safe to call again after a partial failure or after success: the
    /// store converges to "only this generation, marked current".
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let _guard = self.lifecycle_lock.lock().await;
        let state = self.state().await;
        if state == LifecycleState::Installing {
            return Err(Error::InvalidTransition { operation: "activate", state: state.to_string() });
        }

        let generation = self.config.generation.clone();
        if state == LifecycleState::Installed {
            *self.state.write().await = LifecycleState::Activating;
            tracing::info!(%generation, "activating generation");
        }

        let eviction = self.db.evict_all_except(generation.as_str()).await?;

        *self.state.write().await = LifecycleState::Active;
        tracing::info!(
            %generation,
            evicted = ?eviction.evicted_generations,
            deleted = eviction.deleted_entries,
            "generation active"
        );

        Ok(ActivateReport {
            generation: generation.to_string(),
            evicted_generations: eviction.evicted_generations,
            deleted_entries: eviction.deleted_entries,
        })
    }

    /// Startup sequence: install, then activate immediately.
    pub async fn install_and_activate(&self) -> Result<(InstallReport, ActivateReport), Error> {
        let installed = self.install().await?;
        let activated = self.activate().await?;
        Ok((installed, activated))
    }
}

/// Fetch one manifest entry and store it if the response is 2xx and fits.
async fn precache_entry(
    db: &CacheDb, network: &dyn Network, generation: &GenerationId, url: Url, max_bytes: usize,
) -> Result<(), String> {
    let request = WorkerRequest::get(url);
    let response = network.fetch(&request).await.map_err(|e| e.to_string())?;
    if !response.is_success() {
        return Err(format!("status {}", response.status));
    }
    if response.body.len() > max_bytes {
        return Err(format!("{} bytes exceeds store limit {}", response.body.len(), max_bytes));
    }
    db.put_entry(generation.as_str(), &request, &response)
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}
