//! Client side of shellcache.
//!
//! This crate provides the network seam, URL resolution, and the
//! [`CacheWorker`] service that classifies requests and routes them between
//! the store and the network.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchConfig, HttpFetcher, Network, UrlError, resolve};
pub use worker::{
    ActivateReport, CacheWorker, InstallReport, Interception, LifecycleState, ManifestFailure, ResponseSource,
    ServedResponse, WorkerConfig, WorkerStatus,
};
