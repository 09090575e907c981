//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellcache-worker server.

pub mod cache;
pub mod worker_fetch;
pub mod worker_status;

#[cfg(test)]
pub(crate) mod testing;

pub use worker_fetch::{WorkerFetchParams, fetch_impl};
pub use worker_status::{WorkerStatusParams, status_impl};
