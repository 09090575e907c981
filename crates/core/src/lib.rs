//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Cache store with SQLite backend, partitioned by generation
//! - Request classification
//! - Generation ids and the precache manifest
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod manifest;

pub use cache::{CacheDb, CacheEntry};
pub use classify::{Classifier, RequestClass};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use generation::GenerationId;
pub use http::{ResponseData, WorkerRequest};
pub use manifest::PrecacheManifest;
