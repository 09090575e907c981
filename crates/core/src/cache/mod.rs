//! SQLite-backed store for cached responses, partitioned by generation.
//!
//! This module provides the persistent cache the worker reads and writes
//! through, using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Per-key atomic upserts keyed by request hash and generation
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Generation enumeration and eviction for activation

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use generations::{Eviction, GenerationStats};
