//! Cache-related MCP tools.
//!
//! These read and prune the SQLite store directly; they never go through
//! the request strategies.

pub mod get;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
