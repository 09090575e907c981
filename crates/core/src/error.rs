//! Unified error types for the cache worker.
//!
//! Every variant carries a stable upper-case code prefix so log lines and
//! JSON-RPC errors stay greppable.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for shellcache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be parsed or resolved against the origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// No cache entry exists for the requested key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Persistent store read or write failed.
    #[error("STORAGE_FAILURE: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_FAILURE: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored row could not be decoded.
    #[error("STORAGE_FAILURE: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Transport-level failure, timeout, or oversized body.
    #[error("NETWORK_FAILURE: {0}")]
    Network(String),

    /// A single precache entry could not be fetched or stored.
    #[error("MANIFEST_ENTRY_FAILED: {path}: {reason}")]
    ManifestEntry { path: String, reason: String },

    /// Lifecycle operation called from the wrong state.
    #[error("INVALID_TRANSITION: cannot {operation} while {state}")]
    InvalidTransition { operation: &'static str, state: String },
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl Error {
    /// Whether this error came from the network side of a fetch.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
            Error::Network(msg) => (-32013, msg.clone()),
            Error::ManifestEntry { .. } => (-32014, err.to_string()),
            Error::InvalidTransition { .. } => (-32015, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
