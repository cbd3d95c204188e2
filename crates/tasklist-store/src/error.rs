//! Error types for cache and remote adapters.

use thiserror::Error;

/// Errors raised by [`LocalCache`](crate::LocalCache) implementations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem access failed.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache is unavailable (quota exceeded, disabled, ...).
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by [`RemoteStore`](crate::RemoteStore) implementations.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Request could not be sent or the connection failed.
    #[error("remote transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("remote rejected {operation} with status {status}: {body}")]
    Status {
        /// Operation that failed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body (possibly truncated).
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("remote returned undecodable payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The remote is misconfigured.
    #[error("invalid remote configuration: {0}")]
    Config(String),

    /// The remote could not be reached.
    #[error("remote unavailable: {0}")]
    Unavailable(String),
}
