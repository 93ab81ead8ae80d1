//! Cache error types.

use std::path::PathBuf;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur when using a cache store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Namespace is empty or contains characters unsafe for file names.
    #[error("invalid cache namespace: {0:?}")]
    InvalidNamespace(String),

    /// Failed to serialize an entry.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing document exists but cannot be decoded.
    #[error("corrupt cache document {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),
}
