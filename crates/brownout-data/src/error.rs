//! Transport error type.

use std::time::Duration;

use brownout_core::UrlError;

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request aborted")]
    Aborted,

    #[error("transport timeout after {0:?}")]
    Timeout(Duration),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("request error: {0}")]
    Request(String),
}

impl FetchError {
    /// Whether the transport itself gave up waiting.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
