//! Engine setup and control errors.

use brownout_cache::CacheError;
use brownout_core::ConfigError;
use brownout_data::FetchError;
use brownout_monitor::MonitorError;

/// Errors from building or driving an `Engine`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cache store unavailable: {0}")]
    Cache(#[from] CacheError),

    #[error("no transport configured")]
    MissingTransport,

    #[error("transport setup failed: {0}")]
    Transport(#[from] FetchError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}
