//! Platform events that drive the monitor.

use serde_json::Value;

/// Event reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformSignal {
    /// Connectivity returned.
    Online,
    /// Connectivity lost.
    Offline,
    /// Connection metadata changed. The payload is the raw metadata object
    /// (see `ConnectionHint::from_json`); malformed payloads are ignored.
    ConnectionChanged(Value),
}

impl PlatformSignal {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::ConnectionChanged(_) => "connection-changed",
        }
    }
}
