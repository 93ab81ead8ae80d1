//! Resolution outcome tracking.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where a resolved response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    /// Fresh network response.
    Network,
    /// Cache hit on the preferred (cache-first) path.
    Cache,
    /// Cache hit after the network stage failed or timed out.
    Fallback,
    /// Third-party request handed straight to the transport.
    Passthrough,
}

impl ResolutionSource {
    /// Lower-case name, as used in explain headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache => "cache",
            Self::Fallback => "fallback",
            Self::Passthrough => "passthrough",
        }
    }
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted while a request is being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEvent {
    /// Preferred cache lookup found an entry.
    CacheHit { key: String },
    /// Preferred cache lookup missed.
    CacheMiss { key: String },
    /// Network stage answered before its deadline.
    NetworkSuccess { key: String, elapsed: Duration },
    /// Network stage hit its deadline and was aborted.
    NetworkTimeout { key: String, deadline: Duration },
    /// Network stage failed before its deadline.
    NetworkError { key: String, error: String },
    /// Fallback cache lookup served the response.
    FallbackHit { key: String },
    /// Every path missed; an error was surfaced.
    Failed { key: String, timed_out: bool },
    /// Request bypassed the engine.
    Passthrough { url: String },
    /// A successful response could not be stored.
    CacheWriteFailed { key: String, error: String },
    /// A cache read failed and was treated as a miss.
    CacheReadFailed { key: String, error: String },
}

/// Observer for resolution events.
pub trait ResolutionObserver: Send + Sync {
    /// Called for every event, in order, on the resolving task.
    fn on_event(&self, event: &ResolutionEvent);
}
