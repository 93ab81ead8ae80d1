//! Resolution mode selection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use brownout_monitor::{QualityClassification, QualityHandle};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which source a resolution prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Consult the cache before the network.
    CacheFirst,
    /// Go to the network; cache is only a fallback.
    NetworkFirst,
}

impl ResolutionMode {
    /// Slow or offline prefers cache; good and unknown prefer network.
    pub fn from_classification(classification: QualityClassification) -> Self {
        if classification.is_degraded() {
            Self::CacheFirst
        } else {
            Self::NetworkFirst
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "cache_first",
            Self::NetworkFirst => "network_first",
        }
    }
}

impl std::fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the mode from measured quality plus a manual override.
#[derive(Debug, Clone)]
pub struct ModeController {
    quality: QualityHandle,
    forced: Arc<AtomicBool>,
}

impl ModeController {
    pub fn new(quality: QualityHandle) -> Self {
        Self {
            quality,
            forced: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mode for a resolution starting now.
    pub fn current(&self) -> ResolutionMode {
        if self.is_forced() {
            ResolutionMode::CacheFirst
        } else {
            ResolutionMode::from_classification(self.quality.current())
        }
    }

    pub fn classification(&self) -> QualityClassification {
        self.quality.current()
    }

    pub fn quality(&self) -> &QualityHandle {
        &self.quality
    }

    /// Force cache-first regardless of measured quality.
    pub fn enable_cache_first(&self) {
        if !self.forced.swap(true, Ordering::SeqCst) {
            info!("cache-first forced");
        }
    }

    /// Release the override; the measured quality decides again.
    pub fn disable_cache_first(&self) {
        if self.forced.swap(false, Ordering::SeqCst) {
            info!("cache-first override released");
        }
    }

    pub fn is_forced(&self) -> bool {
        self.forced.load(Ordering::SeqCst)
    }
}
