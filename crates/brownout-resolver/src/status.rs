//! Polling snapshot of engine state.

use brownout_monitor::QualityClassification;
use serde::{Deserialize, Serialize};

use crate::mode::{ModeController, ResolutionMode};

/// Synchronous view for collaborators that poll instead of subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub is_slow_connection: bool,
    pub cache_first_mode: bool,
    pub is_online: bool,
    pub classification: QualityClassification,
}

impl NetworkStatus {
    pub fn capture(modes: &ModeController) -> Self {
        let classification = modes.classification();
        Self {
            is_slow_connection: classification == QualityClassification::Slow,
            cache_first_mode: modes.current() == ResolutionMode::CacheFirst,
            is_online: modes.quality().is_online(),
            classification,
        }
    }
}
