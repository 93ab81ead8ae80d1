//! Status modes and published values.

use std::time::Duration;

use brownout_monitor::QualityClassification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presentation mode derived from the quality classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMode {
    Offline,
    Slow,
    Good,
}

impl StatusMode {
    /// Map a classification. `Unknown` has no mode and is never published.
    pub fn from_classification(classification: QualityClassification) -> Option<Self> {
        match classification {
            QualityClassification::Offline => Some(Self::Offline),
            QualityClassification::Slow => Some(Self::Slow),
            QualityClassification::Good => Some(Self::Good),
            QualityClassification::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Slow => "slow",
            Self::Good => "good",
        }
    }
}

impl std::fmt::Display for StatusMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusValue {
    pub mode: StatusMode,
    /// Strictly increasing per channel; lets subscribers detect staleness.
    pub sequence: u64,
    pub published_at: DateTime<Utc>,
    /// Grace period after which a `good` indication should be hidden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retract_after_ms: Option<u64>,
}

impl StatusValue {
    pub(crate) fn new(mode: StatusMode, sequence: u64, good_grace: Duration) -> Self {
        Self {
            mode,
            sequence,
            published_at: Utc::now(),
            retract_after_ms: (mode == StatusMode::Good).then(|| good_grace.as_millis() as u64),
        }
    }

    /// How long a subscriber should keep this indication visible unless a
    /// newer value supersedes it. Only `good` is retracted; the channel
    /// documents this timing but leaves enforcement to the subscriber.
    pub fn retract_after(&self) -> Option<Duration> {
        self.retract_after_ms.map(Duration::from_millis)
    }

    /// Whether this value was published after `other`.
    pub fn is_newer_than(&self, other: &StatusValue) -> bool {
        self.sequence > other.sequence
    }
}
