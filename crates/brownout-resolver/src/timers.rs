//! Per-request deadline bookkeeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use brownout_core::RequestId;
use tokio::time::Instant;

/// A deadline armed for an in-flight network stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub key: String,
    pub expires_at: Instant,
}

/// Registry of armed deadlines, one per in-flight resolution.
///
/// Entries are owned by a `TimerGuard`; dropping the guard on any exit
/// path (success, timeout, error, cancellation of the caller) removes the
/// entry.
#[derive(Debug, Clone, Default)]
pub struct PendingTimers {
    inner: Arc<Mutex<HashMap<RequestId, PendingTimer>>>,
}

impl PendingTimers {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<RequestId, PendingTimer>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Arm a deadline for `id`. Re-arming an id replaces its entry.
    pub fn arm(&self, id: RequestId, key: impl Into<String>, deadline: Duration) -> TimerGuard {
        self.entries().insert(
            id.clone(),
            PendingTimer {
                key: key.into(),
                expires_at: Instant::now() + deadline,
            },
        );
        TimerGuard {
            timers: self.clone(),
            id,
        }
    }

    /// Number of armed deadlines.
    pub fn pending(&self) -> usize {
        self.entries().len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.entries().contains_key(id)
    }

    /// Snapshot of armed deadlines.
    pub fn snapshot(&self) -> Vec<(RequestId, PendingTimer)> {
        self.entries()
            .iter()
            .map(|(id, timer)| (id.clone(), timer.clone()))
            .collect()
    }
}

/// Clears its registry entry on drop.
#[derive(Debug)]
pub struct TimerGuard {
    timers: PendingTimers,
    id: RequestId,
}

impl TimerGuard {
    pub fn id(&self) -> &RequestId {
        &self.id
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.timers.entries().remove(&self.id);
    }
}
