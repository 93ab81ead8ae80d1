//! Change-only status notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use brownout_core::EngineConfig;
use brownout_monitor::{QualityClassification, QualityHandle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::mode::{StatusMode, StatusValue};

/// Subscriber callback.
pub type StatusCallback = Arc<dyn Fn(&StatusValue) + Send + Sync>;

/// Identifies a subscription for `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct State {
    current: Option<StatusValue>,
    sequence: u64,
    subscribers: Vec<(SubscriptionId, StatusCallback)>,
}

struct Inner {
    state: Mutex<State>,
    next_id: AtomicU64,
    good_grace: Duration,
}

/// Publishes the user-facing mode and notifies subscribers when it changes.
///
/// Cloning shares the channel. Callbacks run on the publishing task after
/// the internal lock is released, so a callback may subscribe or
/// unsubscribe.
#[derive(Clone)]
pub struct StatusChannel {
    inner: Arc<Inner>,
}

impl StatusChannel {
    /// Create a channel with the given `good` grace period.
    pub fn new(good_grace: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    current: None,
                    sequence: 0,
                    subscribers: Vec::new(),
                }),
                next_id: AtomicU64::new(1),
                good_grace,
            }),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.good_grace())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a callback for every future change.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusValue) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.state().subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state();
        let before = state.subscribers.len();
        state.subscribers.retain(|(sid, _)| *sid != id);
        state.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }

    /// Last published value, if any.
    pub fn current(&self) -> Option<StatusValue> {
        self.state().current.clone()
    }

    /// Feed a classification. Publishes only when the mapped mode differs
    /// from the last published one; `Unknown` never publishes.
    pub fn observe(&self, classification: QualityClassification) -> Option<StatusValue> {
        let mode = StatusMode::from_classification(classification)?;
        self.publish(mode, false)
    }

    /// Re-publish the last mode even if unchanged. Nothing happens before
    /// the first publish.
    pub fn refresh(&self) -> Option<StatusValue> {
        let mode = self.state().current.as_ref()?.mode;
        self.publish(mode, true)
    }

    /// Publish a freshly evaluated classification: a changed mode is
    /// published once, an unchanged one is re-published.
    pub fn refresh_with(&self, classification: QualityClassification) -> Option<StatusValue> {
        let Some(mode) = StatusMode::from_classification(classification) else {
            return self.refresh();
        };
        self.publish(mode, true)
    }

    fn publish(&self, mode: StatusMode, force: bool) -> Option<StatusValue> {
        let (value, subscribers) = {
            let mut state = self.state();
            let previous = state.current.as_ref().map(|v| v.mode);
            if !force && previous == Some(mode) {
                return None;
            }
            state.sequence += 1;
            let value = StatusValue::new(mode, state.sequence, self.inner.good_grace);
            state.current = Some(value.clone());
            if previous != Some(mode) {
                info!(mode = %mode, sequence = value.sequence, "status changed");
            } else {
                debug!(mode = %mode, sequence = value.sequence, "status re-published");
            }
            let subscribers: Vec<StatusCallback> =
                state.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect();
            (value, subscribers)
        };

        for callback in subscribers {
            callback(&value);
        }
        Some(value)
    }

    /// Feed every classification change from `quality` into this channel,
    /// starting with its current value. Changes are replayed in order, so
    /// a short-lived mode between two others still reaches subscribers.
    /// If the bridge falls too far behind it resumes from the current
    /// value. The task ends when the monitor stops.
    pub fn follow(&self, quality: &QualityHandle) -> JoinHandle<()> {
        let channel = self.clone();
        let mut changes = quality.transitions();
        let initial = quality.current();
        let quality = quality.clone();
        tokio::spawn(async move {
            channel.observe(initial);
            loop {
                match changes.recv().await {
                    Ok(classification) => {
                        channel.observe(classification);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "status bridge lagged, resuming from current quality");
                        channel.observe(quality.current());
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("quality source closed, status bridge exiting");
        })
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl std::fmt::Debug for StatusChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("StatusChannel")
            .field("current", &state.current)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}
