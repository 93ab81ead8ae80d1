//! Quality classification and its shared read side.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::info;

/// Current estimate of network usability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityClassification {
    /// Platform reports no connectivity.
    Offline,
    /// Connected, but the probe was slow or failed, or the platform hint is slow.
    Slow,
    /// Probe answered within the latency ceiling.
    Good,
    /// Nothing measured yet.
    #[default]
    Unknown,
}

impl QualityClassification {
    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Slow => "slow",
            Self::Good => "good",
            Self::Unknown => "unknown",
        }
    }

    /// Whether cache should be preferred over network.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Offline | Self::Slow)
    }
}

impl std::fmt::Display for QualityClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every published change, in order, for consumers that must not miss an
/// intermediate value the `watch` side would coalesce.
const TRANSITION_CAPACITY: usize = 64;

/// Shared state written only by the monitor.
///
/// `epoch` is bumped on every online/offline transition so a probe that
/// started before a transition cannot overwrite the state after it.
#[derive(Debug)]
pub(crate) struct QualityCell {
    tx: watch::Sender<QualityClassification>,
    transitions: broadcast::Sender<QualityClassification>,
    online: AtomicBool,
    epoch: AtomicU64,
    /// Offline signals applied ahead of the monitor queue.
    offline_signals: AtomicU64,
}

impl QualityCell {
    pub(crate) fn new(initial: QualityClassification) -> Arc<Self> {
        let (tx, _rx) = watch::channel(initial);
        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);
        Arc::new(Self {
            tx,
            transitions,
            online: AtomicBool::new(initial != QualityClassification::Offline),
            epoch: AtomicU64::new(0),
            offline_signals: AtomicU64::new(0),
        })
    }

    pub(crate) fn handle(self: &Arc<Self>) -> QualityHandle {
        QualityHandle {
            rx: self.tx.subscribe(),
            cell: Some(Arc::clone(self)),
            fixed_online: true,
        }
    }

    pub(crate) fn current(&self) -> QualityClassification {
        *self.tx.borrow()
    }

    pub(crate) fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Publish a classification; returns whether it changed.
    pub(crate) fn publish(&self, next: QualityClassification) -> bool {
        let mut previous = next;
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            previous = *current;
            *current = next;
            // Sent under the watch lock so both sides agree on the order.
            let _ = self.transitions.send(next);
            true
        });
        if changed {
            info!(from = %previous, to = %next, "connection quality changed");
        }
        changed
    }

    /// Publish only if no transition happened since `epoch` and still online.
    pub(crate) fn publish_if_current(&self, epoch: u64, next: QualityClassification) -> bool {
        if self.epoch() != epoch || !self.is_online() {
            return false;
        }
        self.publish(next)
    }

    pub(crate) fn go_offline(&self) {
        if self.online.swap(false, Ordering::SeqCst) {
            self.epoch.fetch_add(1, Ordering::SeqCst);
        }
        self.publish(QualityClassification::Offline);
    }

    /// Apply a platform `Offline` before it reaches the monitor queue.
    pub(crate) fn signal_offline(&self) {
        self.offline_signals.fetch_add(1, Ordering::SeqCst);
        self.go_offline();
    }

    pub(crate) fn offline_signals(&self) -> u64 {
        self.offline_signals.load(Ordering::SeqCst)
    }

    pub(crate) fn go_online(&self) {
        if !self.online.swap(true, Ordering::SeqCst) {
            self.epoch.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Cloneable, non-blocking read side of the monitor.
#[derive(Debug, Clone)]
pub struct QualityHandle {
    rx: watch::Receiver<QualityClassification>,
    cell: Option<Arc<QualityCell>>,
    fixed_online: bool,
}

impl QualityHandle {
    /// A handle pinned to one classification, for collaborators that run
    /// without a monitor.
    pub fn fixed(classification: QualityClassification) -> Self {
        let (_tx, rx) = watch::channel(classification);
        Self {
            rx,
            cell: None,
            fixed_online: classification != QualityClassification::Offline,
        }
    }

    /// Current classification.
    pub fn current(&self) -> QualityClassification {
        *self.rx.borrow()
    }

    /// Last platform online/offline state.
    pub fn is_online(&self) -> bool {
        match &self.cell {
            Some(cell) => cell.is_online(),
            None => self.fixed_online,
        }
    }

    /// Receiver of the latest classification; quick successive changes
    /// may be observed as one.
    pub fn subscribe(&self) -> watch::Receiver<QualityClassification> {
        self.rx.clone()
    }

    /// Receiver of every classification change in publish order.
    ///
    /// A fixed handle never changes, so its receiver is already closed.
    pub fn transitions(&self) -> broadcast::Receiver<QualityClassification> {
        match &self.cell {
            Some(cell) => cell.transitions.subscribe(),
            None => broadcast::channel(1).1,
        }
    }
}
