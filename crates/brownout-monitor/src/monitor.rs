//! The quality monitor task.

use std::sync::Arc;
use std::time::Duration;

use brownout_core::EngineConfig;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::hint::ConnectionHint;
use crate::probe::{Probe, ProbeReport};
use crate::quality::{QualityCell, QualityClassification, QualityHandle};
use crate::signal::PlatformSignal;

/// Called after every probe.
pub type ProbeListener = Arc<dyn Fn(&ProbeReport) + Send + Sync>;

/// Errors from talking to a spawned monitor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    #[error("quality monitor has stopped")]
    Stopped,
}

enum MonitorCommand {
    /// `offline_signals` is the cell's count when the signal was sent; an
    /// `Online` is stale once a later `Offline` has been applied.
    Signal {
        signal: PlatformSignal,
        offline_signals: u64,
    },
    Refresh(oneshot::Sender<QualityClassification>),
}

/// Keeps the connection quality classification up to date.
///
/// Offline always wins: while the platform reports offline no probe is
/// run and nothing but `Offline` is published. On the way back online a
/// platform hint, if present, is applied at once; otherwise the previous
/// classification stays until the probe lands.
pub struct QualityMonitor {
    probe: Arc<dyn Probe>,
    cell: Arc<QualityCell>,
    interval: Duration,
    slow_types: Vec<String>,
    hint: Option<ConnectionHint>,
    listener: Option<ProbeListener>,
}

impl QualityMonitor {
    /// Create a monitor that starts online with nothing measured.
    pub fn new(probe: impl Probe + 'static) -> Self {
        let defaults = EngineConfig::default();
        Self {
            probe: Arc::new(probe),
            cell: QualityCell::new(QualityClassification::Unknown),
            interval: defaults.probe_interval(),
            slow_types: defaults.slow_effective_types,
            hint: None,
            listener: None,
        }
    }

    /// Take interval and slow connection types from a configuration.
    pub fn from_config(probe: impl Probe + 'static, config: &EngineConfig) -> Self {
        Self::new(probe)
            .with_interval(config.probe_interval())
            .with_slow_types(config.slow_effective_types.clone())
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_slow_types(mut self, slow_types: Vec<String>) -> Self {
        self.slow_types = slow_types;
        self
    }

    /// Connection metadata known at startup.
    pub fn with_hint(mut self, hint: ConnectionHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Start in the offline state.
    pub fn starting_offline(self) -> Self {
        self.cell.go_offline();
        self
    }

    pub fn with_probe_listener(mut self, listener: ProbeListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Read side of this monitor.
    pub fn handle(&self) -> QualityHandle {
        self.cell.handle()
    }

    pub fn current(&self) -> QualityClassification {
        self.cell.current()
    }

    /// Apply a platform signal and return the resulting classification.
    pub async fn handle_signal(&mut self, signal: PlatformSignal) -> QualityClassification {
        debug!(signal = signal.name(), "platform signal");
        match signal {
            PlatformSignal::Offline => {
                self.cell.go_offline();
            }
            PlatformSignal::Online => {
                self.cell.go_online();
                if let Some(hint) = &self.hint {
                    self.cell.publish(hint.classify(&self.slow_types));
                }
                self.evaluate().await;
            }
            PlatformSignal::ConnectionChanged(metadata) => {
                match ConnectionHint::from_json(&metadata) {
                    Some(hint) => self.hint = Some(hint),
                    None => {
                        debug!("ignoring malformed connection metadata");
                        self.hint = None;
                    }
                }
                self.evaluate().await;
            }
        }
        self.cell.current()
    }

    /// Re-evaluate now.
    ///
    /// Offline: keeps `Offline`. A slow platform hint decides without a
    /// probe. Otherwise the probe result decides, unless an online/offline
    /// transition happened while it was in flight.
    pub async fn evaluate(&mut self) -> QualityClassification {
        if !self.cell.is_online() {
            return self.cell.current();
        }

        if let Some(hint) = &self.hint {
            if hint.is_slow(&self.slow_types) {
                self.cell.publish(QualityClassification::Slow);
                return self.cell.current();
            }
        }

        let epoch = self.cell.epoch();
        let report = self.probe.probe().await;
        if let Some(listener) = &self.listener {
            listener(&report);
        }
        if !self.cell.publish_if_current(epoch, report.classification()) {
            debug!(outcome = ?report.outcome, "probe result unchanged or superseded");
        }
        self.cell.current()
    }

    /// Run the monitor on the tokio runtime.
    ///
    /// The first probe runs immediately, then once per interval.
    pub fn spawn(self) -> MonitorHandle {
        let (commands, rx) = mpsc::channel(32);
        let cell = Arc::clone(&self.cell);
        let task = tokio::spawn(self.run(rx));
        MonitorHandle {
            commands,
            cell,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<MonitorCommand>) {
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = self.interval.as_millis() as u64, "quality monitor started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.evaluate().await;
                }
                command = commands.recv() => match command {
                    Some(MonitorCommand::Signal { signal, offline_signals }) => {
                        if signal == PlatformSignal::Online
                            && offline_signals != self.cell.offline_signals()
                        {
                            debug!("online signal superseded by a later offline signal");
                        } else {
                            self.handle_signal(signal).await;
                        }
                    }
                    Some(MonitorCommand::Refresh(reply)) => {
                        let classification = self.evaluate().await;
                        let _ = reply.send(classification);
                    }
                    None => break,
                },
            }
        }

        info!("quality monitor stopped");
    }
}

/// Handle to a spawned monitor.
pub struct MonitorHandle {
    commands: mpsc::Sender<MonitorCommand>,
    cell: Arc<QualityCell>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn quality(&self) -> QualityHandle {
        self.cell.handle()
    }

    /// Forward a platform signal. `Offline` takes effect before this returns,
    /// even if a probe is in flight, and cancels any `Online` still queued.
    pub async fn signal(&self, signal: PlatformSignal) -> Result<(), MonitorError> {
        if signal == PlatformSignal::Offline {
            self.cell.signal_offline();
        }
        let offline_signals = self.cell.offline_signals();
        self.commands
            .send(MonitorCommand::Signal {
                signal,
                offline_signals,
            })
            .await
            .map_err(|_| MonitorError::Stopped)
    }

    /// Re-evaluate now and wait for the result.
    pub async fn refresh(&self) -> Result<QualityClassification, MonitorError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(MonitorCommand::Refresh(reply))
            .await
            .map_err(|_| MonitorError::Stopped)?;
        rx.await.map_err(|_| MonitorError::Stopped)
    }

    /// Stop the monitor task and wait for it to finish.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        let _ = task.await;
    }
}
