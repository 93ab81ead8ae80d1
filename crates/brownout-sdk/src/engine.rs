//! The engine facade.

use std::sync::Arc;

use brownout_cache::{CacheStore, FileCacheStore, MemoryCacheStore};
use brownout_core::{EngineConfig, FetchRequest, ResolutionObserver};
use brownout_data::Transport;
use brownout_monitor::{
    ConnectionHint, MonitorHandle, PlatformSignal, Probe, ProbeReport, QualityHandle,
    QualityMonitor, TransportProbe,
};
use brownout_observability::{MetricsSnapshot, ResolutionMetrics};
use brownout_resolver::{ModeController, NetworkStatus, Resolution, ResolveResult, Resolver};
use brownout_status::{StatusChannel, StatusValue, SubscriptionId};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::EngineError;

/// Builder for `Engine`.
pub struct EngineBuilder {
    config: EngineConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CacheStore>>,
    probe: Option<Arc<dyn Probe>>,
    hint: Option<ConnectionHint>,
    offline: bool,
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl EngineBuilder {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            probe: None,
            hint: None,
            offline: false,
            observers: Vec::new(),
        }
    }

    /// Network transport for resolutions and, unless overridden, the probe.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Cache store. Defaults to a file store under `cache_dir` when set,
    /// otherwise a memory store.
    pub fn store(mut self, store: impl CacheStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the default transport probe.
    pub fn probe(mut self, probe: impl Probe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Connection metadata known at startup.
    pub fn hint(mut self, hint: ConnectionHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// The platform reports offline at startup.
    pub fn starting_offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Validate the configuration and start the monitor.
    ///
    /// Must run inside a tokio runtime.
    pub async fn start(self) -> Result<Engine, EngineError> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };

        let store: Arc<dyn CacheStore> = match (self.store, &self.config.cache_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => {
                Arc::new(FileCacheStore::open(dir, self.config.cache_namespace.clone()).await?)
            }
            (None, None) => Arc::new(MemoryCacheStore::new(self.config.cache_namespace.clone())?),
        };

        let probe: Arc<dyn Probe> = match self.probe {
            Some(probe) => probe,
            None => Arc::new(TransportProbe::from_config(
                Arc::clone(&transport),
                &self.config,
            )),
        };

        let metrics = Arc::new(ResolutionMetrics::new());
        let probe_metrics = Arc::clone(&metrics);

        let mut monitor = QualityMonitor::from_config(probe, &self.config).with_probe_listener(
            Arc::new(move |report: &ProbeReport| probe_metrics.record_probe(report.is_failure())),
        );
        if let Some(hint) = self.hint {
            monitor = monitor.with_hint(hint);
        }
        if self.offline {
            monitor = monitor.starting_offline();
        }

        let modes = ModeController::new(monitor.handle());
        let resolver = self
            .observers
            .into_iter()
            .fold(
                Resolver::new(&self.config, transport, Arc::clone(&store), modes),
                |resolver, observer| resolver.with_observer(observer),
            )
            .with_observer(Arc::clone(&metrics) as Arc<dyn ResolutionObserver>);

        let status = StatusChannel::from_config(&self.config);
        let monitor = monitor.spawn();
        let bridge = status.follow(&monitor.quality());

        info!(
            origin = %self.config.origin,
            namespace = store.namespace(),
            "engine started"
        );

        Ok(Engine {
            config: self.config,
            resolver,
            status,
            monitor,
            bridge,
            metrics,
        })
    }
}

#[cfg(feature = "http")]
fn default_transport() -> Result<Arc<dyn Transport>, EngineError> {
    let transport = brownout_data::HttpTransport::new(std::time::Duration::from_secs(1))?;
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "http"))]
fn default_transport() -> Result<Arc<dyn Transport>, EngineError> {
    Err(EngineError::MissingTransport)
}

/// A running resolution engine: one monitor, one policy, one status channel.
pub struct Engine {
    config: EngineConfig,
    resolver: Resolver,
    status: StatusChannel,
    monitor: MonitorHandle,
    bridge: JoinHandle<()>,
    metrics: Arc<ResolutionMetrics>,
}

impl Engine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a GET for `url` (relative URLs belong to the origin).
    pub async fn resolve(&self, url: &str) -> ResolveResult<Resolution> {
        self.resolver.resolve_url(url).await
    }

    pub async fn resolve_request(&self, request: FetchRequest) -> ResolveResult<Resolution> {
        self.resolver.resolve(request).await
    }

    /// Register for status changes.
    pub fn on_status_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusValue) + Send + Sync + 'static,
    {
        self.status.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.status.unsubscribe(id)
    }

    /// Last published status.
    pub fn status(&self) -> Option<StatusValue> {
        self.status.current()
    }

    /// Re-evaluate quality now and re-publish the resulting status.
    pub async fn refresh(&self) -> Result<Option<StatusValue>, EngineError> {
        let classification = self.monitor.refresh().await?;
        Ok(self.status.refresh_with(classification))
    }

    pub fn enable_cache_first(&self) {
        self.resolver.modes().enable_cache_first();
    }

    pub fn disable_cache_first(&self) {
        self.resolver.modes().disable_cache_first();
    }

    pub fn network_status(&self) -> NetworkStatus {
        self.resolver.network_status()
    }

    /// Forward a platform connectivity signal.
    pub async fn signal(&self, signal: PlatformSignal) -> Result<(), EngineError> {
        self.monitor.signal(signal).await?;
        Ok(())
    }

    pub fn quality(&self) -> QualityHandle {
        self.monitor.quality()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        self.resolver.store()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Stop the monitor and the status bridge.
    pub async fn shutdown(self) {
        let Self {
            monitor, bridge, ..
        } = self;
        monitor.shutdown().await;
        bridge.abort();
        let _ = bridge.await;
        info!("engine stopped");
    }
}
