//! The resolution pipeline.

use std::sync::Arc;

use brownout_cache::{CacheStore, Cacheability, CachedResponse, ExplainHeaders, RequestKey};
use brownout_core::{
    EngineConfig, FetchRequest, FetchResponse, Method, RequestId, ResolutionEvent,
    ResolutionObserver, ResolutionSource,
};
use brownout_data::{
    with_deadline, DeadlineExceeded, FetchError, OriginFilter, PassthroughReason, RequestScope,
    TimeoutConfig, Transport,
};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ResolveError, ResolveResult};
use crate::mode::{ModeController, ResolutionMode};
use crate::status::NetworkStatus;
use crate::timers::PendingTimers;

/// A resolved response and how it was obtained.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The response, annotated with explain headers.
    pub response: FetchResponse,
    pub source: ResolutionSource,
    /// Mode read when the resolution started.
    pub mode: ResolutionMode,
    /// Cache key; `None` for passthrough requests.
    pub key: Option<RequestKey>,
}

impl Resolution {
    fn from_cache(
        entry: CachedResponse,
        source: ResolutionSource,
        mode: ResolutionMode,
        key: RequestKey,
    ) -> Self {
        let explain = ExplainHeaders::new(source).with_stored_at(entry.stored_at);
        Self {
            response: explain.apply(entry.into_response()),
            source,
            mode,
            key: Some(key),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self.source, ResolutionSource::Cache | ResolutionSource::Fallback)
    }
}

/// Resolves requests against cache and network according to the current
/// mode.
///
/// Each managed resolution is a sequential pipeline:
/// 1. cache lookup, only in cache-first mode; a hit returns at once
/// 2. network call bounded by the network deadline; on expiry the call is
///    dropped and thereby aborted
/// 3. one fallback cache lookup if the network stage failed
///
/// Network-first never consults the cache before the network. Requests
/// outside the origin pass through to the transport untouched.
pub struct Resolver {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CacheStore>,
    filter: OriginFilter,
    modes: ModeController,
    timeouts: TimeoutConfig,
    timers: PendingTimers,
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl Resolver {
    /// Create a resolver for the configured origin and deadlines.
    pub fn new(
        config: &EngineConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CacheStore>,
        modes: ModeController,
    ) -> Self {
        Self {
            transport,
            store,
            filter: OriginFilter::from_config(config),
            modes,
            timeouts: TimeoutConfig::from_config(config),
            timers: PendingTimers::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    pub fn timers(&self) -> &PendingTimers {
        &self.timers
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn filter(&self) -> &OriginFilter {
        &self.filter
    }

    pub fn network_status(&self) -> NetworkStatus {
        NetworkStatus::capture(&self.modes)
    }

    fn emit(&self, event: ResolutionEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    /// Resolve a GET for `url`.
    pub async fn resolve_url(&self, url: &str) -> ResolveResult<Resolution> {
        self.resolve(FetchRequest::get(url)).await
    }

    /// Resolve a request.
    pub async fn resolve(&self, request: FetchRequest) -> ResolveResult<Resolution> {
        let parsed = match self.filter.classify(&request.url).map_err(FetchError::from)? {
            RequestScope::Managed(parsed) => parsed,
            RequestScope::Passthrough(reason) => return self.passthrough(request, reason).await,
        };

        let method = request.method;
        let key = RequestKey::new(method, &parsed);
        let url = parsed.canonical();
        let request = request.with_url(url.clone());
        let mode = self.modes.current();
        // Only GETs are ever stored, so other methods never look anything up.
        let uses_cache = method == Method::Get;

        debug!(key = %key, mode = %mode, "resolving");

        if mode == ResolutionMode::CacheFirst && uses_cache {
            if let Some(entry) = self.lookup(&key).await {
                debug!(key = %key, "cache hit");
                self.emit(ResolutionEvent::CacheHit { key: key.to_string() });
                return Ok(Resolution::from_cache(entry, ResolutionSource::Cache, mode, key));
            }
            debug!(key = %key, "cache miss, trying network");
            self.emit(ResolutionEvent::CacheMiss { key: key.to_string() });
        }

        let start = Instant::now();
        let outcome = {
            let _timer = self
                .timers
                .arm(RequestId::generate(), key.as_str(), self.timeouts.network);
            with_deadline(self.timeouts.network, self.transport.send(request)).await
        };

        let failure = match outcome {
            Ok(Ok(response)) => {
                let elapsed = start.elapsed();
                debug!(key = %key, status = response.status, elapsed_ms = elapsed.as_millis() as u64, "network answered");
                self.emit(ResolutionEvent::NetworkSuccess {
                    key: key.to_string(),
                    elapsed,
                });
                self.persist(&key, method, &response).await;
                return Ok(Resolution {
                    response: ExplainHeaders::new(ResolutionSource::Network).apply(response),
                    source: ResolutionSource::Network,
                    mode,
                    key: Some(key),
                });
            }
            Ok(Err(error)) => {
                warn!(key = %key, error = %error, "network failed, trying cache");
                self.emit(ResolutionEvent::NetworkError {
                    key: key.to_string(),
                    error: error.to_string(),
                });
                ResolveError::Network(error)
            }
            Err(DeadlineExceeded(deadline)) => {
                warn!(key = %key, deadline_ms = deadline.as_millis() as u64, "network deadline exceeded, trying cache");
                self.emit(ResolutionEvent::NetworkTimeout {
                    key: key.to_string(),
                    deadline,
                });
                ResolveError::Timeout { url, deadline }
            }
        };

        if uses_cache {
            if let Some(entry) = self.lookup(&key).await {
                debug!(key = %key, "served from fallback cache");
                self.emit(ResolutionEvent::FallbackHit { key: key.to_string() });
                return Ok(Resolution::from_cache(entry, ResolutionSource::Fallback, mode, key));
            }
        }

        self.emit(ResolutionEvent::Failed {
            key: key.to_string(),
            timed_out: failure.is_timeout(),
        });
        Err(failure)
    }

    async fn passthrough(
        &self,
        request: FetchRequest,
        reason: PassthroughReason,
    ) -> ResolveResult<Resolution> {
        debug!(url = %request.url, reason = ?reason, "passthrough");
        self.emit(ResolutionEvent::Passthrough {
            url: request.url.clone(),
        });
        let response = self.transport.send(request).await?;
        Ok(Resolution {
            response: ExplainHeaders::new(ResolutionSource::Passthrough).apply(response),
            source: ResolutionSource::Passthrough,
            mode: self.modes.current(),
            key: None,
        })
    }

    /// Cache read; a failing store counts as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<CachedResponse> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(error) => {
                warn!(key = %key, error = %error, "cache read failed, treating as miss");
                self.emit(ResolutionEvent::CacheReadFailed {
                    key: key.to_string(),
                    error: error.to_string(),
                });
                None
            }
        }
    }

    /// Best-effort store of a network response.
    async fn persist(&self, key: &RequestKey, method: Method, response: &FetchResponse) {
        let cacheability = Cacheability::of(method, response);
        if !cacheability.is_cacheable() {
            debug!(key = %key, reason = ?cacheability, "response not stored");
            return;
        }

        if let Err(error) = self
            .store
            .put(key, CachedResponse::from_response(response))
            .await
        {
            warn!(key = %key, error = %error, "cache write failed");
            self.emit(ResolutionEvent::CacheWriteFailed {
                key: key.to_string(),
                error: error.to_string(),
            });
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("origin", self.filter.origin())
            .field("timeouts", &self.timeouts)
            .field("mode", &self.modes.current())
            .field("pending_timers", &self.timers.pending())
            .finish()
    }
}
