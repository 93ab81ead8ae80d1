#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use brownout_cache::{
    CacheError, CacheResult, CacheStore, CachedResponse, MemoryCacheStore, RequestKey,
};
use brownout_core::{
    EngineConfig, FetchRequest, FetchResponse, Origin, ResolutionEvent, ResolutionObserver,
};
use brownout_data::{FetchError, Transport};
use brownout_monitor::{QualityClassification, QualityHandle};
use brownout_resolver::{ModeController, Resolver};

pub const ORIGIN: &str = "https://weather.example";

pub fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

pub fn key(path: &str) -> RequestKey {
    RequestKey::from_raw(format!("GET {}", url(path)))
}

pub fn config() -> EngineConfig {
    EngineConfig::for_origin(Origin::parse(ORIGIN).unwrap())
        .with_third_party_host("api.openweathermap.org")
}

/// What the scripted transport does for a URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond { delay: Duration, response: FetchResponse },
    Fail { delay: Duration, error: FetchError },
    Hang,
}

impl Reply {
    pub fn ok(delay_ms: u64, body: &str) -> Self {
        Self::Respond {
            delay: Duration::from_millis(delay_ms),
            response: FetchResponse::ok_with_body(body.to_string()),
        }
    }

    pub fn status(delay_ms: u64, status: u16) -> Self {
        Self::Respond {
            delay: Duration::from_millis(delay_ms),
            response: FetchResponse::new(status),
        }
    }

    pub fn fail(delay_ms: u64, error: FetchError) -> Self {
        Self::Fail {
            delay: Duration::from_millis(delay_ms),
            error,
        }
    }
}

/// Transport answering from a per-URL script, counting calls and aborts.
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
    completed: AtomicUsize,
    aborted: Arc<AtomicUsize>,
    seen: Mutex<Vec<FetchRequest>>,
}

impl ScriptedTransport {
    pub fn new(fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(HashMap::new()),
            fallback,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            aborted: Arc::new(AtomicUsize::new(0)),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn route(&self, url: impl Into<String>, reply: Reply) {
        self.replies.lock().unwrap().insert(url.into(), reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<FetchRequest> {
        self.seen.lock().unwrap().clone()
    }
}

struct InFlight {
    aborted: Arc<AtomicUsize>,
    done: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.done {
            self.aborted.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        let mut in_flight = InFlight {
            aborted: Arc::clone(&self.aborted),
            done: false,
        };
        let result = match reply {
            Reply::Respond { delay, response } => {
                tokio::time::sleep(delay).await;
                Ok(response.with_url(request.url))
            }
            Reply::Fail { delay, error } => {
                tokio::time::sleep(delay).await;
                Err(error)
            }
            Reply::Hang => std::future::pending().await,
        };
        in_flight.done = true;
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Memory store whose reads or writes can be made to fail.
pub struct FlakyStore {
    inner: MemoryCacheStore,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub reads: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCacheStore::new("brownout-test").unwrap(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn seed(&self, path: &str, body: &str) {
        self.inner
            .put(
                &key(path),
                CachedResponse::from_response(&FetchResponse::ok_with_body(body.to_string())),
            )
            .await
            .unwrap();
    }

    pub async fn keys_len(&self) -> usize {
        self.inner.keys().await.unwrap().len()
    }

    pub async fn body(&self, path: &str) -> Option<String> {
        self.inner
            .get(&key(path))
            .await
            .unwrap()
            .map(|entry| String::from_utf8_lossy(&entry.body).into_owned())
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    async fn get(&self, key: &RequestKey) -> CacheResult<Option<CachedResponse>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Storage("store unavailable".into()));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &RequestKey, entry: CachedResponse) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Storage("quota exceeded".into()));
        }
        self.inner.put(key, entry).await
    }

    async fn delete(&self, key: &RequestKey) -> CacheResult<bool> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> CacheResult<Vec<RequestKey>> {
        self.inner.keys().await
    }

    async fn clear(&self) -> CacheResult<()> {
        self.inner.clear().await
    }
}

/// Observer recording every event.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<ResolutionEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ResolutionObserver for Recorder {
    fn on_event(&self, event: &ResolutionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<FlakyStore>,
    pub recorder: Arc<Recorder>,
    pub resolver: Resolver,
}

pub fn harness(classification: QualityClassification, fallback: Reply) -> Harness {
    let transport = ScriptedTransport::new(fallback);
    let store = FlakyStore::new();
    let recorder = Arc::new(Recorder::default());
    let modes = ModeController::new(QualityHandle::fixed(classification));
    let resolver = Resolver::new(&config(), transport.clone(), store.clone(), modes)
        .with_observer(recorder.clone());
    Harness {
        transport,
        store,
        recorder,
        resolver,
    }
}
