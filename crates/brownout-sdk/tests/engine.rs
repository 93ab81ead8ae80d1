//! Engine wiring: monitor → status channel → resolver.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use brownout_sdk::prelude::*;
use serde_json::json;

const ORIGIN: &str = "https://weather.example";

/// Answers by URL prefix; counts calls per prefix.
struct PrefixTransport {
    routes: Vec<(String, u64, String)>,
    calls: Mutex<Vec<String>>,
}

impl PrefixTransport {
    fn new() -> Self {
        Self {
            routes: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn route(mut self, path: &str, delay_ms: u64, body: &str) -> Self {
        self.routes
            .push((format!("{}{}", ORIGIN, path), delay_ms, body.to_string()));
        self
    }

    fn calls_to(&self, path: &str) -> usize {
        let prefix = format!("{}{}", ORIGIN, path);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.starts_with(&prefix))
            .count()
    }
}

#[async_trait]
impl Transport for PrefixTransport {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(request.url.clone());
        let route = self
            .routes
            .iter()
            .find(|(prefix, _, _)| request.url.starts_with(prefix.as_str()))
            .cloned();
        match route {
            Some((_, delay, body)) => {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(FetchResponse::ok_with_body(body).with_url(request.url))
            }
            None => Err(FetchError::Connection("no route".into())),
        }
    }
}

fn config() -> EngineConfig {
    EngineConfig::for_origin(Origin::parse(ORIGIN).unwrap())
}

fn record(engine: &Engine) -> Arc<Mutex<Vec<StatusMode>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.on_status_change(move |status| sink.lock().unwrap().push(status.mode));
    seen
}

fn modes(seen: &Arc<Mutex<Vec<StatusMode>>>) -> Vec<StatusMode> {
    seen.lock().unwrap().clone()
}

#[tokio::test(start_paused = true)]
async fn scenario_e_online_transition_leaves_cache_first_within_one_probe() {
    let transport = Arc::new(
        PrefixTransport::new()
            .route("/favicon.ico", 200, "")
            .route("/data.json", 50, "fresh"),
    );
    let engine = Engine::builder(config())
        .transport(Arc::clone(&transport))
        .start()
        .await
        .unwrap();
    let seen = record(&engine);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!engine.network_status().cache_first_mode);

    engine.signal(PlatformSignal::Offline).await.unwrap();
    assert!(engine.network_status().cache_first_mode);
    assert!(!engine.network_status().is_online);

    engine.signal(PlatformSignal::Online).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(engine.network_status().is_online);
    assert!(engine.network_status().cache_first_mode);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let status = engine.network_status();
    assert!(!status.cache_first_mode);
    assert_eq!(status.classification, QualityClassification::Good);

    assert_eq!(
        modes(&seen),
        vec![StatusMode::Good, StatusMode::Offline, StatusMode::Good]
    );
    assert_eq!(transport.calls_to("/favicon.ico"), 2);
    assert_eq!(engine.metrics().probe_runs, 2);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unchanged_quality_is_not_republished() {
    let transport = PrefixTransport::new().route("/favicon.ico", 10, "");
    let engine = Engine::builder(config())
        .transport(transport)
        .start()
        .await
        .unwrap();
    let seen = record(&engine);

    // Initial probe plus two periodic probes, all good.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(engine.metrics().probe_runs, 3);
    assert_eq!(modes(&seen), vec![StatusMode::Good]);

    let refreshed = engine.refresh().await.unwrap().unwrap();
    assert_eq!(refreshed.mode, StatusMode::Good);
    assert_eq!(refreshed.retract_after(), Some(Duration::from_secs(3)));
    assert_eq!(modes(&seen), vec![StatusMode::Good, StatusMode::Good]);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_probe_switches_to_cache_first() {
    let transport = Arc::new(
        PrefixTransport::new()
            .route("/favicon.ico", 1_200, "")
            .route("/data.json", 100, "fresh"),
    );
    let engine = Engine::builder(config())
        .transport(Arc::clone(&transport))
        .start()
        .await
        .unwrap();
    let seen = record(&engine);

    tokio::time::sleep(Duration::from_millis(1_300)).await;
    assert!(engine.network_status().is_slow_connection);
    assert_eq!(modes(&seen), vec![StatusMode::Slow]);

    // Cache miss, then network; the response is cached.
    let first = engine.resolve("/data.json").await.unwrap();
    assert_eq!(first.source, ResolutionSource::Network);
    assert_eq!(first.mode, ResolutionMode::CacheFirst);

    let second = engine.resolve("/data.json").await.unwrap();
    assert_eq!(second.source, ResolutionSource::Cache);
    assert_eq!(transport.calls_to("/data.json"), 1);

    let metrics = engine.metrics();
    assert_eq!(metrics.cache_misses, 1);
    assert_eq!(metrics.cache_hits, 1);
    assert_eq!(metrics.network_successes, 1);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn offline_start_with_hint_and_override() {
    let transport = Arc::new(PrefixTransport::new().route("/", 10, "ok"));
    let engine = Engine::builder(config())
        .transport(Arc::clone(&transport))
        .hint(ConnectionHint::from_effective_type("4g").unwrap())
        .starting_offline()
        .start()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.status().map(|s| s.mode), Some(StatusMode::Offline));
    assert_eq!(transport.calls_to("/favicon.ico"), 0);

    // The platform hint applies at once on the way back online.
    engine.signal(PlatformSignal::Online).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(engine.quality().current(), QualityClassification::Good);

    engine
        .signal(PlatformSignal::ConnectionChanged(json!({ "effectiveType": "2g" })))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(engine.network_status().is_slow_connection);

    engine.enable_cache_first();
    engine
        .signal(PlatformSignal::ConnectionChanged(json!({ "effectiveType": "4g" })))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(engine.network_status().cache_first_mode);
    engine.disable_cache_first();
    assert!(!engine.network_status().cache_first_mode);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_callbacks_are_not_called() {
    let transport = PrefixTransport::new().route("/favicon.ico", 10, "");
    let engine = Engine::builder(config())
        .transport(transport)
        .start()
        .await
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = engine.on_status_change(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(engine.unsubscribe(id));

    tokio::time::sleep(Duration::from_millis(50)).await;
    engine.signal(PlatformSignal::Offline).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.status().map(|s| s.mode), Some(StatusMode::Offline));

    engine.shutdown().await;
}

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config().with_cache_dir(dir.path());

    let engine = Engine::builder(config.clone())
        .transport(
            PrefixTransport::new()
                .route("/favicon.ico", 0, "")
                .route("/data.json", 0, "persisted"),
        )
        .start()
        .await
        .unwrap();
    engine.resolve("/data.json").await.unwrap();
    engine.shutdown().await;

    let offline = Engine::builder(config)
        .transport(PrefixTransport::new())
        .starting_offline()
        .start()
        .await
        .unwrap();
    let resolution = offline.resolve("/data.json").await.unwrap();
    assert_eq!(resolution.source, ResolutionSource::Cache);
    assert_eq!(resolution.response.text(), "persisted");
    assert_eq!(offline.store().keys().await.unwrap().len(), 1);
    offline.shutdown().await;
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let config = EngineConfig {
        probe_timeout_ms: 5_000,
        ..config()
    };
    let result = Engine::builder(config)
        .transport(PrefixTransport::new())
        .start()
        .await;
    assert!(matches!(result, Err(EngineError::Config(_))));
}
