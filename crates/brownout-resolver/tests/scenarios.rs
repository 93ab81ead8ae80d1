//! End-to-end resolution scenarios on the paused clock.

mod common;

use std::time::Duration;

use brownout_cache::header_names;
use brownout_core::{ResolutionEvent, ResolutionSource};
use brownout_monitor::QualityClassification;
use brownout_resolver::{ResolutionMode, ResolveError};
use tokio::time::Instant;

use common::{harness, url, Reply};

#[tokio::test(start_paused = true)]
async fn scenario_a_offline_serves_cache_without_network() {
    let h = harness(QualityClassification::Offline, Reply::ok(10, "fresh"));
    h.store.seed("/data.json", "cached").await;

    let resolution = h.resolver.resolve_url("/data.json").await.unwrap();

    assert_eq!(resolution.source, ResolutionSource::Cache);
    assert_eq!(resolution.mode, ResolutionMode::CacheFirst);
    assert_eq!(resolution.response.text(), "cached");
    assert_eq!(h.transport.calls(), 0);
    assert_eq!(
        resolution.response.header(header_names::X_BROWNOUT_SOURCE),
        Some("cache")
    );
    assert!(resolution
        .response
        .header(header_names::X_BROWNOUT_STORED_AT)
        .is_some());
}

#[tokio::test(start_paused = true)]
async fn scenario_b_good_network_success_is_cached() {
    let h = harness(QualityClassification::Good, Reply::ok(200, "fresh"));
    let start = Instant::now();

    let resolution = h.resolver.resolve_url("/data.json").await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(200));
    assert_eq!(resolution.source, ResolutionSource::Network);
    assert_eq!(resolution.response.text(), "fresh");
    assert_eq!(h.store.body("/data.json").await.as_deref(), Some("fresh"));
    assert_eq!(h.store.reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn scenario_c_hanging_network_falls_back_at_deadline() {
    let h = harness(QualityClassification::Good, Reply::Hang);
    h.store.seed("/data.json", "stale").await;
    let start = Instant::now();

    let resolution = h.resolver.resolve_url("/data.json").await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(3_000));
    assert_eq!(resolution.source, ResolutionSource::Fallback);
    assert_eq!(resolution.response.text(), "stale");
    assert_eq!(h.transport.aborted(), 1);
    assert_eq!(h.resolver.timers().pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn scenario_d_slow_cache_miss_goes_to_network() {
    let h = harness(QualityClassification::Slow, Reply::ok(500, "fresh"));
    let start = Instant::now();

    let resolution = h.resolver.resolve_url("/data.json").await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(500));
    assert_eq!(resolution.source, ResolutionSource::Network);
    assert_eq!(resolution.mode, ResolutionMode::CacheFirst);
    assert_eq!(h.store.reads(), 1);
    assert_eq!(h.transport.calls(), 1);
    assert_eq!(h.store.body("/data.json").await.as_deref(), Some("fresh"));

    let key = common::key("/data.json").to_string();
    assert_eq!(
        h.recorder.events(),
        vec![
            ResolutionEvent::CacheMiss { key: key.clone() },
            ResolutionEvent::NetworkSuccess {
                key,
                elapsed: Duration::from_millis(500)
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn good_quality_never_prefers_cache() {
    let h = harness(QualityClassification::Good, Reply::ok(50, "fresh"));
    h.store.seed("/data.json", "cached").await;

    let resolution = h.resolver.resolve_url("/data.json").await.unwrap();

    assert_eq!(resolution.source, ResolutionSource::Network);
    assert_eq!(resolution.response.text(), "fresh");
    assert_eq!(h.store.reads(), 0);
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_quality_is_network_first() {
    let h = harness(QualityClassification::Unknown, Reply::ok(50, "fresh"));
    h.store.seed("/data.json", "cached").await;

    let resolution = h.resolver.resolve_url("/data.json").await.unwrap();
    assert_eq!(resolution.mode, ResolutionMode::NetworkFirst);
    assert_eq!(resolution.source, ResolutionSource::Network);
}

#[tokio::test(start_paused = true)]
async fn forced_cache_first_overrides_good_quality() {
    let h = harness(QualityClassification::Good, Reply::ok(50, "fresh"));
    h.store.seed("/data.json", "cached").await;

    h.resolver.modes().enable_cache_first();
    let forced = h.resolver.resolve_url("/data.json").await.unwrap();
    assert_eq!(forced.source, ResolutionSource::Cache);
    assert!(h.resolver.network_status().cache_first_mode);

    h.resolver.modes().disable_cache_first();
    let released = h.resolver.resolve_url("/data.json").await.unwrap();
    assert_eq!(released.source, ResolutionSource::Network);
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn network_error_falls_back_to_cache() {
    let error = brownout_data::FetchError::Connection("connection reset".into());
    let h = harness(QualityClassification::Good, Reply::fail(100, error));
    h.store.seed("/data.json", "stale").await;
    let start = Instant::now();

    let resolution = h.resolver.resolve_url("/data.json").await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(100));
    assert_eq!(resolution.source, ResolutionSource::Fallback);
    assert_eq!(
        resolution.response.header(header_names::X_BROWNOUT_SOURCE),
        Some("fallback")
    );
}

#[tokio::test(start_paused = true)]
async fn third_party_requests_pass_through() {
    let h = harness(QualityClassification::Offline, Reply::ok(10, "weather"));
    let target = "https://api.openweathermap.org/data/2.5/weather?q=Oslo";

    let resolution = h.resolver.resolve_url(target).await.unwrap();

    assert_eq!(resolution.source, ResolutionSource::Passthrough);
    assert_eq!(resolution.key, None);
    assert_eq!(h.store.reads(), 0);
    assert_eq!(h.transport.seen()[0].url, target);
    assert_eq!(
        h.recorder.events(),
        vec![ResolutionEvent::Passthrough {
            url: target.to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn passthrough_errors_are_not_masked_by_cache() {
    let error = brownout_data::FetchError::Connection("dns".into());
    let h = harness(QualityClassification::Good, Reply::fail(0, error.clone()));
    let result = h.resolver.resolve_url("https://cdn.example.net/app.js").await;
    assert_eq!(result.unwrap_err(), ResolveError::Network(error));
}

#[tokio::test(start_paused = true)]
async fn relative_and_absolute_urls_share_a_key() {
    let h = harness(QualityClassification::Good, Reply::ok(10, "fresh"));

    h.resolver.resolve_url("/data.json#top").await.unwrap();
    h.resolver.modes().enable_cache_first();
    let hit = h
        .resolver
        .resolve_url(&url("/data.json").replace("https://weather", "HTTPS://WEATHER"))
        .await
        .unwrap();

    assert_eq!(hit.source, ResolutionSource::Cache);
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn url_in_query_string_stays_same_origin() {
    let h = harness(QualityClassification::Good, Reply::ok(10, "home"));

    let resolution = h
        .resolver
        .resolve_url("/redirect?next=https://weather.example/home")
        .await
        .unwrap();

    assert_eq!(resolution.source, ResolutionSource::Network);
    assert_eq!(
        resolution.key.unwrap().as_str(),
        "GET https://weather.example/redirect?next=https://weather.example/home"
    );
    assert_eq!(h.transport.calls(), 1);
}
