//! Bounded-timeout responsiveness probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brownout_core::{EngineConfig, FetchRequest};
use brownout_data::{with_deadline, TimeoutConfig, Transport};
use chrono::Utc;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::quality::QualityClassification;

/// How a probe ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Answered under the latency ceiling.
    Responsive,
    /// Answered within the deadline but above the latency ceiling.
    Sluggish,
    /// No answer within the deadline.
    TimedOut,
    /// Transport failure.
    Failed(String),
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub outcome: ProbeOutcome,
    /// Time spent waiting, capped at the deadline.
    #[serde(rename = "latency_ms", serialize_with = "duration_ms::serialize")]
    pub latency: Duration,
}

impl ProbeReport {
    pub fn new(outcome: ProbeOutcome, latency: Duration) -> Self {
        Self { outcome, latency }
    }

    /// Any answer other than a fast one counts as slow.
    pub fn classification(&self) -> QualityClassification {
        match self.outcome {
            ProbeOutcome::Responsive => QualityClassification::Good,
            _ => QualityClassification::Slow,
        }
    }

    /// Whether the probe got no answer at all.
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::TimedOut | ProbeOutcome::Failed(_))
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Measures whether the network answers quickly.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run one probe. Never fails; failures are reported in the outcome.
    async fn probe(&self) -> ProbeReport;
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for Arc<P> {
    async fn probe(&self) -> ProbeReport {
        (**self).probe().await
    }
}

/// Probe that fetches a small same-origin resource through a transport.
///
/// Each request carries a cache-busting query parameter and
/// `cache-control: no-store` so that intermediaries cannot answer it.
pub struct TransportProbe<T> {
    transport: T,
    url: String,
    timeout: Duration,
    latency_ceiling: Duration,
}

impl<T: Transport> TransportProbe<T> {
    pub fn new(transport: T, url: impl Into<String>, timeouts: &TimeoutConfig) -> Self {
        Self {
            transport,
            url: url.into(),
            timeout: timeouts.probe,
            latency_ceiling: timeouts.probe_latency_ceiling,
        }
    }

    /// Probe `config.probe_url()` with the configured deadlines.
    pub fn from_config(transport: T, config: &EngineConfig) -> Self {
        Self::new(transport, config.probe_url(), &TimeoutConfig::from_config(config))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn cache_busting_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}_={}", self.url, separator, Utc::now().timestamp_millis())
    }
}

#[async_trait]
impl<T: Transport> Probe for TransportProbe<T> {
    async fn probe(&self) -> ProbeReport {
        let request = FetchRequest::get(self.cache_busting_url())
            .with_header("cache-control", "no-store");
        let start = Instant::now();

        let outcome = match with_deadline(self.timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => {
                let latency = start.elapsed();
                debug!(status = response.status, latency_ms = latency.as_millis() as u64, "probe answered");
                if latency < self.latency_ceiling {
                    ProbeOutcome::Responsive
                } else {
                    ProbeOutcome::Sluggish
                }
            }
            Ok(Err(e)) => {
                warn!(url = %self.url, error = %e, "probe failed");
                ProbeOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(url = %self.url, timeout_ms = self.timeout.as_millis() as u64, "probe timed out");
                ProbeOutcome::TimedOut
            }
        };

        ProbeReport::new(outcome, start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use brownout_core::FetchResponse;
    use brownout_data::FetchError;

    use super::*;

    struct DelayedTransport {
        delay: Duration,
        result: Result<u16, FetchError>,
        seen: Mutex<Vec<FetchRequest>>,
    }

    impl DelayedTransport {
        fn new(delay_ms: u64, result: Result<u16, FetchError>) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                result,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for DelayedTransport {
        async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
            self.seen.lock().unwrap().push(request);
            tokio::time::sleep(self.delay).await;
            self.result.clone().map(FetchResponse::new)
        }
    }

    fn probe(transport: DelayedTransport) -> TransportProbe<DelayedTransport> {
        TransportProbe::new(
            transport,
            "https://weather.example/favicon.ico",
            &TimeoutConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_answer_is_good() {
        let report = probe(DelayedTransport::new(200, Ok(200))).probe().await;
        assert_eq!(report.outcome, ProbeOutcome::Responsive);
        assert_eq!(report.classification(), QualityClassification::Good);
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_status_counts_as_an_answer() {
        let report = probe(DelayedTransport::new(10, Ok(404))).probe().await;
        assert_eq!(report.classification(), QualityClassification::Good);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_answer_is_slow() {
        let report = probe(DelayedTransport::new(1_200, Ok(200))).probe().await;
        assert_eq!(report.outcome, ProbeOutcome::Sluggish);
        assert_eq!(report.classification(), QualityClassification::Slow);
        assert!(!report.is_failure());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_slow() {
        let report = probe(DelayedTransport::new(5_000, Ok(200))).probe().await;
        assert_eq!(report.outcome, ProbeOutcome::TimedOut);
        assert_eq!(report.latency, Duration::from_millis(1_500));
        assert_eq!(report.classification(), QualityClassification::Slow);
        assert!(report.is_failure());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_slow() {
        let transport = DelayedTransport::new(0, Err(FetchError::Connection("refused".into())));
        let report = probe(transport).probe().await;
        assert!(matches!(report.outcome, ProbeOutcome::Failed(_)));
        assert_eq!(report.classification(), QualityClassification::Slow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_bypasses_caches() {
        let probe = probe(DelayedTransport::new(0, Ok(200)));
        probe.probe().await;
        let seen = probe.transport.seen.lock().unwrap();
        assert!(seen[0].url.starts_with("https://weather.example/favicon.ico?_="));
        assert_eq!(seen[0].header("Cache-Control"), Some("no-store"));
    }
}
