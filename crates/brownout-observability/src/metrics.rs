//! Resolution counters.

use std::sync::atomic::{AtomicU64, Ordering};

use brownout_core::{ResolutionEvent, ResolutionObserver};
use serde::{Deserialize, Serialize};

/// Lock-free counters for resolution outcomes and probes.
///
/// Register as a `ResolutionObserver`; probe outcomes are recorded with
/// `record_probe`.
#[derive(Debug, Default)]
pub struct ResolutionMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    network_successes: AtomicU64,
    network_timeouts: AtomicU64,
    network_errors: AtomicU64,
    fallbacks_served: AtomicU64,
    failed_timeouts: AtomicU64,
    failed_errors: AtomicU64,
    passthroughs: AtomicU64,
    cache_write_failures: AtomicU64,
    cache_read_failures: AtomicU64,
    probe_runs: AtomicU64,
    probe_failures: AtomicU64,
    network_time_us: AtomicU64,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one probe run.
    pub fn record_probe(&self, failed: bool) {
        self.probe_runs.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.probe_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let get = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let network_successes = get(&self.network_successes);
        MetricsSnapshot {
            cache_hits: get(&self.cache_hits),
            cache_misses: get(&self.cache_misses),
            network_successes,
            network_timeouts: get(&self.network_timeouts),
            network_errors: get(&self.network_errors),
            fallbacks_served: get(&self.fallbacks_served),
            failed_timeouts: get(&self.failed_timeouts),
            failed_errors: get(&self.failed_errors),
            passthroughs: get(&self.passthroughs),
            cache_write_failures: get(&self.cache_write_failures),
            cache_read_failures: get(&self.cache_read_failures),
            probe_runs: get(&self.probe_runs),
            probe_failures: get(&self.probe_failures),
            avg_network_ms: if network_successes == 0 {
                None
            } else {
                Some(get(&self.network_time_us) as f64 / network_successes as f64 / 1000.0)
            },
        }
    }
}

impl ResolutionObserver for ResolutionMetrics {
    fn on_event(&self, event: &ResolutionEvent) {
        let counter = match event {
            ResolutionEvent::CacheHit { .. } => &self.cache_hits,
            ResolutionEvent::CacheMiss { .. } => &self.cache_misses,
            ResolutionEvent::NetworkSuccess { elapsed, .. } => {
                self.network_time_us
                    .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
                &self.network_successes
            }
            ResolutionEvent::NetworkTimeout { .. } => &self.network_timeouts,
            ResolutionEvent::NetworkError { .. } => &self.network_errors,
            ResolutionEvent::FallbackHit { .. } => &self.fallbacks_served,
            ResolutionEvent::Failed { timed_out: true, .. } => &self.failed_timeouts,
            ResolutionEvent::Failed { timed_out: false, .. } => &self.failed_errors,
            ResolutionEvent::Passthrough { .. } => &self.passthroughs,
            ResolutionEvent::CacheWriteFailed { .. } => &self.cache_write_failures,
            ResolutionEvent::CacheReadFailed { .. } => &self.cache_read_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of `ResolutionMetrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub network_successes: u64,
    pub network_timeouts: u64,
    pub network_errors: u64,
    pub fallbacks_served: u64,
    /// Timeouts surfaced to the caller after the fallback missed.
    pub failed_timeouts: u64,
    /// Transport errors surfaced to the caller after the fallback missed.
    pub failed_errors: u64,
    pub passthroughs: u64,
    pub cache_write_failures: u64,
    pub cache_read_failures: u64,
    pub probe_runs: u64,
    pub probe_failures: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_network_ms: Option<f64>,
}

impl MetricsSnapshot {
    /// Resolutions that produced a response or an error (passthrough excluded).
    pub fn resolutions(&self) -> u64 {
        self.cache_hits
            + self.network_successes
            + self.fallbacks_served
            + self.failed_timeouts
            + self.failed_errors
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as JSON (pretty printed).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Resolutions: {}", self.resolutions()));
        lines.push(format!(
            "  Cache: {} hit, {} miss",
            self.cache_hits, self.cache_misses
        ));

        match self.avg_network_ms {
            Some(avg) => lines.push(format!(
                "  Network: {} ok ({:.2}ms avg), {} timeout, {} error",
                self.network_successes, avg, self.network_timeouts, self.network_errors
            )),
            None => lines.push(format!(
                "  Network: {} ok, {} timeout, {} error",
                self.network_successes, self.network_timeouts, self.network_errors
            )),
        }

        lines.push(format!("  Fallbacks served: {}", self.fallbacks_served));

        if self.failed_timeouts + self.failed_errors > 0 {
            lines.push(format!(
                "  Failed: {} timeout, {} error",
                self.failed_timeouts, self.failed_errors
            ));
        }

        if self.passthroughs > 0 {
            lines.push(format!("  Passthrough: {}", self.passthroughs));
        }

        if self.cache_write_failures + self.cache_read_failures > 0 {
            lines.push(format!(
                "  Cache failures: {} write, {} read",
                self.cache_write_failures, self.cache_read_failures
            ));
        }

        lines.push(format!(
            "  Probes: {} run, {} failed",
            self.probe_runs, self.probe_failures
        ));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn key() -> String {
        "GET https://weather.example/data.json".to_string()
    }

    #[test]
    fn test_counts_events() {
        let metrics = ResolutionMetrics::new();
        metrics.on_event(&ResolutionEvent::CacheMiss { key: key() });
        metrics.on_event(&ResolutionEvent::NetworkSuccess {
            key: key(),
            elapsed: Duration::from_millis(200),
        });
        metrics.on_event(&ResolutionEvent::NetworkTimeout {
            key: key(),
            deadline: Duration::from_secs(3),
        });
        metrics.on_event(&ResolutionEvent::FallbackHit { key: key() });
        metrics.on_event(&ResolutionEvent::Failed {
            key: key(),
            timed_out: true,
        });
        metrics.record_probe(false);
        metrics.record_probe(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.network_successes, 1);
        assert_eq!(snapshot.network_timeouts, 1);
        assert_eq!(snapshot.fallbacks_served, 1);
        assert_eq!(snapshot.failed_timeouts, 1);
        assert_eq!(snapshot.failed_errors, 0);
        assert_eq!(snapshot.resolutions(), 3);
        assert_eq!(snapshot.avg_network_ms, Some(200.0));
        assert_eq!(snapshot.probe_runs, 2);
        assert_eq!(snapshot.probe_failures, 1);
    }

    #[test]
    fn test_renderings() {
        let metrics = ResolutionMetrics::new();
        metrics.on_event(&ResolutionEvent::Passthrough {
            url: "https://api.openweathermap.org/".into(),
        });
        let snapshot = metrics.snapshot();

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json()).unwrap();
        assert_eq!(json["passthroughs"], 1);
        assert!(json.get("avg_network_ms").is_none());

        let summary = snapshot.to_summary();
        assert!(summary.starts_with("Resolutions: 0"));
        assert!(summary.contains("Passthrough: 1"));
        assert!(!summary.contains("Failed"));
    }
}
