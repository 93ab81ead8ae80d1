//! Deadlines for network and probe calls.

use std::future::Future;
use std::time::Duration;

use brownout_core::EngineConfig;

/// Deadlines used by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Network stage of a resolution.
    pub network: Duration,
    /// Whole quality probe.
    pub probe: Duration,
    /// Probe latency above which the connection counts as slow.
    pub probe_latency_ceiling: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(network: Duration, probe: Duration, probe_latency_ceiling: Duration) -> Self {
        Self {
            network,
            probe,
            probe_latency_ceiling,
        }
    }

    /// Take the deadlines from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            network: config.network_timeout(),
            probe: config.probe_timeout(),
            probe_latency_ceiling: config.probe_latency_ceiling(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            network: Duration::from_millis(3_000),
            probe: Duration::from_millis(1_500),
            probe_latency_ceiling: Duration::from_millis(1_000),
        }
    }
}

/// A deadline elapsed before the guarded future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` with a deadline. On expiry the future is dropped, which
/// aborts whatever it was waiting on.
pub async fn with_deadline<F: Future>(
    deadline: Duration,
    fut: F,
) -> Result<F::Output, DeadlineExceeded> {
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| DeadlineExceeded(deadline))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            network_timeout_ms: 4_000,
            probe_timeout_ms: 2_000,
            ..Default::default()
        };
        let timeouts = TimeoutConfig::from_config(&config);
        assert_eq!(timeouts.network, Duration::from_secs(4));
        assert_eq!(timeouts.probe, Duration::from_secs(2));
        assert_eq!(timeouts.probe_latency_ceiling, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_completes_in_time() {
        let result = with_deadline(Duration::from_millis(100), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            7
        })
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_expires() {
        let start = tokio::time::Instant::now();
        let result = with_deadline(Duration::from_millis(100), std::future::pending::<()>()).await;
        assert_eq!(result, Err(DeadlineExceeded(Duration::from_millis(100))));
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }
}
