//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::url::Origin;

/// Errors from configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("probe timeout ({probe_ms}ms) must be shorter than the network deadline ({network_ms}ms)")]
    ProbeTimeoutTooLong { probe_ms: u64, network_ms: u64 },

    #[error("probe latency ceiling ({ceiling_ms}ms) must not exceed the probe timeout ({probe_ms}ms)")]
    LatencyCeilingTooLong { ceiling_ms: u64, probe_ms: u64 },

    #[error("cache namespace must not be empty")]
    EmptyNamespace,

    #[error("probe path must start with '/': {0}")]
    InvalidProbePath(String),
}

/// Configuration for the resolution engine.
///
/// Durations are stored in milliseconds so the file format stays flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base origin for relative URLs and same-origin checks.
    #[serde(default = "default_origin")]
    pub origin: Origin,

    /// Host patterns (supports `*`) whose requests bypass the engine.
    #[serde(default)]
    pub third_party_hosts: Vec<String>,

    /// Logical cache namespace.
    #[serde(default = "default_namespace")]
    pub cache_namespace: String,

    /// Directory for the persistent cache store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Same-origin path fetched by the quality probe.
    #[serde(default = "default_probe_path")]
    pub probe_path: String,

    /// Interval between periodic probes.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,

    /// Probe deadline.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Probe latency above which the connection counts as slow.
    #[serde(default = "default_probe_latency_ceiling_ms")]
    pub probe_latency_ceiling_ms: u64,

    /// Deadline for the network stage of a resolution.
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,

    /// How long subscribers keep a `good` indication visible.
    #[serde(default = "default_good_grace_ms")]
    pub good_grace_ms: u64,

    /// Effective connection types treated as slow.
    #[serde(default = "default_slow_effective_types")]
    pub slow_effective_types: Vec<String>,
}

fn default_origin() -> Origin {
    Origin::new("http", "localhost", None)
}

fn default_namespace() -> String {
    "brownout-v1".to_string()
}

fn default_probe_path() -> String {
    "/favicon.ico".to_string()
}

fn default_probe_interval_ms() -> u64 {
    30_000
}

fn default_probe_timeout_ms() -> u64 {
    1_500
}

fn default_probe_latency_ceiling_ms() -> u64 {
    1_000
}

fn default_network_timeout_ms() -> u64 {
    3_000
}

fn default_good_grace_ms() -> u64 {
    3_000
}

fn default_slow_effective_types() -> Vec<String> {
    vec!["slow-2g".to_string(), "2g".to_string(), "3g".to_string()]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            third_party_hosts: Vec::new(),
            cache_namespace: default_namespace(),
            cache_dir: None,
            probe_path: default_probe_path(),
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_latency_ceiling_ms: default_probe_latency_ceiling_ms(),
            network_timeout_ms: default_network_timeout_ms(),
            good_grace_ms: default_good_grace_ms(),
            slow_effective_types: default_slow_effective_types(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration for the given origin with default timings.
    pub fn for_origin(origin: Origin) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    /// Add a third-party host pattern.
    pub fn with_third_party_host(mut self, pattern: impl Into<String>) -> Self {
        self.third_party_hosts.push(pattern.into());
        self
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the network deadline.
    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Probe interval.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Probe deadline.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Probe latency ceiling.
    pub fn probe_latency_ceiling(&self) -> Duration {
        Duration::from_millis(self.probe_latency_ceiling_ms)
    }

    /// Network stage deadline.
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// Grace period for the `good` indication.
    pub fn good_grace(&self) -> Duration {
        Duration::from_millis(self.good_grace_ms)
    }

    /// Absolute probe URL without the cache-busting parameter.
    pub fn probe_url(&self) -> String {
        self.origin.absolutize(&self.probe_path)
    }

    /// Check the configuration for inconsistent values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("probe_interval_ms", self.probe_interval_ms),
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("probe_latency_ceiling_ms", self.probe_latency_ceiling_ms),
            ("network_timeout_ms", self.network_timeout_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }

        if self.probe_timeout_ms >= self.network_timeout_ms {
            return Err(ConfigError::ProbeTimeoutTooLong {
                probe_ms: self.probe_timeout_ms,
                network_ms: self.network_timeout_ms,
            });
        }

        if self.probe_latency_ceiling_ms > self.probe_timeout_ms {
            return Err(ConfigError::LatencyCeilingTooLong {
                ceiling_ms: self.probe_latency_ceiling_ms,
                probe_ms: self.probe_timeout_ms,
            });
        }

        if self.cache_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }

        if !self.probe_path.starts_with('/') {
            return Err(ConfigError::InvalidProbePath(self.probe_path.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network_timeout(), Duration::from_secs(3));
        assert_eq!(config.probe_timeout(), Duration::from_millis(1500));
        assert_eq!(config.probe_interval(), Duration::from_secs(30));
        assert_eq!(config.probe_url(), "http://localhost/favicon.ico");
    }

    #[test]
    fn test_validate_rejects_long_probe_timeout() {
        let config = EngineConfig {
            probe_timeout_ms: 5_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProbeTimeoutTooLong { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_and_empty() {
        let config = EngineConfig {
            network_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("network_timeout_ms"))
        );

        let config = EngineConfig {
            cache_namespace: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyNamespace));
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{"origin": "https://weather.example", "network_timeout_ms": 4000}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.origin.host(), "weather.example");
        assert_eq!(config.network_timeout_ms, 4000);
        assert_eq!(config.cache_namespace, "brownout-v1");
        assert_eq!(config.slow_effective_types, vec!["slow-2g", "2g", "3g"]);
    }
}
