//! CLI configuration.

use std::path::Path;

use anyhow::{Context, Result};
use brownout_sdk::brownout_core::EngineConfig;
use brownout_sdk::brownout_observability::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        config
            .engine
            .validate()
            .with_context(|| format!("Invalid engine config in {}", path.display()))?;
        Ok(config)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log output format (default: human).
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Minimum level for engine logs.
    #[serde(default)]
    pub level: LogLevel,
}

fn default_format() -> LogFormat {
    LogFormat::Human
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            level: LogLevel::default(),
        }
    }
}

/// Generate a default brownout.toml config file.
pub fn generate_default_config(origin: &str) -> String {
    format!(
        r#"# Brownout engine configuration

[engine]
origin = "{origin}"
third_party_hosts = []
cache_namespace = "brownout-v1"
cache_dir = ".brownout/cache"
probe_path = "/favicon.ico"
probe_interval_ms = 30000
probe_timeout_ms = 1500
probe_latency_ceiling_ms = 1000
network_timeout_ms = 3000
good_grace_ms = 3000
slow_effective_types = ["slow-2g", "2g", "3g"]

[logging]
format = "human"
level = "info"
"#,
        origin = origin
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: CliConfig = toml::from_str(&generate_default_config("https://weather.example")).unwrap();
        assert_eq!(config.engine.origin.host(), "weather.example");
        assert_eq!(config.engine.network_timeout_ms, 3_000);
        assert_eq!(config.logging.format, LogFormat::Human);
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brownout.json");
        let mut config = CliConfig::default();
        config.engine = config.engine.with_third_party_host("api.openweathermap.org");
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = CliConfig::load(&path).unwrap();
        assert_eq!(loaded.engine.third_party_hosts, vec!["api.openweathermap.org"]);
    }

    #[test]
    fn test_load_rejects_invalid_engine_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brownout.toml");
        std::fs::write(&path, "[engine]\nnetwork_timeout_ms = 0\n").unwrap();
        assert!(CliConfig::load(&path).is_err());
    }
}
