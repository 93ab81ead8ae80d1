//! tracing subscriber setup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Minimum level for engine logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `Debug` when verbose, `Info` otherwise.
    pub fn from_verbosity(verbose: bool) -> Self {
        if verbose {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LoggingError::UnknownLevel(other.to_string())),
        }
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "human" | "pretty" => Ok(Self::Human),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Errors from logging setup.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("unknown log level: {0}")]
    UnknownLevel(String),

    #[error("unknown log format: {0}")]
    UnknownFormat(String),

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Filter directives: engine crates at `level`, everything else at `warn`.
pub fn default_directives(level: LogLevel) -> String {
    let level = level.as_str();
    format!(
        "warn,brownout={level},brownout_core={level},brownout_cache={level},\
         brownout_data={level},brownout_monitor={level},brownout_status={level},\
         brownout_resolver={level},brownout_sdk={level}"
    )
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Fails if a global
/// subscriber is already installed.
pub fn init_logging(format: LogFormat, level: LogLevel) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let result = match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| LoggingError::Install(e.to_string()))
}
