//! Observability for the brownout resolution engine.
//!
//! This crate provides:
//! - `init_logging` - tracing subscriber setup (JSON or human output)
//! - `ResolutionMetrics` - Lock-free counters fed by resolution events
//! - `MetricsSnapshot` - Serialisable point-in-time view of the counters

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
