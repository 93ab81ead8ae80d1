//! Connection quality monitoring.
//!
//! This crate provides:
//! - `QualityClassification` - offline / slow / good / unknown
//! - `ConnectionHint` - Platform-reported connection metadata
//! - `PlatformSignal` - Online, offline and connection-change events
//! - `Probe` / `TransportProbe` - Bounded-timeout responsiveness probe
//! - `QualityMonitor` / `QualityHandle` - The monitor and its read side

mod hint;
mod monitor;
mod probe;
mod quality;
mod signal;

pub use hint::*;
pub use monitor::*;
pub use probe::*;
pub use quality::*;
pub use signal::*;
