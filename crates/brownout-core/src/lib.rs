//! Core abstractions for the brownout resolution engine.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `FetchRequest` / `FetchResponse` - Transport-neutral request and response
//! - `RequestId` - Per-resolution identifier
//! - `Origin` - Base origin and URL absolutisation
//! - `EngineConfig` - Timing, cache and origin configuration
//! - `ResolutionObserver` - Hook for resolution outcomes

mod config;
mod context;
mod lifecycle;
mod response;
mod url;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
pub use response::*;
pub use url::*;
