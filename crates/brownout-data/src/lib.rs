//! Network access for the brownout resolution engine.
//!
//! This crate provides:
//! - `Transport` - Abortable async request/response transport
//! - `FetchError` - Transport-level failures
//! - `TimeoutConfig` / `with_deadline` - Deadlines for network and probe calls
//! - `OriginFilter` - Which requests the engine manages and which pass through
//! - `HttpTransport` - reqwest-backed transport (feature `http`)

#[cfg(feature = "http")]
mod client;
mod error;
mod origin;
mod timeout;
mod transport;

#[cfg(feature = "http")]
pub use client::*;
pub use error::*;
pub use origin::*;
pub use timeout::*;
pub use transport::*;
