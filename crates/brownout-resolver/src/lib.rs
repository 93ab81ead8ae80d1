//! Fetch resolution policy.
//!
//! This crate decides, per request, between local cache and network:
//! - `ModeController` - Cache-first / network-first from measured quality
//! - `Resolver` - The cache → deadline-bounded network → fallback pipeline
//! - `PendingTimers` - Per-request deadline bookkeeping
//! - `NetworkStatus` - Synchronous snapshot for polling collaborators

mod error;
mod mode;
mod policy;
mod status;
mod timers;

pub use error::*;
pub use mode::*;
pub use policy::*;
pub use status::*;
pub use timers::*;
