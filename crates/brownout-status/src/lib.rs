//! User-facing connectivity status.
//!
//! This crate provides:
//! - `StatusMode` - offline / slow / good, as shown to users
//! - `StatusValue` - A published mode with its sequence number
//! - `StatusChannel` - Change-only notification to subscribers

mod channel;
mod mode;

pub use channel::*;
pub use mode::*;
