//! Public SDK for the brownout adaptive fetch resolution engine.
//!
//! `Engine` wires the quality monitor, the resolution policy and the status
//! channel together:
//!
//! ```ignore
//! use brownout_sdk::prelude::*;
//!
//! let engine = Engine::builder(config)
//!     .transport(HttpTransport::new(Duration::from_secs(1))?)
//!     .start()
//!     .await?;
//!
//! engine.on_status_change(|status| println!("network is {}", status.mode));
//!
//! let forecast = engine.resolve("/data.json").await?;
//! println!("{} from {}", forecast.response.status, forecast.source);
//! ```

mod engine;
mod error;

pub use engine::*;
pub use error::*;

pub use brownout_cache;
pub use brownout_core;
pub use brownout_data;
pub use brownout_monitor;
pub use brownout_observability;
pub use brownout_resolver;
pub use brownout_status;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Engine, EngineBuilder, EngineError};
    pub use brownout_cache::*;
    pub use brownout_core::*;
    pub use brownout_data::*;
    pub use brownout_monitor::*;
    pub use brownout_observability::*;
    pub use brownout_resolver::*;
    pub use brownout_status::*;
}
