//! Response cache for the brownout resolution engine.
//!
//! This crate provides:
//! - `RequestKey` - Canonical method + URL cache key
//! - `CachedResponse` - Stored response with its storage timestamp
//! - `CacheStore` - Async store trait, one logical namespace per store
//! - `MemoryCacheStore` / `FileCacheStore` - Process-local and persistent stores
//! - `Cacheability` - Which network responses may be stored
//! - `ExplainHeaders` - Debug headers describing where a response came from
//!
//! # Example
//!
//! ```ignore
//! use brownout_cache::{CacheStore, CachedResponse, MemoryCacheStore, RequestKey};
//!
//! let store = MemoryCacheStore::new("brownout-v1")?;
//! let key = RequestKey::from_request(&request, &origin)?;
//! store.put(&key, CachedResponse::from_response(&response)).await?;
//! let hit = store.get(&key).await?;
//! ```

mod entry;
mod error;
mod file;
mod headers;
mod key;
mod policy;
mod store;

pub use entry::*;
pub use error::*;
pub use file::*;
pub use headers::*;
pub use key::*;
pub use policy::*;
pub use store::*;
