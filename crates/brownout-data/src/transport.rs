//! Transport trait.

use std::sync::Arc;

use async_trait::async_trait;
use brownout_core::{FetchRequest, FetchResponse};

use crate::error::FetchError;

/// The underlying network transport.
///
/// Dropping the future returned by `send` must abort the in-flight call;
/// the engine relies on this to cancel a request whose deadline expired.
/// A completed call resolves to `Ok` for every HTTP status, including
/// 4xx/5xx; `Err` is reserved for transport-level failures.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request.
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        (**self).send(request).await
    }
}
