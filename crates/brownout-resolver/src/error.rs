//! Resolution errors.

use std::time::Duration;

use brownout_data::FetchError;

/// Result type for resolutions.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// A resolution that produced no response.
///
/// Surfaced only after the single fallback cache lookup also missed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The network stage hit its deadline.
    #[error("no response for {url} within {deadline:?} and nothing cached")]
    Timeout { url: String, deadline: Duration },

    /// The transport failed; the original error is kept unchanged.
    #[error(transparent)]
    Network(#[from] FetchError),
}

impl ResolveError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
