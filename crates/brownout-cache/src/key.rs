//! Canonical request keys.

use brownout_core::{FetchRequest, Method, Origin, ParsedUrl, UrlError};
use serde::{Deserialize, Serialize};

/// Canonical identifier of a cache entry: method plus normalised URL.
///
/// Two requests that differ only in scheme/host case, an explicit default
/// port, or a fragment map to the same key. The query string is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    /// Build a key from a method and an already parsed URL.
    pub fn new(method: Method, url: &ParsedUrl) -> Self {
        Self(format!("{} {}", method, url.canonical()))
    }

    /// Build a key for a request, resolving relative URLs against `origin`.
    pub fn from_request(request: &FetchRequest, origin: &Origin) -> Result<Self, UrlError> {
        Ok(Self::new(request.method, &origin.resolve(&request.url)?))
    }

    /// Rebuild a key from its string form (e.g. read back from a store).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The method part of the key.
    pub fn method(&self) -> Option<Method> {
        self.0.split_once(' ').and_then(|(m, _)| Method::parse(m))
    }

    /// The URL part of the key.
    pub fn url(&self) -> &str {
        self.0.split_once(' ').map(|(_, u)| u).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
