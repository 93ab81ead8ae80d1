//! Which network responses may be stored.

use std::time::Duration;

use brownout_core::{FetchResponse, Method};

/// Parsed `Cache-Control` directives relevant to storing responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    /// `no-store` present.
    pub no_store: bool,
    /// `no-cache` present.
    pub no_cache: bool,
    /// `private` present.
    pub private: bool,
    /// `max-age` value.
    pub max_age: Option<Duration>,
}

impl CacheControl {
    /// Parse a `Cache-Control` header value. Unknown directives are ignored.
    pub fn parse(value: &str) -> Self {
        let mut cc = Self::default();

        for directive in value.split(',') {
            let directive = directive.trim().to_ascii_lowercase();
            let (name, arg) = match directive.split_once('=') {
                Some((n, a)) => (n.trim().to_string(), Some(a.trim().trim_matches('"').to_string())),
                None => (directive.clone(), None),
            };

            match name.as_str() {
                "no-store" => cc.no_store = true,
                "no-cache" => cc.no_cache = true,
                "private" => cc.private = true,
                "max-age" => {
                    cc.max_age = arg
                        .and_then(|a| a.parse::<u64>().ok())
                        .map(Duration::from_secs);
                }
                _ => {}
            }
        }

        cc
    }

    /// Directives of a response (defaults when the header is absent).
    pub fn of(response: &FetchResponse) -> Self {
        response
            .header("cache-control")
            .map(Self::parse)
            .unwrap_or_default()
    }
}

/// Decision on whether a network response may be written to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cacheability {
    /// Store it.
    Cacheable,
    /// Only GET responses are stored.
    NonGetMethod,
    /// Only 2xx responses are stored.
    Unsuccessful(u16),
    /// Response said `Cache-Control: no-store`.
    NoStore,
}

impl Cacheability {
    /// Classify a response to a request made with `method`.
    pub fn of(method: Method, response: &FetchResponse) -> Self {
        if method != Method::Get {
            Self::NonGetMethod
        } else if !response.ok() {
            Self::Unsuccessful(response.status)
        } else if CacheControl::of(response).no_store {
            Self::NoStore
        } else {
            Self::Cacheable
        }
    }

    /// Whether the response may be stored.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Cacheable)
    }
}
