//! Debug headers describing how a response was resolved.

use brownout_core::{FetchResponse, ResolutionSource};
use chrono::{DateTime, SecondsFormat, Utc};

/// Header names added to resolved responses.
pub mod header_names {
    /// Where the response came from (network, cache, fallback, passthrough).
    pub const X_BROWNOUT_SOURCE: &str = "x-brownout-source";
    /// When a cached response was stored (RFC 3339).
    pub const X_BROWNOUT_STORED_AT: &str = "x-brownout-stored-at";
}

/// Explain headers for a resolved response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainHeaders {
    /// Resolution source.
    pub source: ResolutionSource,
    /// Storage time, for responses replayed from cache.
    pub stored_at: Option<DateTime<Utc>>,
}

impl ExplainHeaders {
    /// Headers for a response from `source`.
    pub fn new(source: ResolutionSource) -> Self {
        Self {
            source,
            stored_at: None,
        }
    }

    /// Record the storage time of a cached response.
    pub fn with_stored_at(mut self, at: DateTime<Utc>) -> Self {
        self.stored_at = Some(at);
        self
    }

    /// Header name/value pairs.
    pub fn to_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![(header_names::X_BROWNOUT_SOURCE, self.source.to_string())];

        if let Some(at) = self.stored_at {
            headers.push((
                header_names::X_BROWNOUT_STORED_AT,
                at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }

        headers
    }

    /// Add the headers to a response.
    pub fn apply(&self, mut response: FetchResponse) -> FetchResponse {
        for (name, value) in self.to_headers() {
            response.headers.insert(name.to_string(), value);
        }
        response
    }

    /// Read explain headers back from a response.
    pub fn from_response(response: &FetchResponse) -> Option<Self> {
        let source = match response.header(header_names::X_BROWNOUT_SOURCE)? {
            "network" => ResolutionSource::Network,
            "cache" => ResolutionSource::Cache,
            "fallback" => ResolutionSource::Fallback,
            "passthrough" => ResolutionSource::Passthrough,
            _ => return None,
        };
        let stored_at = response
            .header(header_names::X_BROWNOUT_STORED_AT)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(Self { source, stored_at })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_apply_and_read_back() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let explain = ExplainHeaders::new(ResolutionSource::Fallback).with_stored_at(at);
        let response = explain.apply(FetchResponse::ok_with_body("{}"));

        assert_eq!(response.header("X-Brownout-Source"), Some("fallback"));
        assert_eq!(
            response.header("x-brownout-stored-at"),
            Some("2026-03-01T12:00:00Z")
        );
        assert_eq!(ExplainHeaders::from_response(&response), Some(explain));
    }

    #[test]
    fn test_network_has_no_stored_at() {
        let response = ExplainHeaders::new(ResolutionSource::Network).apply(FetchResponse::new(200));
        assert_eq!(response.header(header_names::X_BROWNOUT_STORED_AT), None);
    }
}
