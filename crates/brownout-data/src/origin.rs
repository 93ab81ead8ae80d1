//! Deciding which requests the engine manages.

use brownout_core::{EngineConfig, Origin, ParsedUrl, UrlError};

/// Why a request bypasses the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    /// Host matches a configured third-party pattern.
    ThirdParty,
    /// Host is not the engine's origin.
    CrossOrigin,
}

/// How a request is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestScope {
    /// Same-origin request, resolved with cache and fallback semantics.
    Managed(ParsedUrl),
    /// Handed to the transport unmodified.
    Passthrough(PassthroughReason),
}

/// Classifies request URLs against the engine origin and third-party hosts.
#[derive(Debug, Clone)]
pub struct OriginFilter {
    origin: Origin,
    third_party_patterns: Vec<String>,
}

impl OriginFilter {
    /// Create a filter for an origin with no third-party hosts.
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            third_party_patterns: Vec::new(),
        }
    }

    /// Build from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        config
            .third_party_hosts
            .iter()
            .fold(Self::new(config.origin.clone()), |f, p| f.with_third_party(p))
    }

    /// Add a third-party host pattern (supports `*` as wildcard).
    ///
    /// Examples:
    /// - `api.openweathermap.org` - exact host
    /// - `*.openweathermap.org` - any subdomain
    pub fn with_third_party(mut self, pattern: impl Into<String>) -> Self {
        self.third_party_patterns
            .push(pattern.into().to_ascii_lowercase());
        self
    }

    /// The engine origin.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Classify a request URL (relative URLs belong to the origin).
    pub fn classify(&self, url: &str) -> Result<RequestScope, UrlError> {
        let parsed = self.origin.resolve(url)?;

        if self.is_third_party(&parsed.host) {
            return Ok(RequestScope::Passthrough(PassthroughReason::ThirdParty));
        }

        if !self.origin.is_same_origin(&parsed) {
            return Ok(RequestScope::Passthrough(PassthroughReason::CrossOrigin));
        }

        Ok(RequestScope::Managed(parsed))
    }

    /// Whether a host matches a third-party pattern.
    pub fn is_third_party(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.third_party_patterns
            .iter()
            .any(|pattern| matches_pattern(&host, pattern))
    }
}

fn matches_pattern(host: &str, pattern: &str) -> bool {
    match pattern.split_once('*') {
        None => host == pattern,
        Some((prefix, suffix)) if !suffix.contains('*') => {
            host.len() >= prefix.len() + suffix.len()
                && host.starts_with(prefix)
                && host.ends_with(suffix)
        }
        // Multiple wildcards: every literal segment must appear in order.
        Some(_) => {
            let segments: Vec<&str> = pattern.split('*').collect();
            let last = segments.len() - 1;
            let mut rest = host;
            for (i, segment) in segments.iter().enumerate() {
                if segment.is_empty() {
                    continue;
                }
                if i == last {
                    return rest.ends_with(segment);
                }
                match rest.find(segment) {
                    Some(pos) if i > 0 || pos == 0 => rest = &rest[pos + segment.len()..],
                    _ => return false,
                }
            }
            true
        }
    }
}
