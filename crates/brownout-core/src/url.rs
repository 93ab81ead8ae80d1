//! Origins and URL normalisation.

use serde::{Deserialize, Serialize};

/// Errors from URL parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("invalid URL '{url}': {reason}")]
    Invalid { url: String, reason: String },

    #[error("URL has no scheme: {0}")]
    MissingScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// An absolute URL split into the parts the engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Lower-cased scheme.
    pub scheme: String,
    /// Lower-cased host.
    pub host: String,
    /// Explicit non-default port.
    pub port: Option<u16>,
    /// Path (never empty) plus `?query` when present.
    pub path_and_query: String,
}

impl ParsedUrl {
    /// Parse an absolute URL. The fragment, if any, is dropped.
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let without_fragment = url.split('#').next().unwrap_or(url);
        let uri: http::Uri = without_fragment.parse().map_err(|e: http::uri::InvalidUri| {
            UrlError::Invalid {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let scheme = uri
            .scheme_str()
            .ok_or_else(|| UrlError::MissingScheme(url.to_string()))?
            .to_ascii_lowercase();
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| UrlError::MissingHost(url.to_string()))?
            .to_ascii_lowercase();
        let port = uri
            .port_u16()
            .filter(|p| Some(*p) != default_port(&scheme));

        let path = if uri.path().is_empty() { "/" } else { uri.path() };
        let path_and_query = match uri.query() {
            Some(q) => format!("{}?{}", path, q),
            None => path.to_string(),
        };

        Ok(Self {
            scheme,
            host,
            port,
            path_and_query,
        })
    }

    /// The origin this URL belongs to.
    pub fn origin(&self) -> Origin {
        Origin {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }

    /// Normalised string form.
    pub fn canonical(&self) -> String {
        format!("{}{}", self.origin(), self.path_and_query)
    }
}

/// Scheme, host and port of a site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    /// Create an origin from its parts.
    pub fn new(scheme: &str, host: &str, port: Option<u16>) -> Self {
        let scheme = scheme.to_ascii_lowercase();
        let port = port.filter(|p| Some(*p) != default_port(&scheme));
        Self {
            scheme,
            host: host.to_ascii_lowercase(),
            port,
        }
    }

    /// Parse an origin such as `https://example.com:8443`.
    pub fn parse(s: &str) -> Result<Self, UrlError> {
        Ok(ParsedUrl::parse(s)?.origin())
    }

    /// Scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Effective port (explicit or scheme default).
    pub fn port(&self) -> u16 {
        self.port
            .or_else(|| default_port(&self.scheme))
            .unwrap_or(443)
    }

    /// Turn an origin-relative or protocol-relative URL into an absolute one.
    ///
    /// Absolute URLs are returned unchanged.
    pub fn absolutize(&self, url: &str) -> String {
        if has_scheme(url) {
            url.to_string()
        } else if let Some(rest) = url.strip_prefix("//") {
            format!("{}://{}", self.scheme, rest)
        } else if url.starts_with('/') {
            format!("{}{}", self, url)
        } else {
            format!("{}/{}", self, url)
        }
    }

    /// Parse `url` (relative to this origin when not absolute).
    pub fn resolve(&self, url: &str) -> Result<ParsedUrl, UrlError> {
        ParsedUrl::parse(&self.absolutize(url))
    }

    /// Whether `url` belongs to this origin.
    pub fn is_same_origin(&self, url: &ParsedUrl) -> bool {
        url.scheme == self.scheme && url.host == self.host && url.port == self.port
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}", self.scheme, self.host, port),
            None => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

impl TryFrom<String> for Origin {
    type Error = UrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.to_string()
    }
}

/// Whether `url` starts with a scheme. Only the text before the first
/// `/`, `?` or `#` counts, so a URL in the query string does not.
fn has_scheme(url: &str) -> bool {
    let head = url.split(['/', '?', '#']).next().unwrap_or_default();
    match head.split_once(':') {
        Some((scheme, _)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises_case_and_default_port() {
        let url = ParsedUrl::parse("HTTPS://Example.COM:443/Data.json?a=1#top").unwrap();
        assert_eq!(url.scheme, "https");
        assert_eq!(url.host, "example.com");
        assert_eq!(url.port, None);
        assert_eq!(url.path_and_query, "/Data.json?a=1");
        assert_eq!(url.canonical(), "https://example.com/Data.json?a=1");
    }

    #[test]
    fn test_parse_keeps_explicit_port() {
        let url = ParsedUrl::parse("http://localhost:8080").unwrap();
        assert_eq!(url.port, Some(8080));
        assert_eq!(url.canonical(), "http://localhost:8080/");
    }

    #[test]
    fn test_parse_rejects_relative() {
        assert!(matches!(
            ParsedUrl::parse("/data.json"),
            Err(UrlError::MissingScheme(_))
        ));
    }

    #[test]
    fn test_absolutize() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        assert_eq!(origin.absolutize("/data.json"), "https://app.example.com/data.json");
        assert_eq!(origin.absolutize("data.json"), "https://app.example.com/data.json");
        assert_eq!(origin.absolutize("//cdn.example.com/x"), "https://cdn.example.com/x");
        assert_eq!(
            origin.absolutize("http://other.test/y"),
            "http://other.test/y"
        );
    }

    #[test]
    fn test_absolutize_ignores_urls_in_query() {
        let origin = Origin::parse("https://weather.example").unwrap();
        assert_eq!(
            origin.absolutize("/redirect?next=https://weather.example/home"),
            "https://weather.example/redirect?next=https://weather.example/home"
        );
        assert_eq!(
            origin.absolutize("go#https://x.test"),
            "https://weather.example/go#https://x.test"
        );
        assert!(has_scheme("HTTPS://weather.example"));
        assert!(!has_scheme("/a:b"));
        assert!(!has_scheme("1ab://x"));

        let parsed = origin.resolve("/redirect?next=https://weather.example/home").unwrap();
        assert_eq!(parsed.host, "weather.example");
        assert_eq!(parsed.path_and_query, "/redirect?next=https://weather.example/home");
    }

    #[test]
    fn test_same_origin() {
        let origin = Origin::parse("https://app.example.com").unwrap();
        assert!(origin.is_same_origin(&origin.resolve("/a").unwrap()));
        assert!(!origin.is_same_origin(&ParsedUrl::parse("https://api.example.com/a").unwrap()));
        assert!(!origin.is_same_origin(&ParsedUrl::parse("http://app.example.com/a").unwrap()));
    }

    #[test]
    fn test_origin_serde() {
        let origin: Origin = serde_json::from_str(r#""https://Example.com""#).unwrap();
        assert_eq!(origin.to_string(), "https://example.com");
        assert!(serde_json::from_str::<Origin>(r#""not a url""#).is_err());
    }
}
