//! Stored response entries.

use brownout_core::{FetchResponse, Headers};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The most recently stored response for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: Headers,
    /// Response body.
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
    /// Final URL of the original response.
    #[serde(default)]
    pub url: String,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Snapshot a response, stamped with the current time.
    pub fn from_response(response: &FetchResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            url: response.url.clone(),
            stored_at: Utc::now(),
        }
    }

    /// Override the storage timestamp.
    pub fn stored_at(mut self, at: DateTime<Utc>) -> Self {
        self.stored_at = at;
        self
    }

    /// Age of the entry relative to now.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.stored_at)
    }

    /// Turn the entry back into a response.
    pub fn into_response(self) -> FetchResponse {
        FetchResponse {
            status: self.status,
            headers: self.headers,
            body: self.body,
            url: self.url,
        }
    }
}

mod body_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
