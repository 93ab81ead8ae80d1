//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use brownout_core::{FetchRequest, FetchResponse, Headers};
use tracing::debug;

use crate::error::FetchError;
use crate::transport::Transport;

/// HTTP transport built on a shared `reqwest::Client`.
///
/// The client carries only a connect timeout; overall deadlines are applied
/// by the engine, which drops (and thereby aborts) the request future.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("brownout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(Duration::ZERO)
    } else if e.is_connect() {
        FetchError::Connection(e.to_string())
    } else {
        FetchError::Request(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .client
            .request(reqwest::Method::from(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_error)?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_error)?.to_vec();

        Ok(FetchResponse {
            status,
            headers,
            body,
            url,
        })
    }
}
