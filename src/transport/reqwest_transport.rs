//! Reqwest-based HTTP transport implementation.

use super::{HttpRequest, HttpResponse, RequestBody, Transport, TransportError, TransportErrorKind};
use crate::config::{GitHubConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use crate::errors::{GitHubError, GitHubResult};
use async_trait::async_trait;
use reqwest::{redirect, Client, ClientBuilder, Method};
use url::Url;

/// Reqwest-based HTTP transport. Never follows redirects.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport from the client configuration.
    pub fn new(config: &GitHubConfig) -> GitHubResult<Self> {
        let builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool.max_idle_per_host)
            .pool_idle_timeout(config.pool.idle_timeout);
        Self::build(builder)
    }

    /// Creates a transport with default timeouts.
    pub fn with_defaults() -> GitHubResult<Self> {
        let builder = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT);
        Self::build(builder)
    }

    /// Creates a transport from a caller-built builder. Redirect following
    /// is switched off regardless of the builder's setting.
    pub fn from_builder(builder: ClientBuilder) -> GitHubResult<Self> {
        Self::build(builder)
    }

    fn build(builder: ClientBuilder) -> GitHubResult<Self> {
        let client = builder
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| GitHubError::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn convert_error(method: Method, url: Url, error: reqwest::Error) -> TransportError {
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        TransportError::new(kind, method, url, error.without_url().to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn round_trip(&self, request: HttpRequest) -> GitHubResult<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .headers(headers);

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Self::convert_error(method.clone(), url.clone(), e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::convert_error(method.clone(), url.clone(), e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
            method,
            url,
        })
    }
}
