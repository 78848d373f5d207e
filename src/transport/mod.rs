//! HTTP transport abstraction.
//!
//! Everything below the dispatcher goes through [`Transport`]: the
//! reqwest-backed default, the redirect-following decorator and the auth
//! decorators in [`crate::auth`].

mod redirect;
mod reqwest_transport;

pub use redirect::FollowRedirects;
pub use reqwest_transport::ReqwestTransport;

use crate::errors::{sanitize_url, GitHubErrorKind, GitHubResult};
use crate::observability::redact_header;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Streamed request body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync>>;

/// Request body.
pub enum RequestBody {
    /// No body.
    Empty,
    /// Buffered body; can be replayed.
    Bytes(Bytes),
    /// One-shot streamed body.
    Stream(ByteStream),
}

impl RequestBody {
    /// Wraps a byte stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static,
    {
        Self::Stream(Box::pin(stream))
    }

    /// Copies the body when it can be replayed.
    pub fn try_clone(&self) -> Option<Self> {
        match self {
            Self::Empty => Some(Self::Empty),
            Self::Bytes(b) => Some(Self::Bytes(b.clone())),
            Self::Stream(_) => None,
        }
    }

    /// Reports whether there is no body.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Gets the buffered bytes, if buffered.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::Empty
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::Stream(_) => write!(f, "Stream"),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

/// An outgoing HTTP request.
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: RequestBody,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Copies the request when its body can be replayed.
    pub fn try_clone(&self) -> Option<Self> {
        Some(Self {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
        })
    }

    /// Gets a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets HTTP basic credentials.
    pub fn set_basic_auth(&mut self, username: &str, password: &str) {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        if let Ok(mut value) = HeaderValue::from_str(&format!("Basic {encoded}")) {
            value.set_sensitive(true);
            self.headers.insert(AUTHORIZATION, value);
        }
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let value = value.to_str().unwrap_or("<binary>");
                (name.to_string(), redact_header(name.as_str(), value))
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &sanitize_url(&self.url).as_str())
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
    /// Method of the request that produced this response.
    pub method: Method,
    /// URL of the request that produced this response.
    pub url: Url,
}

impl HttpResponse {
    /// Creates a response with no headers and no body.
    pub fn new(status: StatusCode, method: Method, url: Url) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            method,
            url,
        }
    }

    /// Gets a header value as a string. Only the first value is returned.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Transport failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Request timed out.
    Timeout,
    /// Could not connect.
    Connect,
    /// Failed reading the response body.
    Body,
    /// Redirect handling failed.
    Redirect,
    /// Anything else.
    Other,
}

/// Failure below the HTTP layer.
#[derive(Debug, Clone, Error)]
#[error("{method} {url}: {message}")]
pub struct TransportError {
    /// Failure category.
    pub kind: TransportErrorKind,
    /// Request method.
    pub method: Method,
    /// Request URL.
    pub url: Url,
    /// Description of the failure.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error.
    pub fn new(kind: TransportErrorKind, method: Method, url: Url, message: impl Into<String>) -> Self {
        Self {
            kind,
            method,
            url,
            message: message.into(),
        }
    }

    /// Redacts credentials from the request URL.
    pub fn sanitized(mut self) -> Self {
        self.url = sanitize_url(&self.url);
        self
    }

    pub(crate) fn error_kind(&self) -> GitHubErrorKind {
        match self.kind {
            TransportErrorKind::Timeout => GitHubErrorKind::Timeout,
            TransportErrorKind::Connect => GitHubErrorKind::ConnectionFailed,
            _ => GitHubErrorKind::TransportFailure,
        }
    }
}

/// Sends one HTTP request and buffers the response.
///
/// Implementations must not follow redirects; that is the job of
/// [`FollowRedirects`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request.
    async fn round_trip(&self, request: HttpRequest) -> GitHubResult<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn round_trip(&self, request: HttpRequest) -> GitHubResult<HttpResponse> {
        (**self).round_trip(request).await
    }
}

/// Adapts an async closure into a [`Transport`].
pub struct TransportFn<F>(pub F);

#[async_trait]
impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = GitHubResult<HttpResponse>> + Send,
{
    async fn round_trip(&self, request: HttpRequest) -> GitHubResult<HttpResponse> {
        (self.0)(request).await
    }
}

/// Builds the platform-default transport.
pub fn default_transport() -> GitHubResult<Arc<dyn Transport>> {
    Ok(Arc::new(ReqwestTransport::with_defaults()?))
}
