//! Scriptable in-memory transport for testing code built on the client.

use crate::config::{
    HEADER_RATE_LIMIT, HEADER_RATE_REMAINING, HEADER_RATE_RESET, HEADER_RATE_RESOURCE,
    HEADER_RATE_USED, HEADER_RETRY_AFTER,
};
use crate::errors::{GitHubError, GitHubResult};
use crate::transport::{HttpRequest, HttpResponse, RequestBody, Transport};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LINK, LOCATION};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use url::Url;

const DOCS_URL: &str = "https://docs.github.com/rest";
const SECONDARY_DOCS_URL: &str =
    "https://docs.github.com/rest/overview/rate-limits-for-the-rest-api#about-secondary-rate-limits";

/// A scripted response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
    /// Headers.
    pub headers: Vec<(String, String)>,
}

impl MockResponse {
    /// Creates an empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
            headers: Vec::new(),
        }
    }

    /// Creates a 200 response with a JSON body.
    pub fn ok<T: Serialize>(body: T) -> Self {
        Self::new(200).with_json(body)
    }

    /// Creates a 201 Created response.
    pub fn created<T: Serialize>(body: T) -> Self {
        Self::new(201).with_json(body)
    }

    /// Creates a 204 No Content response.
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// Creates a 202 Accepted response with a raw body.
    pub fn accepted(body: &str) -> Self {
        Self::new(202).with_body(body)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::new(404).with_json(serde_json::json!({
            "message": "Not Found",
            "documentation_url": DOCS_URL
        }))
    }

    /// Creates a 401 Unauthorized response.
    pub fn unauthorized() -> Self {
        Self::new(401).with_json(serde_json::json!({
            "message": "Bad credentials",
            "documentation_url": DOCS_URL
        }))
    }

    /// Creates a 403 Forbidden response.
    pub fn forbidden() -> Self {
        Self::new(403).with_json(serde_json::json!({
            "message": "Resource not accessible by integration",
            "documentation_url": DOCS_URL
        }))
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error() -> Self {
        Self::new(500).with_json(serde_json::json!({ "message": "Server Error" }))
    }

    /// Creates a primary rate limit response for the core resource.
    pub fn rate_limited(reset_epoch: i64) -> Self {
        Self::new(403)
            .with_json(serde_json::json!({
                "message": "API rate limit exceeded for 192.0.2.1.",
                "documentation_url": DOCS_URL
            }))
            .with_rate(60, 0, reset_epoch)
    }

    /// Creates a secondary rate limit response with a Retry-After header.
    pub fn secondary_rate_limited(retry_after_secs: u64) -> Self {
        Self::new(403)
            .with_json(serde_json::json!({
                "message": "You have exceeded a secondary rate limit.",
                "documentation_url": SECONDARY_DOCS_URL
            }))
            .with_header(HEADER_RETRY_AFTER, &retry_after_secs.to_string())
    }

    /// Creates a redirect response.
    pub fn redirect(status: u16, location: &str) -> Self {
        Self::new(status).with_header(LOCATION.as_str(), location)
    }

    /// Replaces the body with JSON.
    pub fn with_json<T: Serialize>(mut self, body: T) -> Self {
        self.body = Bytes::from(serde_json::to_vec(&body).unwrap_or_default());
        self.with_header(CONTENT_TYPE.as_str(), "application/json; charset=utf-8")
    }

    /// Replaces the body.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Bytes::from(body.to_string());
        self
    }

    /// Adds a header to the response.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds a Link header.
    pub fn with_link(self, link: &str) -> Self {
        self.with_header(LINK.as_str(), link)
    }

    /// Adds core rate limit headers.
    pub fn with_rate(self, limit: u32, remaining: u32, reset_epoch: i64) -> Self {
        self.with_header(HEADER_RATE_LIMIT, &limit.to_string())
            .with_header(HEADER_RATE_REMAINING, &remaining.to_string())
            .with_header(HEADER_RATE_USED, &(limit - remaining.min(limit)).to_string())
            .with_header(HEADER_RATE_RESET, &reset_epoch.to_string())
            .with_header(HEADER_RATE_RESOURCE, "core")
    }

    /// Materializes the response for a request.
    pub fn into_http(self, method: Method, url: Url) -> HttpResponse {
        let mut headers = HeaderMap::new();
        for (key, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        HttpResponse {
            status: StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers,
            body: self.body,
            method,
            url,
        }
    }
}

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Body bytes; streamed bodies are drained.
    pub body: Option<Bytes>,
}

impl RecordedRequest {
    /// Gets a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Transport that answers from a FIFO of scripted responses and records
/// every request.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push(&self, response: MockResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Gets the requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Gets the number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn round_trip(&self, request: HttpRequest) -> GitHubResult<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let body = match body {
            RequestBody::Empty => None,
            RequestBody::Bytes(bytes) => Some(bytes),
            RequestBody::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Some(buf.freeze())
            }
        };

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method: method.clone(),
                url: url.clone(),
                headers,
                body,
            });

        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(response) => Ok(response.into_http(method, url)),
            None => Err(GitHubError::configuration(format!(
                "no mock response queued for {method} {url}"
            ))),
        }
    }
}
