//! Request construction.

use super::GitHubClient;
use crate::config::{DEFAULT_MEDIA_TYPE, HEADER_API_VERSION, MEDIA_TYPE_V3};
use crate::errors::{GitHubError, GitHubResult};
use crate::transport::{HttpRequest, RequestBody};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use url::Url;

/// Placeholder for requests without a JSON body.
pub const NO_BODY: Option<&()> = None;

/// Per-request header override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    /// Sends this API version instead of the client default.
    ApiVersion(String),
    /// Sends this Accept media type instead of the v3 JSON default.
    Accept(String),
}

/// Overrides the API version of a single request.
pub fn with_version(version: impl Into<String>) -> RequestOption {
    RequestOption::ApiVersion(version.into())
}

fn header_value(value: &str) -> GitHubResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| GitHubError::configuration(format!("invalid header value {value:?}")))
}

fn resolve(root: &Url, name: &str, url: &str) -> GitHubResult<Url> {
    if !root.path().ends_with('/') {
        return Err(GitHubError::configuration(format!(
            "{name} must have a trailing slash, but {:?} does not",
            root.as_str()
        )));
    }
    root.join(url).map_err(GitHubError::invalid_url)
}

impl GitHubClient {
    fn apply_defaults(&self, request: &mut HttpRequest, opts: &[RequestOption]) -> GitHubResult<()> {
        request.headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE_V3));
        if !self.user_agent.is_empty() {
            request.headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        }
        request
            .headers
            .insert(HEADER_API_VERSION, header_value(&self.api_version)?);

        for opt in opts {
            match opt {
                RequestOption::ApiVersion(version) => {
                    request.headers.insert(HEADER_API_VERSION, header_value(version)?);
                }
                RequestOption::Accept(media_type) => {
                    request.headers.insert(ACCEPT, header_value(media_type)?);
                }
            }
        }
        Ok(())
    }

    /// Creates an API request.
    ///
    /// `url` is resolved against the base URL, which must end with a
    /// slash, so it should be relative and have no leading slash. A body
    /// is encoded as JSON.
    pub fn new_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        opts: &[RequestOption],
    ) -> GitHubResult<HttpRequest> {
        let url = resolve(&self.base_url, "baseURL", url)?;
        let mut request = HttpRequest::new(method, url);

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(GitHubError::serialization)?;
            request.body = RequestBody::from(bytes);
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        self.apply_defaults(&mut request, opts)?;
        Ok(request)
    }

    /// Creates a POST request with a form-urlencoded body.
    pub fn new_form_request(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        opts: &[RequestOption],
    ) -> GitHubResult<HttpRequest> {
        let url = resolve(&self.base_url, "baseURL", url)?;
        let mut request = HttpRequest::new(Method::POST, url);
        request.body = body.into();
        request.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        self.apply_defaults(&mut request, opts)?;
        Ok(request)
    }

    /// Creates an upload request against the upload URL.
    ///
    /// `size` is sent as Content-Length. An empty `media_type` means
    /// `application/octet-stream`.
    pub fn new_upload_request(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        size: u64,
        media_type: &str,
        opts: &[RequestOption],
    ) -> GitHubResult<HttpRequest> {
        let url = resolve(&self.upload_url, "uploadURL", url)?;
        let mut request = HttpRequest::new(Method::POST, url);
        request.body = body.into();

        let media_type = if media_type.is_empty() {
            DEFAULT_MEDIA_TYPE
        } else {
            media_type
        };
        request.headers.insert(CONTENT_TYPE, header_value(media_type)?);
        request.headers.insert(CONTENT_LENGTH, HeaderValue::from(size));

        self.apply_defaults(&mut request, opts)?;
        Ok(request)
    }
}
