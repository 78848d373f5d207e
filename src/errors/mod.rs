//! Error types for the GitHub client and classification of HTTP responses.

use crate::config::{HEADER_OTP, HEADER_RATE_REMAINING};
use crate::context::ContextError;
use crate::rate_limit::{format_rate_reset, Rate};
use crate::response::{parse_secondary_rate, Response};
use crate::transport::{HttpResponse, TransportError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::LOCATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Result type alias for GitHub operations.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// Error kinds for categorizing GitHub errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// 202 Accepted: the work was scheduled server side.
    Accepted,
    /// 401 with a required one-time password.
    TwoFactorAuthRequired,
    /// Primary rate limit exhausted, observed or predicted.
    PrimaryRateLimitExceeded,
    /// Secondary (abuse) rate limit triggered.
    SecondaryRateLimitExceeded,
    /// A 3xx surfaced to the caller.
    Redirection,
    /// Any other non-2xx response.
    ApiError,
    /// Redirect budget exhausted.
    TooManyRedirects,
    /// Redirect of an unexpected kind.
    UnexpectedRedirect,
    /// Redirect without a usable Location.
    InvalidLocation,
    /// A status other than the one an endpoint requires.
    UnexpectedStatus,
    /// The caller cancelled the request.
    Canceled,
    /// The caller's deadline passed.
    DeadlineExceeded,
    /// Request timeout.
    Timeout,
    /// Connection failed.
    ConnectionFailed,
    /// Other transport failure.
    TransportFailure,
    /// Invalid configuration.
    InvalidConfiguration,
    /// Invalid URL.
    InvalidUrl,
    /// Failed to encode a request body or query.
    SerializationError,
    /// Failed to decode a response body.
    DeserializationError,
    /// Failed to write a response body to a sink.
    Io,
}

impl fmt::Display for GitHubErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::TwoFactorAuthRequired => write!(f, "two_factor_auth_required"),
            Self::PrimaryRateLimitExceeded => write!(f, "primary_rate_limit_exceeded"),
            Self::SecondaryRateLimitExceeded => write!(f, "secondary_rate_limit_exceeded"),
            Self::Redirection => write!(f, "redirection"),
            Self::ApiError => write!(f, "api_error"),
            Self::TooManyRedirects => write!(f, "too_many_redirects"),
            Self::UnexpectedRedirect => write!(f, "unexpected_redirect"),
            Self::InvalidLocation => write!(f, "invalid_location"),
            Self::UnexpectedStatus => write!(f, "unexpected_status"),
            Self::Canceled => write!(f, "canceled"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::TransportFailure => write!(f, "transport_failure"),
            Self::InvalidConfiguration => write!(f, "invalid_configuration"),
            Self::InvalidUrl => write!(f, "invalid_url"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::DeserializationError => write!(f, "deserialization_error"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// GitHub client error.
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Generic API error envelope.
    #[error("{0}")]
    Response(ErrorResponse),

    /// The request needs an OTP code.
    #[error("{0}")]
    TwoFactorAuth(TwoFactorAuthError),

    /// Primary rate limit exhausted.
    #[error("{0}")]
    RateLimit(RateLimitError),

    /// Secondary rate limit triggered.
    #[error("{0}")]
    AbuseRateLimit(AbuseRateLimitError),

    /// 202 Accepted.
    #[error("{0}")]
    Accepted(AcceptedError),

    /// A redirect reached the caller.
    #[error("{0}")]
    Redirection(RedirectionError),

    /// `bare_do_until_found` ran out of 301 hops.
    #[error("reached the maximum amount of redirections: {0}")]
    TooManyRedirects(RedirectionError),

    /// `bare_do_until_found` saw a redirect other than 301/302.
    #[error("unexpected redirection response: {0}")]
    UnexpectedRedirect(RedirectionError),

    /// A 302 without a Location header.
    #[error("invalid or empty Location header in redirection response")]
    InvalidLocation,

    /// An endpoint required a different status.
    #[error("unexpected status code: {status}")]
    UnexpectedStatus {
        /// Status received.
        status: StatusCode,
        /// The response that carried it.
        response: Box<Response>,
    },

    /// Cancellation or deadline.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid configuration or request construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// URL could not be parsed or resolved.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Body or query encoding failed.
    #[error("failed to serialize request: {0}")]
    Serialization(String),

    /// Body decoding failed.
    #[error("failed to deserialize response: {0}")]
    Deserialization(String),

    /// Writing to a byte sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitHubError {
    /// Gets the error kind.
    pub fn kind(&self) -> GitHubErrorKind {
        match self {
            Self::Response(_) => GitHubErrorKind::ApiError,
            Self::TwoFactorAuth(_) => GitHubErrorKind::TwoFactorAuthRequired,
            Self::RateLimit(_) => GitHubErrorKind::PrimaryRateLimitExceeded,
            Self::AbuseRateLimit(_) => GitHubErrorKind::SecondaryRateLimitExceeded,
            Self::Accepted(_) => GitHubErrorKind::Accepted,
            Self::Redirection(_) => GitHubErrorKind::Redirection,
            Self::TooManyRedirects(_) => GitHubErrorKind::TooManyRedirects,
            Self::UnexpectedRedirect(_) => GitHubErrorKind::UnexpectedRedirect,
            Self::InvalidLocation => GitHubErrorKind::InvalidLocation,
            Self::UnexpectedStatus { .. } => GitHubErrorKind::UnexpectedStatus,
            Self::Context(ContextError::Canceled) => GitHubErrorKind::Canceled,
            Self::Context(ContextError::DeadlineExceeded) => GitHubErrorKind::DeadlineExceeded,
            Self::Transport(e) => e.error_kind(),
            Self::Configuration(_) => GitHubErrorKind::InvalidConfiguration,
            Self::InvalidUrl(_) => GitHubErrorKind::InvalidUrl,
            Self::Serialization(_) => GitHubErrorKind::SerializationError,
            Self::Deserialization(_) => GitHubErrorKind::DeserializationError,
            Self::Io(_) => GitHubErrorKind::Io,
        }
    }

    /// Reports whether `other` is the same error: same variant and same
    /// material fields.
    pub fn is(&self, other: &GitHubError) -> bool {
        match (self, other) {
            (Self::Response(a), Self::Response(b)) => a == b,
            (Self::TwoFactorAuth(a), Self::TwoFactorAuth(b)) => a == b,
            (Self::RateLimit(a), Self::RateLimit(b)) => a == b,
            (Self::AbuseRateLimit(a), Self::AbuseRateLimit(b)) => a == b,
            (Self::Accepted(a), Self::Accepted(b)) => a == b,
            (Self::Redirection(a), Self::Redirection(b)) => a == b,
            (Self::TooManyRedirects(a), Self::TooManyRedirects(b)) => a == b,
            (Self::UnexpectedRedirect(a), Self::UnexpectedRedirect(b)) => a == b,
            (Self::InvalidLocation, Self::InvalidLocation) => true,
            (Self::Context(a), Self::Context(b)) => a == b,
            (
                Self::UnexpectedStatus { status: a, .. },
                Self::UnexpectedStatus { status: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    /// Gets the HTTP response behind this error, if any.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::Response(e) => Some(&e.response),
            Self::TwoFactorAuth(e) => Some(&e.0.response),
            Self::RateLimit(e) => Some(&e.response),
            Self::AbuseRateLimit(e) => Some(&e.response),
            Self::Redirection(e) | Self::TooManyRedirects(e) | Self::UnexpectedRedirect(e) => {
                Some(&e.response)
            }
            Self::UnexpectedStatus { response, .. } => Some(response.http()),
            _ => None,
        }
    }

    /// Gets the HTTP status code.
    pub fn status_code(&self) -> Option<u16> {
        self.response().map(|r| r.status.as_u16())
    }

    /// Gets the documentation URL of an API error.
    pub fn documentation_url(&self) -> Option<&str> {
        match self {
            Self::Response(e) | Self::TwoFactorAuth(TwoFactorAuthError(e)) => {
                Some(e.documentation_url.as_str()).filter(|u| !u.is_empty())
            }
            _ => None,
        }
    }

    /// Gets the rate snapshot attached to a primary rate-limit error.
    pub fn rate(&self) -> Option<&Rate> {
        match self {
            Self::RateLimit(e) => Some(&e.rate),
            _ => None,
        }
    }

    /// Returns the retry-after duration of a secondary rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::AbuseRateLimit(e) => e.retry_after,
            _ => None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(message: impl fmt::Display) -> Self {
        Self::InvalidUrl(message.to_string())
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl fmt::Display) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Creates a deserialization error.
    pub fn deserialization(message: impl fmt::Display) -> Self {
        Self::Deserialization(message.to_string())
    }
}

/// Checks if an error is a rate limit error.
pub fn is_rate_limit_error(error: &GitHubError) -> bool {
    matches!(
        error.kind(),
        GitHubErrorKind::PrimaryRateLimitExceeded | GitHubErrorKind::SecondaryRateLimitExceeded
    )
}

/// A single validation failure from an error envelope.
///
/// GitHub sometimes sends these as bare strings; those decode into
/// `message` with the other fields empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    /// Resource on which the error occurred.
    pub resource: String,
    /// Field on which the error occurred.
    pub field: String,
    /// Validation error code.
    pub code: String,
    /// Message describing the error.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl<'de> Deserialize<'de> for ErrorDetail {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Message(String),
            Detail {
                #[serde(default)]
                resource: String,
                #[serde(default)]
                field: String,
                #[serde(default)]
                code: String,
                #[serde(default)]
                message: String,
            },
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Message(message) => ErrorDetail {
                message,
                ..Default::default()
            },
            Wire::Detail {
                resource,
                field,
                code,
                message,
            } => ErrorDetail {
                resource,
                field,
                code,
                message,
            },
        })
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error caused by {} field on {} resource",
            self.code, self.field, self.resource
        )
    }
}

/// Why access to a resource was blocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBlock {
    /// Block reason, e.g. "dmca".
    #[serde(default)]
    pub reason: String,
    /// When the block was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<Vec<ErrorDetail>>,
    #[serde(default)]
    block: Option<ErrorBlock>,
    #[serde(default)]
    documentation_url: Option<String>,
}

/// Error envelope decoded from a non-2xx response body.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// The response that caused this error.
    pub response: Box<HttpResponse>,
    /// Error message.
    pub message: String,
    /// Individual validation failures.
    pub errors: Vec<ErrorDetail>,
    /// Block details for legal takedowns and similar.
    pub block: Option<ErrorBlock>,
    /// Link to the relevant documentation.
    pub documentation_url: String,
}

impl ErrorResponse {
    /// Decodes the envelope from `response`; an undecodable body yields
    /// an empty envelope.
    pub fn from_http(response: &HttpResponse) -> Self {
        let envelope: ErrorEnvelope = serde_json::from_slice(&response.body).unwrap_or_default();
        Self {
            response: Box::new(response.clone()),
            message: envelope.message.unwrap_or_default(),
            errors: envelope.errors.unwrap_or_default(),
            block: envelope.block,
            documentation_url: envelope.documentation_url.unwrap_or_default(),
        }
    }
}

impl PartialEq for ErrorResponse {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.documentation_url == other.documentation_url
            && self.response.status == other.response.status
            && self.errors == other.errors
            && self.block == other.block
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{}: {} {} [{}]",
            request_line(&self.response),
            self.response.status.as_u16(),
            self.message,
            errors.join(", ")
        )
    }
}

impl std::error::Error for ErrorResponse {}

/// 401 raised because the account requires a one-time password.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoFactorAuthError(pub ErrorResponse);

impl fmt::Display for TwoFactorAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for TwoFactorAuthError {}

/// Primary rate limit exhausted, either reported by GitHub or predicted
/// from the ledger.
#[derive(Debug, Clone)]
pub struct RateLimitError {
    /// Rate snapshot at the time of the error.
    pub rate: Rate,
    /// The response, synthetic when the request never left the client.
    pub response: Box<HttpResponse>,
    /// Error message.
    pub message: String,
}

impl PartialEq for RateLimitError {
    fn eq(&self, other: &Self) -> bool {
        self.rate == other.rate
            && self.message == other.message
            && self.response.status == other.response.status
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let until_reset = self
            .rate
            .reset
            .map(|reset| reset - Utc::now())
            .unwrap_or_else(chrono::Duration::zero);
        write!(
            f,
            "{}: {} {} {}",
            request_line(&self.response),
            self.response.status.as_u16(),
            self.message,
            format_rate_reset(until_reset)
        )
    }
}

impl std::error::Error for RateLimitError {}

/// 202 Accepted: results are not ready yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedError {
    /// The response body, kept verbatim.
    pub raw: Bytes,
}

impl AcceptedError {
    /// Decodes the raw body as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> GitHubResult<T> {
        serde_json::from_slice(&self.raw).map_err(GitHubError::deserialization)
    }
}

impl fmt::Display for AcceptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job scheduled on GitHub side; try again later")
    }
}

impl std::error::Error for AcceptedError {}

/// Secondary (abuse) rate limit triggered.
#[derive(Debug, Clone)]
pub struct AbuseRateLimitError {
    /// The response, synthetic when the request never left the client.
    pub response: Box<HttpResponse>,
    /// Error message.
    pub message: String,
    /// How long to wait before retrying, when GitHub says.
    pub retry_after: Option<Duration>,
}

impl PartialEq for AbuseRateLimitError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.retry_after == other.retry_after
            && self.response.status == other.response.status
    }
}

impl fmt::Display for AbuseRateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}",
            request_line(&self.response),
            self.response.status.as_u16(),
            self.message
        )
    }
}

impl std::error::Error for AbuseRateLimitError {}

/// A 3xx response that reached the caller.
#[derive(Debug, Clone)]
pub struct RedirectionError {
    /// The redirect response.
    pub response: Box<HttpResponse>,
    /// Redirect status code.
    pub status_code: u16,
    /// Location header, resolved against the request URL when relative.
    pub location: Option<Url>,
}

impl PartialEq for RedirectionError {
    fn eq(&self, other: &Self) -> bool {
        self.status_code == other.status_code
            && self.location.as_ref().map(Url::as_str) == other.location.as_ref().map(Url::as_str)
    }
}

impl fmt::Display for RedirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self
            .location
            .as_ref()
            .map(|l| sanitize_url(l).to_string())
            .unwrap_or_default();
        write!(
            f,
            "{}: {} location {}",
            request_line(&self.response),
            self.status_code,
            location
        )
    }
}

impl std::error::Error for RedirectionError {}

fn request_line(response: &HttpResponse) -> String {
    format!("{} {}", response.method, sanitize_url(&response.url))
}

/// Redacts a non-empty `client_secret` query parameter.
pub fn sanitize_url(url: &Url) -> Url {
    let has_secret = url
        .query_pairs()
        .any(|(k, v)| k == "client_secret" && !v.is_empty());
    if !has_secret {
        return url.clone();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "client_secret" {
                "REDACTED".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    let mut sanitized = url.clone();
    sanitized.query_pairs_mut().clear().extend_pairs(pairs);
    sanitized
}

const ABUSE_DOCS_SUFFIX: &str = "#abuse-rate-limits";
const SECONDARY_DOCS_SUFFIX: &str = "secondary-rate-limits";

/// Classifies a response: `Ok` for 2xx other than 202, a typed error
/// otherwise.
pub fn check_response(response: &HttpResponse) -> GitHubResult<()> {
    let status = response.status;
    if status == StatusCode::ACCEPTED {
        return Err(GitHubError::Accepted(AcceptedError {
            raw: response.body.clone(),
        }));
    }
    if status.is_success() {
        return Ok(());
    }

    let error = ErrorResponse::from_http(response);
    let header = |name: &str| response.header(name).unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED && header(HEADER_OTP).starts_with("required") {
        return Err(GitHubError::TwoFactorAuth(TwoFactorAuthError(error)));
    }

    if status == StatusCode::FORBIDDEN && header(HEADER_RATE_REMAINING) == "0" {
        return Err(GitHubError::RateLimit(RateLimitError {
            rate: Rate::from_headers(&response.headers),
            message: error.message,
            response: error.response,
        }));
    }

    if status == StatusCode::FORBIDDEN
        && (error.documentation_url.ends_with(ABUSE_DOCS_SUFFIX)
            || error.documentation_url.ends_with(SECONDARY_DOCS_SUFFIX))
    {
        return Err(GitHubError::AbuseRateLimit(AbuseRateLimitError {
            retry_after: parse_secondary_rate(&response.headers),
            message: error.message,
            response: error.response,
        }));
    }

    if matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) {
        let location = response
            .header(LOCATION.as_str())
            .filter(|l| !l.is_empty())
            .and_then(|l| response.url.join(l).ok());
        return Err(GitHubError::Redirection(RedirectionError {
            response: error.response,
            status_code: status.as_u16(),
            location,
        }));
    }

    Err(GitHubError::Response(error))
}

/// Maps a boolean-by-status endpoint result: success is `true`, a 404
/// API error is `false`, anything else is returned unchanged.
pub fn parse_bool_response(result: GitHubResult<Response>) -> GitHubResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(GitHubError::Response(e)) if e.response.status == StatusCode::NOT_FOUND => Ok(false),
        Err(e) => Err(e),
    }
}
