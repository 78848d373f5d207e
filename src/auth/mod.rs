//! Authentication transports for GitHub API.
//!
//! Each transport decorates an inner [`Transport`] and adds credentials to
//! every outbound request. The caller's request is consumed, never shared,
//! so applying credentials cannot leak into a request the caller still
//! holds.

use crate::config::HEADER_OTP;
use crate::errors::{GitHubError, GitHubResult};
use crate::transport::{default_transport, HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Authentication method for GitHub API.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Bearer token: PAT, OAuth token, Actions token or installation token.
    Token(SecretString),
    /// Username and password, with an optional one-time password.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: SecretString,
        /// One-time password for 2FA accounts.
        otp: Option<String>,
    },
    /// OAuth app credentials, used for the higher unauthenticated quota.
    ClientCredentials {
        /// OAuth app client ID.
        client_id: String,
        /// OAuth app client secret.
        client_secret: SecretString,
    },
}

impl AuthMethod {
    /// Creates a bearer token method.
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(SecretString::new(token.into()))
    }

    /// Creates a basic auth method.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::new(password.into()),
            otp: None,
        }
    }

    /// Creates a client credentials method.
    pub fn client_credentials(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::ClientCredentials {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }

    /// Gets the token prefix for logging.
    pub fn token_prefix(&self) -> &'static str {
        match self {
            Self::Token(t) => {
                let exposed = t.expose_secret();
                if exposed.starts_with("ghp_") {
                    "ghp_***"
                } else if exposed.starts_with("github_pat_") {
                    "github_pat_***"
                } else if exposed.starts_with("gho_") {
                    "gho_***"
                } else if exposed.starts_with("ghs_") {
                    "ghs_***"
                } else {
                    "***"
                }
            }
            Self::Basic { .. } => "basic",
            Self::ClientCredentials { .. } => "client_credentials",
        }
    }

    /// Wraps `inner` with the matching authentication transport.
    pub fn wrap(&self, inner: Arc<dyn Transport>) -> Arc<dyn Transport> {
        match self {
            Self::Token(token) => Arc::new(BearerTokenTransport::new(token.clone(), inner)),
            Self::Basic {
                username,
                password,
                otp,
            } => {
                let mut transport = BasicAuthTransport::new(username.clone(), password.clone(), inner);
                transport.otp = otp.clone();
                Arc::new(transport)
            }
            Self::ClientCredentials {
                client_id,
                client_secret,
            } => Arc::new(UnauthenticatedRateLimitedTransport::new(
                client_id.clone(),
                client_secret.clone(),
                inner,
            )),
        }
    }
}

/// Adds `Authorization: Bearer <token>` to every request.
pub struct BearerTokenTransport {
    token: SecretString,
    inner: Arc<dyn Transport>,
}

impl BearerTokenTransport {
    /// Wraps `inner`.
    pub fn new(token: SecretString, inner: Arc<dyn Transport>) -> Self {
        Self { token, inner }
    }

    /// Wraps the platform-default transport.
    pub fn with_default_transport(token: SecretString) -> GitHubResult<Self> {
        Ok(Self::new(token, default_transport()?))
    }
}

#[async_trait]
impl Transport for BearerTokenTransport {
    async fn round_trip(&self, mut request: HttpRequest) -> GitHubResult<HttpResponse> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token.expose_secret()))
            .map_err(|_| GitHubError::configuration("token contains invalid header characters"))?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        self.inner.round_trip(request).await
    }
}

/// Adds HTTP basic credentials, plus `x-github-otp` when an OTP is set.
pub struct BasicAuthTransport {
    /// Username.
    pub username: String,
    password: SecretString,
    /// One-time password sent with every request when non-empty.
    pub otp: Option<String>,
    inner: Arc<dyn Transport>,
}

impl BasicAuthTransport {
    /// Wraps `inner`.
    pub fn new(username: impl Into<String>, password: SecretString, inner: Arc<dyn Transport>) -> Self {
        Self {
            username: username.into(),
            password,
            otp: None,
            inner,
        }
    }

    /// Wraps the platform-default transport.
    pub fn with_default_transport(username: impl Into<String>, password: SecretString) -> GitHubResult<Self> {
        Ok(Self::new(username, password, default_transport()?))
    }

    /// Sets the one-time password.
    pub fn with_otp(mut self, otp: impl Into<String>) -> Self {
        self.otp = Some(otp.into());
        self
    }
}

#[async_trait]
impl Transport for BasicAuthTransport {
    async fn round_trip(&self, mut request: HttpRequest) -> GitHubResult<HttpResponse> {
        request.set_basic_auth(&self.username, self.password.expose_secret());
        if let Some(otp) = self.otp.as_deref().filter(|otp| !otp.is_empty()) {
            let value = HeaderValue::from_str(otp)
                .map_err(|_| GitHubError::configuration("OTP contains invalid header characters"))?;
            request.headers.insert(HEADER_OTP, value);
        }
        self.inner.round_trip(request).await
    }
}

/// Sends OAuth app client credentials as basic auth to get the higher
/// unauthenticated rate limit.
pub struct UnauthenticatedRateLimitedTransport {
    client_id: String,
    client_secret: SecretString,
    inner: Arc<dyn Transport>,
}

impl UnauthenticatedRateLimitedTransport {
    /// Wraps `inner`.
    pub fn new(client_id: impl Into<String>, client_secret: SecretString, inner: Arc<dyn Transport>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            inner,
        }
    }

    /// Wraps the platform-default transport.
    pub fn with_default_transport(client_id: impl Into<String>, client_secret: SecretString) -> GitHubResult<Self> {
        Ok(Self::new(client_id, client_secret, default_transport()?))
    }
}

#[async_trait]
impl Transport for UnauthenticatedRateLimitedTransport {
    async fn round_trip(&self, mut request: HttpRequest) -> GitHubResult<HttpResponse> {
        if self.client_id.is_empty() {
            return Err(GitHubError::configuration("client_id is empty"));
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(GitHubError::configuration("client_secret is empty"));
        }

        request.set_basic_auth(&self.client_id, self.client_secret.expose_secret());
        self.inner.round_trip(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use reqwest::{Method, StatusCode};
    use url::Url;

    mock! {
        Inner {}

        #[async_trait]
        impl Transport for Inner {
            async fn round_trip(&self, request: HttpRequest) -> GitHubResult<HttpResponse>;
        }
    }

    fn request() -> HttpRequest {
        HttpRequest::new(Method::GET, Url::parse("https://api.github.com/user").unwrap())
    }

    fn ok(request: HttpRequest) -> GitHubResult<HttpResponse> {
        Ok(HttpResponse::new(StatusCode::OK, request.method, request.url))
    }

    #[test]
    fn test_token_prefix() {
        assert_eq!(AuthMethod::token("ghp_xxxxxxxxxxxx").token_prefix(), "ghp_***");
        assert_eq!(AuthMethod::token("gho_xxxxxxxxxxxx").token_prefix(), "gho_***");
        assert_eq!(AuthMethod::basic("u", "p").token_prefix(), "basic");
    }

    #[tokio::test]
    async fn test_bearer_token_header() {
        let mut inner = MockInner::new();
        inner
            .expect_round_trip()
            .withf(|req| req.header("authorization") == Some("Bearer ghp_test"))
            .times(1)
            .returning(ok);

        let transport = BearerTokenTransport::new(SecretString::new("ghp_test".into()), Arc::new(inner));
        let response = transport.round_trip(request()).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_basic_auth_with_otp() {
        let mut inner = MockInner::new();
        inner
            .expect_round_trip()
            .withf(|req| {
                req.header("authorization") == Some("Basic b2N0b2NhdDpodW50ZXIy")
                    && req.header(HEADER_OTP) == Some("123456")
            })
            .times(1)
            .returning(ok);

        let transport = BasicAuthTransport::new("octocat", SecretString::new("hunter2".into()), Arc::new(inner))
            .with_otp("123456");
        transport.round_trip(request()).await.unwrap();
    }

    #[tokio::test]
    async fn test_basic_auth_without_otp() {
        let mut inner = MockInner::new();
        inner
            .expect_round_trip()
            .withf(|req| req.header(HEADER_OTP).is_none())
            .times(1)
            .returning(ok);

        let transport = BasicAuthTransport::new("octocat", SecretString::new("hunter2".into()), Arc::new(inner));
        transport.round_trip(request()).await.unwrap();
    }

    #[tokio::test]
    async fn test_client_credentials_fail_fast() {
        let mut inner = MockInner::new();
        inner.expect_round_trip().times(0);
        let inner: Arc<dyn Transport> = Arc::new(inner);

        let missing_id = UnauthenticatedRateLimitedTransport::new("", SecretString::new("s".into()), inner.clone());
        let err = missing_id.round_trip(request()).await.unwrap_err();
        assert!(err.to_string().contains("client_id is empty"));

        let missing_secret = UnauthenticatedRateLimitedTransport::new("id", SecretString::new(String::new()), inner);
        let err = missing_secret.round_trip(request()).await.unwrap_err();
        assert!(err.to_string().contains("client_secret is empty"));
    }

    #[tokio::test]
    async fn test_auth_method_wrap() {
        let mut inner = MockInner::new();
        inner
            .expect_round_trip()
            .withf(|req| req.header("authorization") == Some("Basic aWQ6c2VjcmV0"))
            .times(1)
            .returning(ok);

        let transport = AuthMethod::client_credentials("id", "secret").wrap(Arc::new(inner));
        transport.round_trip(request()).await.unwrap();
    }
}
