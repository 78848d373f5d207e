//! GitHub API client implementation.
//!
//! The client owns the transports, the rate-limit ledger and the request
//! defaults. Services borrow it, build a request with `new_request` and
//! hand it to one of the dispatchers.

mod dispatch;
mod request;

pub use request::{with_version, RequestOption, NO_BODY};

use crate::auth::{AuthMethod, BearerTokenTransport};
use crate::config::{enterprise_urls, GitHubConfig, GitHubConfigBuilder};
use crate::errors::{GitHubError, GitHubResult};
use crate::rate_limit::{RateLimitLedger, RateLimitSnapshot};
use crate::services::*;
use crate::transport::{FollowRedirects, ReqwestTransport, Transport};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// GitHub API client.
///
/// Requests go through one of two transports that share the same inner
/// round-tripper and differ only in redirect policy: the following
/// transport used by [`bare_do`](Self::bare_do) and the raw one used by
/// [`bare_do_ignore_redirects`](Self::bare_do_ignore_redirects).
pub struct GitHubClient {
    base_url: Url,
    upload_url: Url,
    user_agent: String,
    api_version: String,
    /// Transport without credentials, kept for `with_auth_token`.
    raw: Arc<dyn Transport>,
    /// `raw` with configured credentials applied. Never follows redirects.
    transport: Arc<dyn Transport>,
    follow: FollowRedirects,
    max_redirects: usize,
    ledger: RateLimitLedger,
    max_secondary_rate_limit_retry_after: Option<Duration>,
    rate_limit_redirectional_endpoints: bool,
}

impl GitHubClient {
    /// Creates a client with the reqwest transport built from `config`.
    pub fn new(config: GitHubConfig) -> GitHubResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Creates a client on top of a caller-supplied transport, e.g. a
    /// caching layer or a test double. The transport must not follow
    /// redirects itself.
    pub fn with_transport(config: GitHubConfig, transport: Arc<dyn Transport>) -> GitHubResult<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.base_url).map_err(GitHubError::invalid_url)?;
        let upload_url = Url::parse(&config.upload_url).map_err(GitHubError::invalid_url)?;
        let authenticated = match &config.auth {
            Some(auth) => auth.wrap(transport.clone()),
            None => transport.clone(),
        };

        Ok(Self {
            base_url,
            upload_url,
            user_agent: config.user_agent,
            api_version: config.api_version,
            raw: transport,
            follow: FollowRedirects::new(authenticated.clone(), config.max_redirects),
            transport: authenticated,
            max_redirects: config.max_redirects,
            ledger: RateLimitLedger::new(),
            max_secondary_rate_limit_retry_after: config.max_secondary_rate_limit_retry_after,
            rate_limit_redirectional_endpoints: config.rate_limit_redirectional_endpoints,
        })
    }

    /// Creates a new client builder.
    pub fn builder() -> GitHubClientBuilder {
        GitHubClientBuilder::new()
    }

    fn derive(&self, transport: Arc<dyn Transport>, base_url: Url, upload_url: Url) -> Self {
        Self {
            base_url,
            upload_url,
            user_agent: self.user_agent.clone(),
            api_version: self.api_version.clone(),
            raw: self.raw.clone(),
            follow: FollowRedirects::new(transport.clone(), self.max_redirects),
            transport,
            max_redirects: self.max_redirects,
            ledger: RateLimitLedger::from_snapshot(self.ledger.snapshot()),
            max_secondary_rate_limit_retry_after: self.max_secondary_rate_limit_retry_after,
            rate_limit_redirectional_endpoints: self.rate_limit_redirectional_endpoints,
        }
    }

    /// Returns a copy of this client that sends `token` as a bearer token,
    /// replacing any configured credentials. The copy starts from a
    /// snapshot of this client's rate-limit ledger.
    pub fn with_auth_token(&self, token: impl Into<String>) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(BearerTokenTransport::new(
            SecretString::new(token.into()),
            self.raw.clone(),
        ));
        self.derive(transport, self.base_url.clone(), self.upload_url.clone())
    }

    /// Returns a copy of this client pointed at a GitHub Enterprise Server.
    ///
    /// See [`enterprise_urls`] for the normalization applied.
    pub fn with_enterprise_urls(&self, base_url: &str, upload_url: &str) -> GitHubResult<Self> {
        let (base_url, upload_url) = enterprise_urls(base_url, upload_url)?;
        Ok(self.derive(self.transport.clone(), base_url, upload_url))
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Gets the upload URL.
    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    /// Gets the User-Agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Gets the default API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Gets the authenticated transport. It never follows redirects.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Copies the rate-limit ledger.
    pub fn rate_limits(&self) -> RateLimitSnapshot {
        self.ledger.snapshot()
    }

    pub(crate) fn ledger(&self) -> &RateLimitLedger {
        &self.ledger
    }

    /// Reports whether download-link endpoints go through rate accounting.
    pub fn rate_limits_redirectional_endpoints(&self) -> bool {
        self.rate_limit_redirectional_endpoints
    }

    // Service accessors

    /// Gets the rate limit service.
    pub fn rate_limit(&self) -> RateLimitService<'_> {
        RateLimitService::new(self)
    }

    /// Gets the organizations service.
    pub fn organizations(&self) -> OrganizationsService<'_> {
        OrganizationsService::new(self)
    }

    /// Gets the repositories service.
    pub fn repositories(&self) -> RepositoriesService<'_> {
        RepositoriesService::new(self)
    }

    /// Gets the actions service.
    pub fn actions(&self) -> ActionsService<'_> {
        ActionsService::new(self)
    }

    /// Gets the code scanning service.
    pub fn code_scanning(&self) -> CodeScanningService<'_> {
        CodeScanningService::new(self)
    }

    /// Gets the teams service.
    pub fn teams(&self) -> TeamsService<'_> {
        TeamsService::new(self)
    }

    /// Gets the SCIM service.
    pub fn scim(&self) -> ScimService<'_> {
        ScimService::new(self)
    }

    /// Gets the Copilot service.
    pub fn copilot(&self) -> CopilotService<'_> {
        CopilotService::new(self)
    }
}

/// Builder for GitHubClient.
pub struct GitHubClientBuilder {
    config_builder: GitHubConfigBuilder,
    transport: Option<Arc<dyn Transport>>,
}

impl GitHubClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: GitHubConfig::builder(),
            transport: None,
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(url);
        self
    }

    /// Sets the upload URL.
    pub fn upload_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.upload_url(url);
        self
    }

    /// Sets the authentication method.
    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.config_builder = self.config_builder.auth(auth);
        self
    }

    /// Sets a bearer token.
    pub fn token(self, token: impl Into<String>) -> Self {
        self.auth(AuthMethod::token(token))
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(ua);
        self
    }

    /// Sets the default API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_version(version);
        self
    }

    /// Caps server supplied secondary-limit waits.
    pub fn max_secondary_rate_limit_retry_after(mut self, max: Duration) -> Self {
        self.config_builder = self.config_builder.max_secondary_rate_limit_retry_after(max);
        self
    }

    /// Routes download-link endpoints through rate accounting.
    pub fn rate_limit_redirectional_endpoints(mut self, enabled: bool) -> Self {
        self.config_builder = self.config_builder.rate_limit_redirectional_endpoints(enabled);
        self
    }

    /// Uses a caller-supplied transport instead of reqwest.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    pub fn build(self) -> GitHubResult<GitHubClient> {
        let config = self.config_builder.build()?;
        match self.transport {
            Some(transport) => GitHubClient::with_transport(config, transport),
            None => GitHubClient::new(config),
        }
    }
}

impl Default for GitHubClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::mocks::{MockResponse, MockTransport};
    use reqwest::Method;

    fn client(mock: Arc<MockTransport>) -> GitHubClient {
        GitHubClient::builder().transport(mock).build().unwrap()
    }

    #[test]
    fn test_client_builder() {
        let result = GitHubClient::builder()
            .token("ghp_xxxx")
            .user_agent("test-client/1.0")
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn test_with_enterprise_urls() {
        let client = client(Arc::new(MockTransport::new()));
        let ghe = client
            .with_enterprise_urls("https://ghe.example.com", "https://ghe.example.com")
            .unwrap();
        assert_eq!(ghe.base_url().as_str(), "https://ghe.example.com/api/v3/");
        assert_eq!(ghe.upload_url().as_str(), "https://ghe.example.com/api/uploads/");
        assert_eq!(client.base_url().as_str(), "https://api.github.com/");
    }

    #[tokio::test]
    async fn test_with_auth_token_copies_ledger() {
        let mock = Arc::new(MockTransport::new());
        mock.push(MockResponse::ok(serde_json::json!({})).with_rate(5000, 4321, 1_900_000_000));
        mock.push(MockResponse::ok(serde_json::json!({})).with_rate(5000, 4000, 1_900_000_000));
        let client = client(mock.clone());

        let req = client.new_request(Method::GET, "user", NO_BODY, &[]).unwrap();
        client.bare_do(&Context::background(), req).await.unwrap();

        let authed = client.with_auth_token("ghp_second");
        assert_eq!(authed.rate_limits(), client.rate_limits());

        let req = authed.new_request(Method::GET, "user", NO_BODY, &[]).unwrap();
        authed.bare_do(&Context::background(), req).await.unwrap();

        let seen = mock.requests();
        assert_eq!(seen[0].header("authorization"), None);
        assert_eq!(seen[1].header("authorization"), Some("Bearer ghp_second"));
        assert_eq!(client.rate_limits().rates[0].remaining, 4321);
        assert_eq!(authed.rate_limits().rates[0].remaining, 4000);
    }
}
