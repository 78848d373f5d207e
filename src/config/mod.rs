//! Configuration types for the GitHub client.

use crate::auth::AuthMethod;
use crate::errors::{GitHubError, GitHubResult};
use std::time::Duration;
use url::Url;

/// Crate version, reported in the default User-Agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default GitHub API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com/";

/// Default GitHub upload base URL.
pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.github.com/";

/// Default GitHub API version (date-based).
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = concat!("integrations-github-rest/", env!("CARGO_PKG_VERSION"));

/// Hop limit for the redirect-following transport.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default media type for API requests.
pub const MEDIA_TYPE_V3: &str = "application/vnd.github.v3+json";

/// Default media type for uploads.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// API version request header.
pub const HEADER_API_VERSION: &str = "x-github-api-version";
/// Rate limit ceiling response header.
pub const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";
/// Remaining requests response header.
pub const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
/// Used requests response header.
pub const HEADER_RATE_USED: &str = "x-ratelimit-used";
/// Reset epoch response header.
pub const HEADER_RATE_RESET: &str = "x-ratelimit-reset";
/// Rate limit resource response header.
pub const HEADER_RATE_RESOURCE: &str = "x-ratelimit-resource";
/// One-time password header.
pub const HEADER_OTP: &str = "x-github-otp";
/// Secondary limit wait header.
pub const HEADER_RETRY_AFTER: &str = "retry-after";
/// Token expiration response header.
pub const HEADER_TOKEN_EXPIRATION: &str = "github-authentication-token-expiration";
/// Set by caching transports on responses served from cache.
pub const HEADER_FROM_CACHE: &str = "x-from-cache";

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections per host.
    pub max_idle_per_host: usize,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 20,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// GitHub client configuration.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL. Must end with a slash for requests to build.
    pub base_url: String,
    /// Upload base URL. Must end with a slash for uploads to build.
    pub upload_url: String,
    /// API version header.
    pub api_version: String,
    /// Authentication method.
    pub auth: Option<AuthMethod>,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Connection pool configuration.
    pub pool: PoolConfig,
    /// Hop limit for the redirect-following transport.
    pub max_redirects: usize,
    /// Upper bound applied to a server supplied secondary-limit wait.
    pub max_secondary_rate_limit_retry_after: Option<Duration>,
    /// Route download-link endpoints through rate accounting.
    pub rate_limit_redirectional_endpoints: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            auth: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pool: PoolConfig::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_secondary_rate_limit_retry_after: None,
            rate_limit_redirectional_endpoints: false,
        }
    }
}

impl GitHubConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> GitHubConfigBuilder {
        GitHubConfigBuilder::new()
    }

    /// Loads configuration from the environment.
    ///
    /// `GITHUB_TOKEN` selects bearer authentication; `GITHUB_API_URL` and
    /// `GITHUB_UPLOAD_URL` override the endpoints (a trailing slash is
    /// added when missing, as Actions runners export them without one).
    pub fn from_env() -> GitHubResult<Self> {
        let mut builder = Self::builder();
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                builder = builder.auth(AuthMethod::token(token));
            }
        }
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            builder = builder.base_url(with_trailing_slash(&url));
        }
        if let Ok(url) = std::env::var("GITHUB_UPLOAD_URL") {
            builder = builder.upload_url(with_trailing_slash(&url));
        }
        builder.build()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GitHubError> {
        for (name, url) in [("Base URL", &self.base_url), ("Upload URL", &self.upload_url)] {
            if url.is_empty() {
                return Err(GitHubError::configuration(format!("{name} cannot be empty")));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(GitHubError::configuration(format!(
                    "{name} must start with http:// or https://"
                )));
            }
        }

        if self.user_agent.is_empty() {
            return Err(GitHubError::configuration("User-Agent is required by GitHub API"));
        }

        Ok(())
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Normalizes GitHub Enterprise Server endpoints.
///
/// A trailing slash is added, then `api/v3/` (base) or `api/uploads/`
/// (upload) is appended unless the path already ends with it or the host
/// is an `api.` host.
pub fn enterprise_urls(base_url: &str, upload_url: &str) -> GitHubResult<(Url, Url)> {
    let base = normalize_enterprise(base_url, "api/v3/")?;
    let upload = normalize_enterprise(upload_url, "api/uploads/")?;
    Ok((base, upload))
}

fn normalize_enterprise(raw: &str, suffix: &str) -> GitHubResult<Url> {
    let mut url = Url::parse(raw).map_err(GitHubError::invalid_url)?;

    let mut path = url.path().to_string();
    if !path.ends_with('/') {
        path.push('/');
    }

    let host = url.host_str().unwrap_or_default();
    let api_host = host.starts_with("api.") || host.contains(".api.");
    if !path.ends_with(&format!("/{suffix}")) && !api_host {
        path.push_str(suffix);
    }

    url.set_path(&path);
    Ok(url)
}

/// Builder for GitHubConfig.
#[derive(Debug, Default)]
pub struct GitHubConfigBuilder {
    base_url: Option<String>,
    upload_url: Option<String>,
    api_version: Option<String>,
    auth: Option<AuthMethod>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    pool: Option<PoolConfig>,
    max_redirects: Option<usize>,
    max_secondary_rate_limit_retry_after: Option<Duration>,
    rate_limit_redirectional_endpoints: bool,
}

impl GitHubConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the upload URL.
    pub fn upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = Some(url.into());
        self
    }

    /// Sets the API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the authentication method.
    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the connection pool configuration.
    pub fn pool(mut self, config: PoolConfig) -> Self {
        self.pool = Some(config);
        self
    }

    /// Sets the hop limit of the redirect-following transport.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Caps server supplied secondary-limit waits.
    pub fn max_secondary_rate_limit_retry_after(mut self, max: Duration) -> Self {
        self.max_secondary_rate_limit_retry_after = Some(max);
        self
    }

    /// Routes download-link endpoints through rate accounting.
    pub fn rate_limit_redirectional_endpoints(mut self, enabled: bool) -> Self {
        self.rate_limit_redirectional_endpoints = enabled;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<GitHubConfig, GitHubError> {
        let config = GitHubConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            upload_url: self.upload_url.unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),
            api_version: self.api_version.unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            auth: self.auth,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            pool: self.pool.unwrap_or_default(),
            max_redirects: self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
            max_secondary_rate_limit_retry_after: self.max_secondary_rate_limit_retry_after,
            rate_limit_redirectional_endpoints: self.rate_limit_redirectional_endpoints,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = GitHubConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.upload_url, DEFAULT_UPLOAD_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.max_redirects, 10);
        assert!(config.auth.is_none());
        assert!(DEFAULT_USER_AGENT.starts_with("integrations-github-rest/"));
    }

    #[test]
    fn test_config_builder() {
        let config = GitHubConfig::builder()
            .base_url("https://github.example.com/api/v3/")
            .user_agent("test-client/1.0")
            .timeout(Duration::from_secs(60))
            .max_secondary_rate_limit_retry_after(Duration::from_secs(120))
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://github.example.com/api/v3/");
        assert_eq!(config.user_agent, "test-client/1.0");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_secondary_rate_limit_retry_after, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(GitHubConfig::builder().base_url("invalid-url").build().is_err());
        assert!(GitHubConfig::builder().upload_url("").build().is_err());
        assert!(GitHubConfig::builder().user_agent("").build().is_err());
    }

    #[test]
    fn test_builder_keeps_missing_trailing_slash() {
        let config = GitHubConfig::builder()
            .base_url("https://github.example.com/api/v3")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "https://github.example.com/api/v3");
    }

    #[test_case("https://ghe.example.com", "https://ghe.example.com/api/v3/" ; "bare host")]
    #[test_case("https://ghe.example.com/", "https://ghe.example.com/api/v3/" ; "trailing slash")]
    #[test_case("https://ghe.example.com/api/v3", "https://ghe.example.com/api/v3/" ; "suffix without slash")]
    #[test_case("https://ghe.example.com/api/v3/", "https://ghe.example.com/api/v3/" ; "already normalized")]
    #[test_case("https://api.ghe.example.com", "https://api.ghe.example.com/" ; "api host")]
    #[test_case("https://octo.api.example.com/custom", "https://octo.api.example.com/custom/" ; "nested api host")]
    fn test_enterprise_base_url(input: &str, expected: &str) {
        let (base, _) = enterprise_urls(input, input).unwrap();
        assert_eq!(base.as_str(), expected);
    }

    #[test]
    fn test_enterprise_upload_url() {
        let (_, upload) = enterprise_urls("https://ghe.example.com", "https://ghe.example.com").unwrap();
        assert_eq!(upload.as_str(), "https://ghe.example.com/api/uploads/");

        let (_, upload) =
            enterprise_urls("https://ghe.example.com", "https://ghe.example.com/api/uploads").unwrap();
        assert_eq!(upload.as_str(), "https://ghe.example.com/api/uploads/");
    }

    #[test]
    fn test_enterprise_rejects_garbage() {
        assert!(enterprise_urls("not a url", "https://ghe.example.com").is_err());
    }
}
