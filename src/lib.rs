//! # GitHub REST Client Core
//!
//! The request lifecycle underneath a GitHub REST v3 client:
//! - Request construction against a base URL and an upload URL
//! - Link header pagination, offset and cursor style
//! - Per-category rate-limit accounting with pre-flight short-circuits
//! - Classification of failures into typed errors
//! - Redirect handling for download-link endpoints
//! - Authentication transports (bearer token, basic auth with OTP, OAuth
//!   app client credentials)
//! - The ruleset rule codec
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_github_rest::{Context, GitHubClient, ListOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GitHubClient::builder().token("ghp_xxxxxxxxxxxx").build()?;
//!     let ctx = Context::background();
//!
//!     let mut opts = ListOptions::new().with_per_page(50);
//!     loop {
//!         let (orgs, resp) = client.organizations().list(&ctx, "octocat", Some(&opts)).await?;
//!         for org in orgs {
//!             println!("{}", org.login);
//!         }
//!         if resp.next_page == 0 {
//!             break;
//!         }
//!         opts.page = resp.next_page;
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// Transport and authentication
pub mod auth;
pub mod transport;

// Request lifecycle
pub mod client;
pub mod context;
pub mod pagination;
pub mod rate_limit;
pub mod response;

// Rulesets
pub mod rules;

// API Services
pub mod services;

// Observability
pub mod observability;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use auth::{AuthMethod, BasicAuthTransport, BearerTokenTransport, UnauthenticatedRateLimitedTransport};
pub use client::{with_version, GitHubClient, GitHubClientBuilder, RequestOption, NO_BODY};
pub use config::{GitHubConfig, GitHubConfigBuilder};
pub use context::{CancelHandle, Context, ContextError};
pub use errors::{GitHubError, GitHubErrorKind, GitHubResult};
pub use pagination::{add_options, ListCursorOptions, ListOptions, UploadOptions};
pub use rate_limit::{Rate, RateLimitCategory, RateLimitSnapshot};
pub use response::Response;
pub use transport::{HttpRequest, HttpResponse, RequestBody, Transport};
pub use types::*;
