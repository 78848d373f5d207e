//! Rate limit operations.

use crate::client::{GitHubClient, NO_BODY};
use crate::context::Context;
use crate::errors::GitHubResult;
use crate::rate_limit::RateLimitCategory;
use crate::response::Response;
use crate::types::RateLimits;
use reqwest::Method;

/// Service for the rate limit endpoint.
pub struct RateLimitService<'a> {
    client: &'a GitHubClient,
}

impl<'a> RateLimitService<'a> {
    /// Creates a new rate limit service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Gets the limits of every category.
    ///
    /// The call is never short-circuited by the client's ledger, and every
    /// category in the payload is written back into it.
    pub async fn get(&self, ctx: &Context) -> GitHubResult<(RateLimits, Response)> {
        let request = self.client.new_request(Method::GET, "rate_limit", NO_BODY, &[])?;
        let ctx = ctx.clone().bypass_rate_limit_check();
        let (limits, response): (RateLimits, Response) = self.client.do_json(&ctx, request).await?;

        for category in RateLimitCategory::ALL {
            if let Some(rate) = limits.get(category) {
                self.client.ledger().record(category, rate.clone());
            }
        }
        Ok((limits, response))
    }
}
