//! Copilot business operations.

use crate::client::{GitHubClient, NO_BODY};
use crate::context::Context;
use crate::errors::GitHubResult;
use crate::pagination::{add_options, ListOptions};
use crate::response::Response;
use crate::types::{CopilotSeatDetails, ListCopilotSeatsResponse};
use reqwest::Method;

/// Service for Copilot operations.
pub struct CopilotService<'a> {
    client: &'a GitHubClient,
}

impl<'a> CopilotService<'a> {
    /// Creates a new Copilot service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists the Copilot seats of an organization.
    pub async fn list_copilot_seats(
        &self,
        ctx: &Context,
        org: &str,
        opts: Option<&ListOptions>,
    ) -> GitHubResult<(ListCopilotSeatsResponse, Response)> {
        let url = add_options(&format!("orgs/{org}/copilot/billing/seats"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Gets the Copilot seat of an organization member.
    pub async fn get_seat_details(
        &self,
        ctx: &Context,
        org: &str,
        user: &str,
    ) -> GitHubResult<(CopilotSeatDetails, Response)> {
        let request = self.client.new_request(
            Method::GET,
            &format!("orgs/{org}/members/{user}/copilot"),
            NO_BODY,
            &[],
        )?;
        self.client.do_json(ctx, request).await
    }
}
