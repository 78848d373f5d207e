//! Team operations.

use crate::client::{GitHubClient, NO_BODY};
use crate::context::Context;
use crate::errors::GitHubResult;
use crate::pagination::{add_options, ListCursorOptions, ListOptions};
use crate::response::Response;
use crate::types::{IdpGroupList, Team};
use reqwest::Method;
use serde::Serialize;

/// Options for listing identity provider groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListIdpGroupsOptions {
    /// Only groups whose name contains this text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Paging. GitHub pages these by opaque token in `page`.
    #[serde(flatten)]
    pub cursor_options: ListCursorOptions,
}

/// Service for team operations.
pub struct TeamsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> TeamsService<'a> {
    /// Creates a new teams service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists the teams of an organization.
    pub async fn list_teams(
        &self,
        ctx: &Context,
        org: &str,
        opts: Option<&ListOptions>,
    ) -> GitHubResult<(Vec<Team>, Response)> {
        let url = add_options(&format!("orgs/{org}/teams"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Gets a team by slug.
    pub async fn get_team_by_slug(&self, ctx: &Context, org: &str, slug: &str) -> GitHubResult<(Team, Response)> {
        let request = self
            .client
            .new_request(Method::GET, &format!("orgs/{org}/teams/{slug}"), NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Lists the identity provider groups of an organization.
    ///
    /// The next page is named by `response.next_page_token`.
    pub async fn list_idp_groups_in_organization(
        &self,
        ctx: &Context,
        org: &str,
        opts: Option<&ListIdpGroupsOptions>,
    ) -> GitHubResult<(IdpGroupList, Response)> {
        let url = add_options(&format!("orgs/{org}/team-sync/groups"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }
}
