//! Organization operations.

use crate::client::{GitHubClient, NO_BODY};
use crate::context::Context;
use crate::errors::{parse_bool_response, GitHubResult};
use crate::pagination::{add_options, ListOptions};
use crate::response::Response;
use crate::rules::RepositoryRuleset;
use crate::types::{Organization, User};
use reqwest::Method;
use serde::Serialize;

/// Options for listing organization members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListMembersOptions {
    /// List public members only. Selects a different endpoint.
    #[serde(skip)]
    pub public_only: bool,
    /// `2fa_disabled` or `all`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// `all`, `admin` or `member`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Paging.
    #[serde(flatten)]
    pub list_options: ListOptions,
}

/// Service for organization operations.
pub struct OrganizationsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> OrganizationsService<'a> {
    /// Creates a new organizations service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Gets an organization.
    pub async fn get(&self, ctx: &Context, org: &str) -> GitHubResult<(Organization, Response)> {
        let request = self
            .client
            .new_request(Method::GET, &format!("orgs/{org}"), NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Lists organizations of `user`, or of the authenticated user when
    /// `user` is empty.
    pub async fn list(
        &self,
        ctx: &Context,
        user: &str,
        opts: Option<&ListOptions>,
    ) -> GitHubResult<(Vec<Organization>, Response)> {
        let path = if user.is_empty() {
            "user/orgs".to_string()
        } else {
            format!("users/{user}/orgs")
        };
        let url = add_options(&path, opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Lists members of an organization.
    pub async fn list_members(
        &self,
        ctx: &Context,
        org: &str,
        opts: Option<&ListMembersOptions>,
    ) -> GitHubResult<(Vec<User>, Response)> {
        let path = if opts.is_some_and(|o| o.public_only) {
            format!("orgs/{org}/public_members")
        } else {
            format!("orgs/{org}/members")
        };
        let url = add_options(&path, opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Checks if a user is a member of an organization.
    pub async fn is_member(&self, ctx: &Context, org: &str, user: &str) -> GitHubResult<bool> {
        let request = self
            .client
            .new_request(Method::GET, &format!("orgs/{org}/members/{user}"), NO_BODY, &[])?;
        parse_bool_response(self.client.bare_do(ctx, request).await)
    }

    // Rulesets

    /// Lists the rulesets of an organization.
    pub async fn get_all_rulesets(
        &self,
        ctx: &Context,
        org: &str,
        opts: Option<&ListOptions>,
    ) -> GitHubResult<(Vec<RepositoryRuleset>, Response)> {
        let url = add_options(&format!("orgs/{org}/rulesets"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Gets an organization ruleset.
    pub async fn get_ruleset(
        &self,
        ctx: &Context,
        org: &str,
        ruleset_id: i64,
    ) -> GitHubResult<(RepositoryRuleset, Response)> {
        let request = self.client.new_request(
            Method::GET,
            &format!("orgs/{org}/rulesets/{ruleset_id}"),
            NO_BODY,
            &[],
        )?;
        self.client.do_json(ctx, request).await
    }

    /// Creates an organization ruleset.
    pub async fn create_ruleset(
        &self,
        ctx: &Context,
        org: &str,
        ruleset: &RepositoryRuleset,
    ) -> GitHubResult<(RepositoryRuleset, Response)> {
        let request = self.client.new_request(
            Method::POST,
            &format!("orgs/{org}/rulesets"),
            Some(ruleset),
            &[],
        )?;
        self.client.do_json(ctx, request).await
    }

    /// Deletes an organization ruleset.
    pub async fn delete_ruleset(&self, ctx: &Context, org: &str, ruleset_id: i64) -> GitHubResult<Response> {
        let request = self.client.new_request(
            Method::DELETE,
            &format!("orgs/{org}/rulesets/{ruleset_id}"),
            NO_BODY,
            &[],
        )?;
        self.client.bare_do(ctx, request).await
    }
}
