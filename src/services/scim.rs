//! SCIM provisioning operations. These draw from the `scim` rate limit.

use crate::client::{GitHubClient, NO_BODY};
use crate::context::Context;
use crate::errors::GitHubResult;
use crate::pagination::add_options;
use crate::response::Response;
use crate::types::{ScimProvisionedIdentities, ScimUserAttributes};
use reqwest::Method;
use serde::Serialize;

/// Options for listing provisioned identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListScimProvisionedIdentitiesOptions {
    /// One-based index of the first result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// SCIM filter, e.g. `userName eq "octocat"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Service for SCIM operations.
pub struct ScimService<'a> {
    client: &'a GitHubClient,
}

impl<'a> ScimService<'a> {
    /// Creates a new SCIM service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists the identities provisioned in an organization.
    pub async fn list_scim_provisioned_identities(
        &self,
        ctx: &Context,
        org: &str,
        opts: Option<&ListScimProvisionedIdentitiesOptions>,
    ) -> GitHubResult<(ScimProvisionedIdentities, Response)> {
        let url = add_options(&format!("scim/v2/organizations/{org}/Users"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Gets one provisioned identity.
    pub async fn get_scim_provisioning_info(
        &self,
        ctx: &Context,
        org: &str,
        scim_user_id: &str,
    ) -> GitHubResult<(ScimUserAttributes, Response)> {
        let request = self.client.new_request(
            Method::GET,
            &format!("scim/v2/organizations/{org}/Users/{scim_user_id}"),
            NO_BODY,
            &[],
        )?;
        self.client.do_json(ctx, request).await
    }
}
