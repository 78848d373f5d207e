//! GitHub Actions operations.

use crate::client::{GitHubClient, NO_BODY};
use crate::context::Context;
use crate::errors::GitHubResult;
use crate::pagination::{add_options, ListOptions};
use crate::response::Response;
use crate::types::{RegistrationToken, Runners};
use reqwest::Method;
use serde::Serialize;
use url::Url;

/// Options for listing self-hosted runners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListRunnersOptions {
    /// Only runners with this name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Paging.
    #[serde(flatten)]
    pub list_options: ListOptions,
}

/// Service for GitHub Actions operations.
pub struct ActionsService<'a> {
    client: &'a GitHubClient,
}

impl<'a> ActionsService<'a> {
    /// Creates a new actions service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists the self-hosted runners of a repository.
    pub async fn list_runners(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        opts: Option<&ListRunnersOptions>,
    ) -> GitHubResult<(Runners, Response)> {
        let url = add_options(&format!("repos/{owner}/{repo}/actions/runners"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Creates a token for registering a self-hosted runner.
    pub async fn create_registration_token(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
    ) -> GitHubResult<(RegistrationToken, Response)> {
        let request = self.client.new_request(
            Method::POST,
            &format!("repos/{owner}/{repo}/actions/runners/registration-token"),
            NO_BODY,
            &[],
        )?;
        self.client.do_json(ctx, request).await
    }

    /// Gets the short-lived download URL of an artifact archive.
    pub async fn download_artifact(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        artifact_id: i64,
        max_redirects: usize,
    ) -> GitHubResult<(Url, Response)> {
        let path = format!("repos/{owner}/{repo}/actions/artifacts/{artifact_id}/zip");
        self.client.redirect_location(ctx, &path, max_redirects).await
    }

    /// Gets the short-lived download URL of a workflow job's logs.
    pub async fn get_workflow_job_logs(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        job_id: i64,
        max_redirects: usize,
    ) -> GitHubResult<(Url, Response)> {
        let path = format!("repos/{owner}/{repo}/actions/jobs/{job_id}/logs");
        self.client.redirect_location(ctx, &path, max_redirects).await
    }
}
