//! Code scanning operations.

use crate::client::{GitHubClient, NO_BODY};
use crate::context::Context;
use crate::errors::{GitHubError, GitHubResult};
use crate::pagination::{add_options, ListCursorOptions};
use crate::response::Response;
use crate::types::{CodeScanningAlert, SarifAnalysis, SarifId};
use reqwest::Method;
use serde::Serialize;

/// Options for listing code scanning alerts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertListOptions {
    /// `open`, `closed`, `dismissed` or `fixed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Only alerts on this ref.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// Only alerts of this severity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Only alerts from this tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Paging.
    #[serde(flatten)]
    pub cursor_options: ListCursorOptions,
}

/// Service for code scanning operations.
pub struct CodeScanningService<'a> {
    client: &'a GitHubClient,
}

impl<'a> CodeScanningService<'a> {
    /// Creates a new code scanning service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Lists the code scanning alerts of a repository.
    ///
    /// Pages are linked by cursor: pass `response.cursor` back as
    /// `cursor_options.cursor`.
    pub async fn list_alerts_for_repo(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        opts: Option<&AlertListOptions>,
    ) -> GitHubResult<(Vec<CodeScanningAlert>, Response)> {
        let url = add_options(&format!("repos/{owner}/{repo}/code-scanning/alerts"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Uploads a SARIF analysis.
    ///
    /// GitHub queues the upload and answers 202; the upload ID is read
    /// from the accepted payload.
    pub async fn upload_sarif(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        analysis: &SarifAnalysis,
    ) -> GitHubResult<SarifId> {
        let request = self.client.new_request(
            Method::POST,
            &format!("repos/{owner}/{repo}/code-scanning/sarifs"),
            Some(analysis),
            &[],
        )?;

        match self.client.do_json::<SarifId>(ctx, request).await {
            Ok((id, _)) => Ok(id),
            Err(GitHubError::Accepted(accepted)) => accepted.decode(),
            Err(e) => Err(e),
        }
    }
}
