//! Repository operations.

use crate::client::{GitHubClient, NO_BODY};
use crate::context::Context;
use crate::errors::GitHubResult;
use crate::pagination::{add_options, ListOptions, UploadOptions};
use crate::response::Response;
use crate::rules::{BranchRules, RepositoryRuleset};
use crate::types::{ReleaseAsset, Repository};
use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use url::Url;

/// Options for listing the repositories of an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryListByOrgOptions {
    /// `all`, `public`, `private`, `forks`, `sources` or `member`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<String>,
    /// `created`, `updated`, `pushed` or `full_name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// `asc` or `desc`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Paging.
    #[serde(flatten)]
    pub list_options: ListOptions,
}

/// Options for listing repository rulesets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryListRulesetsOptions {
    /// Include rulesets configured above the repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes_parents: Option<bool>,
    /// Paging.
    #[serde(flatten)]
    pub list_options: ListOptions,
}

#[derive(Serialize)]
struct IncludesParents {
    includes_parents: bool,
}

/// Archive format of a download link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// `.tar.gz`.
    Tarball,
    /// `.zip`.
    Zipball,
}

impl ArchiveFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Tarball => "tarball",
            Self::Zipball => "zipball",
        }
    }
}

/// Service for repository operations.
pub struct RepositoriesService<'a> {
    client: &'a GitHubClient,
}

impl<'a> RepositoriesService<'a> {
    /// Creates a new repositories service.
    pub fn new(client: &'a GitHubClient) -> Self {
        Self { client }
    }

    /// Gets a repository.
    pub async fn get(&self, ctx: &Context, owner: &str, repo: &str) -> GitHubResult<(Repository, Response)> {
        let request = self
            .client
            .new_request(Method::GET, &format!("repos/{owner}/{repo}"), NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Lists the repositories of an organization.
    pub async fn list_by_org(
        &self,
        ctx: &Context,
        org: &str,
        opts: Option<&RepositoryListByOrgOptions>,
    ) -> GitHubResult<(Vec<Repository>, Response)> {
        let url = add_options(&format!("orgs/{org}/repos"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Gets the download link of a repository archive.
    ///
    /// Returns the location GitHub redirects to; the archive itself is
    /// not fetched. An empty `git_ref` means the default branch.
    pub async fn get_archive_link(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        format: ArchiveFormat,
        git_ref: &str,
        max_redirects: usize,
    ) -> GitHubResult<(Url, Response)> {
        let mut path = format!("repos/{owner}/{repo}/{}", format.as_str());
        if !git_ref.is_empty() {
            path.push('/');
            path.push_str(git_ref);
        }
        self.client.redirect_location(ctx, &path, max_redirects).await
    }

    /// Uploads a release asset to the upload URL.
    ///
    /// `opts.name` is required. An empty `opts.media_type` uploads as
    /// `application/octet-stream`.
    pub async fn upload_release_asset(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        release_id: i64,
        opts: &UploadOptions,
        body: impl Into<Bytes>,
    ) -> GitHubResult<(ReleaseAsset, Response)> {
        let body: Bytes = body.into();
        let size = body.len() as u64;
        let url = add_options(
            &format!("repos/{owner}/{repo}/releases/{release_id}/assets"),
            Some(opts),
        )?;
        let request = self
            .client
            .new_upload_request(&url, body, size, &opts.media_type, &[])?;
        self.client.do_json(ctx, request).await
    }

    // Rules

    /// Gets every rule that applies to a branch, with the ruleset each
    /// comes from.
    pub async fn get_rules_for_branch(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        branch: &str,
        opts: Option<&ListOptions>,
    ) -> GitHubResult<(BranchRules, Response)> {
        let url = add_options(&format!("repos/{owner}/{repo}/rules/branches/{branch}"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Lists the rulesets of a repository.
    pub async fn get_all_rulesets(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        opts: Option<&RepositoryListRulesetsOptions>,
    ) -> GitHubResult<(Vec<RepositoryRuleset>, Response)> {
        let url = add_options(&format!("repos/{owner}/{repo}/rulesets"), opts)?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Gets a repository ruleset.
    pub async fn get_ruleset(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        ruleset_id: i64,
        includes_parents: bool,
    ) -> GitHubResult<(RepositoryRuleset, Response)> {
        let url = add_options(
            &format!("repos/{owner}/{repo}/rulesets/{ruleset_id}"),
            Some(&IncludesParents { includes_parents }),
        )?;
        let request = self.client.new_request(Method::GET, &url, NO_BODY, &[])?;
        self.client.do_json(ctx, request).await
    }

    /// Creates a repository ruleset.
    pub async fn create_ruleset(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> GitHubResult<(RepositoryRuleset, Response)> {
        let request = self.client.new_request(
            Method::POST,
            &format!("repos/{owner}/{repo}/rulesets"),
            Some(ruleset),
            &[],
        )?;
        self.client.do_json(ctx, request).await
    }

    /// Replaces a repository ruleset.
    pub async fn update_ruleset(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        ruleset_id: i64,
        ruleset: &RepositoryRuleset,
    ) -> GitHubResult<(RepositoryRuleset, Response)> {
        let request = self.client.new_request(
            Method::PUT,
            &format!("repos/{owner}/{repo}/rulesets/{ruleset_id}"),
            Some(ruleset),
            &[],
        )?;
        self.client.do_json(ctx, request).await
    }

    /// Deletes a repository ruleset.
    pub async fn delete_ruleset(
        &self,
        ctx: &Context,
        owner: &str,
        repo: &str,
        ruleset_id: i64,
    ) -> GitHubResult<Response> {
        let request = self.client.new_request(
            Method::DELETE,
            &format!("repos/{owner}/{repo}/rulesets/{ruleset_id}"),
            NO_BODY,
            &[],
        )?;
        self.client.bare_do(ctx, request).await
    }
}
