//! Service tests against the scripted transport.

#[cfg(test)]
mod services_tests {
    use integrations_github_rest::mocks::{MockResponse, MockTransport};
    use integrations_github_rest::pagination::UploadOptions;
    use integrations_github_rest::rules::{
        PullRequestRuleParameters, RepositoryRuleType, RepositoryRuleset, RepositoryRulesetRules,
        RulesetEnforcement,
    };
    use integrations_github_rest::services::{
        AlertListOptions, ArchiveFormat, ListIdpGroupsOptions, ListMembersOptions,
        ListScimProvisionedIdentitiesOptions,
    };
    use integrations_github_rest::types::{SarifAnalysis, SeatAssignee};
    use integrations_github_rest::{Context, GitHubClient, GitHubErrorKind, ListOptions, RateLimitCategory};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn setup() -> (GitHubClient, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let client = GitHubClient::builder().transport(mock.clone()).build().unwrap();
        (client, mock)
    }

    fn ctx() -> Context {
        Context::background()
    }

    #[tokio::test]
    async fn test_is_member() {
        let (client, mock) = setup();
        mock.push(MockResponse::no_content());
        mock.push(MockResponse::not_found());
        mock.push(MockResponse::server_error());

        let orgs = client.organizations();
        assert!(assert_ok!(orgs.is_member(&ctx(), "o", "alice").await));
        assert!(!assert_ok!(orgs.is_member(&ctx(), "o", "bob").await));
        let err = assert_err!(orgs.is_member(&ctx(), "o", "carol").await);
        assert_eq!(err.kind(), GitHubErrorKind::ApiError);

        assert_eq!(mock.requests()[0].url.path(), "/orgs/o/members/alice");
    }

    #[tokio::test]
    async fn test_list_public_members_query() {
        let (client, mock) = setup();
        mock.push(MockResponse::ok(json!([{"id": 1, "login": "octocat"}])));

        let opts = ListMembersOptions {
            public_only: true,
            role: Some("admin".into()),
            list_options: ListOptions::new().with_per_page(10),
            ..Default::default()
        };
        let (members, _) = client
            .organizations()
            .list_members(&ctx(), "o", Some(&opts))
            .await
            .unwrap();

        assert_eq!(members[0].login, "octocat");
        assert_eq!(
            mock.requests()[0].url.as_str(),
            "https://api.github.com/orgs/o/public_members?role=admin&per_page=10"
        );
    }

    #[tokio::test]
    async fn test_list_orgs_for_authenticated_user() {
        let (client, mock) = setup();
        mock.push(MockResponse::ok(json!([{"id": 1, "login": "github"}])));
        mock.push(MockResponse::ok(json!([])));

        let (orgs, _) = client.organizations().list(&ctx(), "", None).await.unwrap();
        assert_eq!(orgs[0].login, "github");
        client
            .organizations()
            .list(&ctx(), "octocat", Some(&ListOptions::new().with_page(2)))
            .await
            .unwrap();

        let seen = mock.requests();
        assert_eq!(seen[0].url.path(), "/user/orgs");
        assert_eq!(seen[1].url.as_str(), "https://api.github.com/users/octocat/orgs?page=2");
    }

    #[tokio::test]
    async fn test_create_ruleset_encodes_rules() {
        let (client, mock) = setup();
        mock.push(MockResponse::created(json!({
            "id": 42,
            "name": "main",
            "source": "o/r",
            "enforcement": "active",
            "rules": [{"type": "creation"}, {"type": "pull_request", "parameters": {"required_approving_review_count": 2}}]
        })));

        let mut ruleset = RepositoryRuleset::new("main", RulesetEnforcement::Active);
        ruleset.rules = Some(RepositoryRulesetRules {
            creation: Some(Default::default()),
            pull_request: Some(PullRequestRuleParameters {
                required_approving_review_count: 2,
                ..Default::default()
            }),
            ..Default::default()
        });

        let (created, _) = client
            .repositories()
            .create_ruleset(&ctx(), "o", "r", &ruleset)
            .await
            .unwrap();
        assert_eq!(created.id, Some(42));
        assert_eq!(
            created.rules.map(|r| r.rule_types()),
            Some(vec![RepositoryRuleType::Creation, RepositoryRuleType::PullRequest])
        );

        let sent = &mock.requests()[0];
        assert_eq!(sent.url.path(), "/repos/o/r/rulesets");
        assert_eq!(sent.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["rules"][0], json!({"type": "creation"}));
        assert_eq!(body["rules"][1]["parameters"]["required_approving_review_count"], 2);
    }

    #[tokio::test]
    async fn test_get_ruleset_includes_parents() {
        let (client, mock) = setup();
        mock.push(MockResponse::ok(json!({"id": 7, "name": "n", "enforcement": "evaluate"})));

        let (ruleset, _) = client
            .repositories()
            .get_ruleset(&ctx(), "o", "r", 7, true)
            .await
            .unwrap();
        assert_eq!(ruleset.enforcement, RulesetEnforcement::Evaluate);
        assert_eq!(
            mock.requests()[0].url.as_str(),
            "https://api.github.com/repos/o/r/rulesets/7?includes_parents=true"
        );
    }

    #[tokio::test]
    async fn test_rules_for_branch() {
        let (client, mock) = setup();
        mock.push(MockResponse::ok(json!([
            {"type": "deletion", "ruleset_source_type": "Repository", "ruleset_source": "o/r", "ruleset_id": 1},
            {"type": "max_file_size", "ruleset_source_type": "Organization", "ruleset_source": "o", "ruleset_id": 2,
             "parameters": {"max_file_size": 10}}
        ])));

        let (rules, _) = client
            .repositories()
            .get_rules_for_branch(&ctx(), "o", "r", "main", None)
            .await
            .unwrap();
        assert_eq!(rules.deletion.len(), 1);
        assert_eq!(rules.max_file_size[0].parameters.max_file_size, 10);
        assert_eq!(rules.max_file_size[0].metadata.ruleset_source, "o");
    }

    #[tokio::test]
    async fn test_archive_link() {
        let (client, mock) = setup();
        mock.push(MockResponse::redirect(302, "https://codeload.github.com/o/r/legacy.zip/main"));

        let (url, _) = client
            .repositories()
            .get_archive_link(&ctx(), "o", "r", ArchiveFormat::Zipball, "main", 1)
            .await
            .unwrap();
        assert_eq!(url.as_str(), "https://codeload.github.com/o/r/legacy.zip/main");
        assert_eq!(mock.requests()[0].url.path(), "/repos/o/r/zipball/main");
    }

    #[tokio::test]
    async fn test_archive_link_requires_found() {
        let (client, mock) = setup();
        mock.push(MockResponse::ok(json!({})));

        let err = client
            .repositories()
            .get_archive_link(&ctx(), "o", "r", ArchiveFormat::Tarball, "", 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), GitHubErrorKind::UnexpectedStatus);
        assert_eq!(mock.requests()[0].url.path(), "/repos/o/r/tarball");
    }

    #[tokio::test]
    async fn test_upload_release_asset() {
        let (client, mock) = setup();
        mock.push(MockResponse::created(json!({"id": 1, "name": "a.zip", "size": 2, "state": "uploaded"})));

        let opts = UploadOptions {
            name: "a.zip".into(),
            media_type: "application/zip".into(),
            ..Default::default()
        };
        let (asset, _) = client
            .repositories()
            .upload_release_asset(&ctx(), "o", "r", 5, &opts, b"PK".to_vec())
            .await
            .unwrap();
        assert_eq!(asset.name, "a.zip");

        let sent = &mock.requests()[0];
        assert_eq!(
            sent.url.as_str(),
            "https://uploads.github.com/repos/o/r/releases/5/assets?name=a.zip"
        );
        assert_eq!(sent.header("content-type"), Some("application/zip"));
        assert_eq!(sent.header("content-length"), Some("2"));
    }

    #[tokio::test]
    async fn test_upload_sarif_reads_accepted_payload() {
        let (client, mock) = setup();
        mock.push(MockResponse::accepted(
            r#"{"id":"47177e22-5596-11eb-80a1-c1e54ef945c6","url":"https://api.github.com/repos/o/r/code-scanning/sarifs/47177e22"}"#,
        ));

        let analysis = SarifAnalysis {
            commit_sha: "abc".into(),
            git_ref: "refs/heads/main".into(),
            sarif: "H4sI".into(),
            ..Default::default()
        };
        let id = client
            .code_scanning()
            .upload_sarif(&ctx(), "o", "r", &analysis)
            .await
            .unwrap();
        assert_eq!(id.id.as_deref(), Some("47177e22-5596-11eb-80a1-c1e54ef945c6"));

        let sent = &mock.requests()[0];
        let body: serde_json::Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["ref"], "refs/heads/main");
    }

    #[tokio::test]
    async fn test_alerts_cursor_paging() {
        let (client, mock) = setup();
        mock.push(
            MockResponse::ok(json!([{"number": 3, "state": "open"}]))
                .with_link(r#"<https://api.github.com/repos/o/r/code-scanning/alerts?cursor=Y3Vyc29y&per_page=1>; rel="next""#),
        );

        let mut opts = AlertListOptions {
            state: Some("open".into()),
            ..Default::default()
        };
        opts.cursor_options.per_page = 1;
        let (alerts, resp) = client
            .code_scanning()
            .list_alerts_for_repo(&ctx(), "o", "r", Some(&opts))
            .await
            .unwrap();

        assert_eq!(alerts[0].number, 3);
        assert_eq!(resp.cursor.as_deref(), Some("Y3Vyc29y"));
        assert_eq!(
            mock.requests()[0].url.query(),
            Some("state=open&per_page=1")
        );
    }

    #[tokio::test]
    async fn test_idp_groups_page_token() {
        let (client, mock) = setup();
        mock.push(
            MockResponse::ok(json!({"groups": [{"group_id": "1", "group_name": "n", "group_description": "d"}]}))
                .with_link(r#"<https://api.github.com/organizations/1/team-sync/groups?page=Z3JvdXA&q=n>; rel="next""#),
        );

        let opts = ListIdpGroupsOptions {
            q: Some("n".into()),
            ..Default::default()
        };
        let (groups, resp) = client
            .teams()
            .list_idp_groups_in_organization(&ctx(), "o", Some(&opts))
            .await
            .unwrap();

        assert_eq!(groups.groups[0].group_name, "n");
        assert_eq!(resp.next_page, 0);
        assert_eq!(resp.next_page_token.as_deref(), Some("Z3JvdXA"));
    }

    #[tokio::test]
    async fn test_scim_uses_scim_bucket() {
        let (client, mock) = setup();
        mock.push(
            MockResponse::ok(json!({"totalResults": 0, "Resources": []}))
                .with_header("x-ratelimit-limit", "900")
                .with_header("x-ratelimit-remaining", "899")
                .with_header("x-ratelimit-reset", "1900000000")
                .with_header("x-ratelimit-resource", "scim"),
        );

        let opts = ListScimProvisionedIdentitiesOptions {
            start_index: Some(1),
            count: Some(50),
            ..Default::default()
        };
        client
            .scim()
            .list_scim_provisioned_identities(&ctx(), "o", Some(&opts))
            .await
            .unwrap();

        assert_eq!(
            mock.requests()[0].url.as_str(),
            "https://api.github.com/scim/v2/organizations/o/Users?startIndex=1&count=50"
        );
        let limits = client.rate_limits();
        assert_eq!(limits.get(RateLimitCategory::Scim).remaining, 899);
        assert_eq!(limits.get(RateLimitCategory::Core).limit, 0);
    }

    #[tokio::test]
    async fn test_copilot_seats_mixed_assignees() {
        let (client, mock) = setup();
        mock.push(MockResponse::ok(json!({
            "total_seats": 2,
            "seats": [
                {"assignee": {"type": "User", "id": 1, "login": "octocat"}},
                {"assignee": {"type": "Team", "id": 2, "slug": "octo-team"}}
            ]
        })));

        let (page, _) = client
            .copilot()
            .list_copilot_seats(&ctx(), "o", None)
            .await
            .unwrap();
        assert_eq!(page.total_seats, 2);
        assert_eq!(page.seats[0].assignee.as_ref().and_then(SeatAssignee::user).map(|u| u.id), Some(1));
        assert_eq!(page.seats[1].assignee.as_ref().and_then(SeatAssignee::team).map(|t| t.slug.as_str()), Some("octo-team"));
    }

    #[tokio::test]
    async fn test_copilot_seat_without_assignee_type() {
        let (client, mock) = setup();
        mock.push(MockResponse::ok(json!({"assignee": {"id": 1}})));

        let err = client
            .copilot()
            .get_seat_details(&ctx(), "o", "octocat")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), GitHubErrorKind::DeserializationError);
        assert!(err.to_string().contains("assignee type field is not set"));
    }

    #[tokio::test]
    async fn test_runners_and_registration_token() {
        let (client, mock) = setup();
        mock.push(MockResponse::ok(json!({
            "total_count": 1,
            "runners": [{"id": 23, "name": "mac", "os": "macos", "status": "online", "busy": true,
                         "labels": [{"id": 5, "name": "self-hosted", "type": "read-only"}]}]
        })));
        mock.push(MockResponse::created(json!({"token": "LLBF3JGZDX3P5PMEXLND6TS6FCWO6", "expires_at": "2020-01-22T12:13:35Z"})));

        let (runners, _) = client.actions().list_runners(&ctx(), "o", "r", None).await.unwrap();
        assert_eq!(runners.runners[0].labels[0].name, "self-hosted");
        let (token, _) = client
            .actions()
            .create_registration_token(&ctx(), "o", "r")
            .await
            .unwrap();
        assert_eq!(token.token, "LLBF3JGZDX3P5PMEXLND6TS6FCWO6");
        assert_eq!(mock.requests()[1].method, reqwest::Method::POST);
    }
}
