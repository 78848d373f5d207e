//! Core data types for GitHub API.
//!
//! These are decoding targets for the bundled services. Fields GitHub may
//! leave out decode to their defaults.

use crate::rate_limit::{Rate, RateLimitCategory};
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// GitHub user (minimal representation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// User ID.
    pub id: u64,
    /// Username (login).
    pub login: String,
    /// User node ID.
    pub node_id: String,
    /// Avatar URL.
    pub avatar_url: String,
    /// User type (User, Organization, Bot).
    #[serde(rename = "type")]
    pub user_type: String,
    /// Site admin flag.
    pub site_admin: bool,
    /// Profile URL.
    pub html_url: String,
}

/// GitHub repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    /// Repository ID.
    pub id: u64,
    /// Node ID.
    pub node_id: String,
    /// Repository name.
    pub name: String,
    /// Full name (owner/repo).
    pub full_name: String,
    /// Owner information.
    pub owner: Option<User>,
    /// Whether the repository is private.
    pub private: bool,
    /// Repository description.
    pub description: Option<String>,
    /// Whether the repository is a fork.
    pub fork: bool,
    /// API URL.
    pub url: String,
    /// HTML URL.
    pub html_url: String,
    /// Default branch.
    pub default_branch: String,
    /// Visibility: public, private or internal.
    pub visibility: Option<String>,
    /// Whether the repository is archived.
    pub archived: bool,
    /// Topics.
    pub topics: Vec<String>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last push time.
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Release asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseAsset {
    /// Asset ID.
    pub id: u64,
    /// File name.
    pub name: String,
    /// Label.
    pub label: Option<String>,
    /// Content type.
    pub content_type: String,
    /// `uploaded` or `open`.
    pub state: String,
    /// Size in bytes.
    pub size: u64,
    /// Download URL.
    pub browser_download_url: String,
}

/// Organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    /// Organization ID.
    pub id: u64,
    /// Node ID.
    pub node_id: String,
    /// Organization login.
    pub login: String,
    /// Organization name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Company.
    pub company: Option<String>,
    /// Blog URL.
    pub blog: Option<String>,
    /// Location.
    pub location: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Account type, `Organization`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub org_type: Option<String>,
    /// Avatar URL.
    pub avatar_url: String,
    /// HTML URL.
    pub html_url: String,
    /// Public repos count.
    pub public_repos: u32,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    /// Team ID.
    pub id: u64,
    /// Node ID.
    pub node_id: String,
    /// Team slug.
    pub slug: String,
    /// Team name.
    pub name: String,
    /// Team description.
    pub description: Option<String>,
    /// Privacy level.
    pub privacy: Option<TeamPrivacy>,
    /// Permission level.
    pub permission: Option<String>,
    /// HTML URL.
    pub html_url: String,
    /// Members count.
    pub members_count: u32,
    /// Repos count.
    pub repos_count: u32,
    /// Parent team.
    pub parent: Option<Box<Team>>,
}

/// Team privacy level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TeamPrivacy {
    /// Secret team.
    Secret,
    /// Closed team.
    Closed,
}

/// All categories reported by `GET rate_limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    /// Rates keyed by category name.
    #[serde(default)]
    pub resources: HashMap<String, Rate>,
}

impl RateLimits {
    /// Gets the rate of one category, if reported.
    pub fn get(&self, category: RateLimitCategory) -> Option<&Rate> {
        self.resources.get(category.as_str())
    }
}

/// A runner label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerLabel {
    /// Label ID.
    pub id: Option<i64>,
    /// Label name.
    pub name: String,
    /// `read-only` or `custom`.
    #[serde(rename = "type")]
    pub label_type: Option<String>,
}

/// A self-hosted runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Runner {
    /// Runner ID.
    pub id: i64,
    /// Runner name.
    pub name: String,
    /// Operating system.
    pub os: String,
    /// `online` or `offline`.
    pub status: String,
    /// Whether a job is running.
    pub busy: bool,
    /// Labels.
    pub labels: Vec<RunnerLabel>,
}

/// A page of runners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Runners {
    /// Total across all pages.
    pub total_count: u32,
    /// Runners on this page.
    pub runners: Vec<Runner>,
}

/// Token used to register a self-hosted runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationToken {
    /// The token.
    pub token: String,
    /// When the token expires.
    pub expires_at: Option<DateTime<Utc>>,
}

/// A SARIF upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifAnalysis {
    /// Commit the analysis ran on.
    pub commit_sha: String,
    /// Ref the analysis ran on.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Gzipped then base64 encoded SARIF document.
    pub sarif: String,
    /// Root of the checkout, when it differs from the repository root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_uri: Option<String>,
    /// When the analysis started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

/// Identifier of a queued SARIF upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarifId {
    /// Upload ID.
    pub id: Option<String>,
    /// Status URL.
    pub url: Option<String>,
}

/// Code scanning rule that raised an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeScanningRule {
    /// Rule ID.
    pub id: Option<String>,
    /// Severity.
    pub severity: Option<String>,
    /// Description.
    pub description: Option<String>,
}

/// Code scanning tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeScanningTool {
    /// Tool name.
    pub name: Option<String>,
    /// Tool version.
    pub version: Option<String>,
}

/// A code scanning alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeScanningAlert {
    /// Alert number.
    pub number: u64,
    /// `open`, `dismissed` or `fixed`.
    pub state: String,
    /// HTML URL.
    pub html_url: String,
    /// Rule.
    pub rule: Option<CodeScanningRule>,
    /// Tool.
    pub tool: Option<CodeScanningTool>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

/// An identity provider group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpGroup {
    /// Group ID.
    pub group_id: String,
    /// Group name.
    pub group_name: String,
    /// Group description.
    pub group_description: String,
}

/// A page of identity provider groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpGroupList {
    /// Groups on this page.
    pub groups: Vec<IdpGroup>,
}

/// SCIM user name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScimUserName {
    /// First name.
    pub given_name: String,
    /// Last name.
    pub family_name: String,
    /// Full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

/// SCIM user email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScimUserEmail {
    /// Address.
    pub value: String,
    /// Whether this is the primary address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    /// Address kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub email_type: Option<String>,
}

/// A SCIM provisioned user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScimUserAttributes {
    /// SCIM ID.
    pub id: Option<String>,
    /// Identity provider user name.
    pub user_name: String,
    /// Name parts.
    pub name: ScimUserName,
    /// Display name.
    pub display_name: Option<String>,
    /// Emails.
    pub emails: Vec<ScimUserEmail>,
    /// Identity provider ID.
    pub external_id: Option<String>,
    /// Whether the identity is active.
    pub active: Option<bool>,
    /// Schemas.
    pub schemas: Vec<String>,
}

/// A page of SCIM provisioned identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScimProvisionedIdentities {
    /// Schemas.
    pub schemas: Vec<String>,
    /// Total across all pages.
    pub total_results: Option<u32>,
    /// Page size.
    pub items_per_page: Option<u32>,
    /// One-based index of the first result.
    pub start_index: Option<u32>,
    /// Identities on this page.
    #[serde(rename = "Resources")]
    pub resources: Vec<ScimUserAttributes>,
}

/// Holder of a Copilot seat.
///
/// Decoded from the `type` field of the assignee object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatAssignee {
    /// A user.
    User(User),
    /// A team.
    Team(Team),
    /// An organization.
    Organization(Organization),
}

impl SeatAssignee {
    /// Gets the user, if the seat is assigned to one.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }

    /// Gets the team, if the seat is assigned to one.
    pub fn team(&self) -> Option<&Team> {
        match self {
            Self::Team(team) => Some(team),
            _ => None,
        }
    }

    /// Gets the organization, if the seat is assigned to one.
    pub fn organization(&self) -> Option<&Organization> {
        match self {
            Self::Organization(org) => Some(org),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for SeatAssignee {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = match &value {
            Value::Object(map) => match map.get("type") {
                Some(kind) => kind.clone(),
                None => return Err(D::Error::custom("assignee type field is not set")),
            },
            other => {
                return Err(D::Error::custom(format!("unsupported assignee type {other}")));
            }
        };

        match kind.as_str() {
            Some("User") => serde_json::from_value(value).map(Self::User),
            Some("Team") => serde_json::from_value(value).map(Self::Team),
            Some("Organization") => serde_json::from_value(value).map(Self::Organization),
            _ => return Err(D::Error::custom(format!("unsupported assignee type {kind}"))),
        }
        .map_err(D::Error::custom)
    }
}

impl Serialize for SeatAssignee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (kind, value) = match self {
            Self::User(user) => ("User", serde_json::to_value(user)),
            Self::Team(team) => ("Team", serde_json::to_value(team)),
            Self::Organization(org) => ("Organization", serde_json::to_value(org)),
        };
        let mut value = value.map_err(S::Error::custom)?;
        if let Value::Object(map) = &mut value {
            map.entry("type").or_insert_with(|| Value::String(kind.to_string()));
        }
        value.serialize(serializer)
    }
}

/// A Copilot seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopilotSeatDetails {
    /// Seat holder. `None` when GitHub sends no assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<SeatAssignee>,
    /// Team the seat was granted through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigning_team: Option<Team>,
    /// Date the seat will be cancelled, if pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_cancellation_date: Option<String>,
    /// Last Copilot activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Editor of the last activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_editor: Option<String>,
    /// Seat creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last seat update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Copilot plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<String>,
}

/// A page of Copilot seats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListCopilotSeatsResponse {
    /// Total across all pages.
    pub total_seats: u32,
    /// Seats on this page.
    pub seats: Vec<CopilotSeatDetails>,
}
