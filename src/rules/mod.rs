//! Repository rulesets and the rule-array codec.
//!
//! On the wire a ruleset's rules are an array of `{type, parameters}`
//! objects. [`RepositoryRulesetRules`] holds one optional slot per rule
//! kind and converts to and from that array: slots are emitted in a fixed
//! order, `parameters` is left out when it equals its default, and
//! unknown rule types are skipped on decode.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Target of a ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesetTarget {
    /// Branches.
    Branch,
    /// Tags.
    Tag,
    /// Pushes.
    Push,
}

/// Owner kind of a ruleset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RulesetSourceType {
    /// Repository ruleset.
    #[default]
    Repository,
    /// Organization ruleset.
    Organization,
    /// Enterprise ruleset.
    Enterprise,
}

/// Enforcement level of a ruleset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesetEnforcement {
    /// Not enforced.
    #[default]
    Disabled,
    /// Enforced.
    Active,
    /// Evaluated but not enforced. Enterprise only.
    Evaluate,
}

/// Kind of actor allowed to bypass a ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BypassActorType {
    /// GitHub App.
    Integration,
    /// Organization administrators.
    OrganizationAdmin,
    /// Repository role.
    RepositoryRole,
    /// Team.
    Team,
    /// Deploy key.
    DeployKey,
}

/// When an actor may bypass a ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassMode {
    /// Always.
    Always,
    /// Only through pull requests.
    PullRequest,
    /// Never.
    Never,
}

/// Merge queue grouping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeGroupingStrategy {
    /// Every entry in the group must pass.
    #[serde(rename = "ALLGREEN")]
    AllGreen,
    /// Only the head entry must pass.
    #[serde(rename = "HEADGREEN")]
    HeadGreen,
}

/// Merge method used by a merge queue. Uppercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MergeQueueMergeMethod {
    /// Merge commit.
    Merge,
    /// Rebase.
    Rebase,
    /// Squash.
    Squash,
}

/// Merge method allowed by a pull request rule. Lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestMergeMethod {
    /// Merge commit.
    Merge,
    /// Rebase.
    Rebase,
    /// Squash.
    Squash,
}

/// Operator of a pattern rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternRuleOperator {
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// Substring match.
    Contains,
    /// Regular expression match.
    Regex,
}

/// Alert severity that blocks a merge for a code scanning tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeScanningAlertsThreshold {
    /// No alerts block.
    None,
    /// Errors block.
    Errors,
    /// Errors and warnings block.
    ErrorsAndWarnings,
    /// Every alert blocks.
    All,
}

/// Security alert severity that blocks a merge for a code scanning tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeScanningSecurityAlertsThreshold {
    /// No alerts block.
    None,
    /// Critical alerts block.
    Critical,
    /// High or critical alerts block.
    HighOrHigher,
    /// Medium or above block.
    MediumOrHigher,
    /// Every alert blocks.
    All,
}

/// Parameters of rule kinds that take none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyRuleParameters {}

/// Parameters of the `update` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateRuleParameters {
    /// Allow users with push access to fetch and merge from upstream.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub update_allows_fetch_and_merge: bool,
}

/// Parameters of the `merge_queue` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeQueueRuleParameters {
    /// Minutes a required check may take before it is considered failed.
    pub check_response_timeout_minutes: i32,
    /// Grouping strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping_strategy: Option<MergeGroupingStrategy>,
    /// Upper bound of queued merge groups built at once.
    pub max_entries_to_build: i32,
    /// Upper bound of pull requests merged together.
    pub max_entries_to_merge: i32,
    /// Merge method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<MergeQueueMergeMethod>,
    /// Lower bound of pull requests merged together.
    pub min_entries_to_merge: i32,
    /// Minutes to wait for the lower bound before merging anyway.
    pub min_entries_to_merge_wait_minutes: i32,
}

/// Parameters of the `required_deployments` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredDeploymentsRuleParameters {
    /// Environments that must deploy successfully first.
    pub required_deployment_environments: Vec<String>,
}

/// Parameters of the `pull_request` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestRuleParameters {
    /// Allowed merge methods.
    pub allowed_merge_methods: Vec<PullRequestMergeMethod>,
    /// Request a Copilot review automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_copilot_code_review_enabled: Option<bool>,
    /// Dismiss approvals when new commits are pushed.
    pub dismiss_stale_reviews_on_push: bool,
    /// Require a code owner review.
    pub require_code_owner_review: bool,
    /// Require approval of the most recent push by someone else.
    pub require_last_push_approval: bool,
    /// Number of approving reviews required.
    pub required_approving_review_count: i32,
    /// Require every review thread to be resolved.
    pub required_review_thread_resolution: bool,
}

/// One required status check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStatusCheck {
    /// Check context name.
    pub context: String,
    /// App that must report the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<i64>,
}

/// Parameters of the `required_status_checks` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredStatusChecksRuleParameters {
    /// Skip the checks when the ref is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub do_not_enforce_on_create: Option<bool>,
    /// Checks that must pass.
    pub required_status_checks: Vec<RuleStatusCheck>,
    /// Require the branch to be up to date before merging.
    pub strict_required_status_checks_policy: bool,
}

/// Parameters shared by the pattern rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternRuleParameters {
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Invert the match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negate: Option<bool>,
    /// Match operator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<PatternRuleOperator>,
    /// Pattern text.
    pub pattern: String,
}

/// Parameters of the `file_path_restriction` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePathRestrictionRuleParameters {
    /// Paths that may not be pushed.
    pub restricted_file_paths: Vec<String>,
}

/// Parameters of the `max_file_path_length` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxFilePathLengthRuleParameters {
    /// Longest allowed path.
    pub max_file_path_length: i32,
}

/// Parameters of the `file_extension_restriction` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExtensionRestrictionRuleParameters {
    /// Extensions that may not be pushed.
    pub restricted_file_extensions: Vec<String>,
}

/// Parameters of the `max_file_size` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxFileSizeRuleParameters {
    /// Largest allowed file, in MB.
    pub max_file_size: i64,
}

/// A workflow that must pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleWorkflow {
    /// Workflow file path.
    pub path: String,
    /// Ref the workflow is read from.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// Repository holding the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<i64>,
    /// Commit the workflow is read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Parameters of the `workflows` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowsRuleParameters {
    /// Skip the workflows when the ref is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub do_not_enforce_on_create: Option<bool>,
    /// Workflows that must pass.
    pub workflows: Vec<RuleWorkflow>,
}

/// A code scanning tool and its blocking thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCodeScanningTool {
    /// Alert threshold.
    pub alerts_threshold: CodeScanningAlertsThreshold,
    /// Security alert threshold.
    pub security_alerts_threshold: CodeScanningSecurityAlertsThreshold,
    /// Tool name.
    pub tool: String,
}

/// Parameters of the `code_scanning` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeScanningRuleParameters {
    /// Tools that must report.
    pub code_scanning_tools: Vec<RuleCodeScanningTool>,
}

/// Which ruleset a branch rule comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchRuleMetadata {
    /// Owner kind of the ruleset.
    pub ruleset_source_type: RulesetSourceType,
    /// Owner name of the ruleset.
    pub ruleset_source: String,
    /// Ruleset ID.
    pub ruleset_id: i64,
}

/// A rule that applies to a branch, with the ruleset it comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchRule<P> {
    /// Source ruleset.
    pub metadata: BranchRuleMetadata,
    /// Rule parameters.
    pub parameters: P,
}

#[derive(Serialize)]
struct RuleWire<'a, P> {
    #[serde(rename = "type")]
    rule_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a P>,
}

#[derive(Serialize)]
struct BranchRuleWire<'a, P> {
    #[serde(rename = "type")]
    rule_type: &'a str,
    #[serde(flatten)]
    metadata: &'a BranchRuleMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a P>,
}

#[derive(Deserialize)]
struct RawRule {
    #[serde(rename = "type")]
    rule_type: RepositoryRuleType,
    #[serde(default)]
    parameters: Option<Value>,
}

#[derive(Deserialize)]
struct RawBranchRule {
    #[serde(rename = "type")]
    rule_type: RepositoryRuleType,
    #[serde(flatten)]
    metadata: BranchRuleMetadata,
    #[serde(default)]
    parameters: Option<Value>,
}

fn non_default<P: Default + PartialEq>(params: &P) -> Option<&P> {
    (*params != P::default()).then_some(params)
}

fn decode_parameters<P, E>(raw: Option<Value>) -> Result<P, E>
where
    P: DeserializeOwned + Default,
    E: serde::de::Error,
{
    match raw {
        Some(value) if !value.is_null() => serde_json::from_value(value).map_err(E::custom),
        _ => Ok(P::default()),
    }
}

macro_rules! rule_kinds {
    ($( $slot:ident => $kind:ident ($params:ty) ),+ $(,)?) => {
        /// Rule kind, the `type` of a rule object.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum RepositoryRuleType {
            $(
                #[doc = concat!("`", stringify!($slot), "`")]
                $kind,
            )+
            /// A kind this crate does not know.
            Other(String),
        }

        impl RepositoryRuleType {
            /// Gets the wire name.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$kind => stringify!($slot), )+
                    Self::Other(name) => name.as_str(),
                }
            }
        }

        impl From<String> for RepositoryRuleType {
            fn from(name: String) -> Self {
                match name.as_str() {
                    $( stringify!($slot) => Self::$kind, )+
                    _ => Self::Other(name),
                }
            }
        }

        /// The rules of a ruleset, one optional slot per kind.
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct RepositoryRulesetRules {
            $(
                #[doc = concat!("The `", stringify!($slot), "` rule.")]
                pub $slot: Option<$params>,
            )+
        }

        impl RepositoryRulesetRules {
            /// Lists the kinds present, in wire order.
            pub fn rule_types(&self) -> Vec<RepositoryRuleType> {
                let mut kinds = Vec::new();
                $(
                    if self.$slot.is_some() {
                        kinds.push(RepositoryRuleType::$kind);
                    }
                )+
                kinds
            }
        }

        impl Serialize for RepositoryRulesetRules {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut seq = serializer.serialize_seq(None)?;
                $(
                    if let Some(params) = &self.$slot {
                        seq.serialize_element(&RuleWire {
                            rule_type: stringify!($slot),
                            parameters: non_default(params),
                        })?;
                    }
                )+
                seq.end()
            }
        }

        impl<'de> Deserialize<'de> for RepositoryRulesetRules {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let mut rules = Self::default();
                for raw in Vec::<RawRule>::deserialize(deserializer)? {
                    match raw.rule_type {
                        $(
                            RepositoryRuleType::$kind => {
                                rules.$slot = Some(decode_parameters::<_, D::Error>(raw.parameters)?);
                            }
                        )+
                        RepositoryRuleType::Other(_) => {}
                    }
                }
                Ok(rules)
            }
        }

        /// The rules that apply to a branch, grouped by kind.
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct BranchRules {
            $(
                #[doc = concat!("`", stringify!($slot), "` rules.")]
                pub $slot: Vec<BranchRule<$params>>,
            )+
        }

        impl Serialize for BranchRules {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut seq = serializer.serialize_seq(None)?;
                $(
                    for rule in &self.$slot {
                        seq.serialize_element(&BranchRuleWire {
                            rule_type: stringify!($slot),
                            metadata: &rule.metadata,
                            parameters: non_default(&rule.parameters),
                        })?;
                    }
                )+
                seq.end()
            }
        }

        impl<'de> Deserialize<'de> for BranchRules {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let mut rules = Self::default();
                for raw in Vec::<RawBranchRule>::deserialize(deserializer)? {
                    match raw.rule_type {
                        $(
                            RepositoryRuleType::$kind => rules.$slot.push(BranchRule {
                                metadata: raw.metadata,
                                parameters: decode_parameters::<_, D::Error>(raw.parameters)?,
                            }),
                        )+
                        RepositoryRuleType::Other(_) => {}
                    }
                }
                Ok(rules)
            }
        }
    };
}

rule_kinds! {
    creation => Creation(EmptyRuleParameters),
    update => Update(UpdateRuleParameters),
    deletion => Deletion(EmptyRuleParameters),
    required_linear_history => RequiredLinearHistory(EmptyRuleParameters),
    merge_queue => MergeQueue(MergeQueueRuleParameters),
    required_deployments => RequiredDeployments(RequiredDeploymentsRuleParameters),
    required_signatures => RequiredSignatures(EmptyRuleParameters),
    pull_request => PullRequest(PullRequestRuleParameters),
    required_status_checks => RequiredStatusChecks(RequiredStatusChecksRuleParameters),
    non_fast_forward => NonFastForward(EmptyRuleParameters),
    commit_message_pattern => CommitMessagePattern(PatternRuleParameters),
    commit_author_email_pattern => CommitAuthorEmailPattern(PatternRuleParameters),
    committer_email_pattern => CommitterEmailPattern(PatternRuleParameters),
    branch_name_pattern => BranchNamePattern(PatternRuleParameters),
    tag_name_pattern => TagNamePattern(PatternRuleParameters),
    file_path_restriction => FilePathRestriction(FilePathRestrictionRuleParameters),
    max_file_path_length => MaxFilePathLength(MaxFilePathLengthRuleParameters),
    file_extension_restriction => FileExtensionRestriction(FileExtensionRestrictionRuleParameters),
    max_file_size => MaxFileSize(MaxFileSizeRuleParameters),
    workflows => Workflows(WorkflowsRuleParameters),
    code_scanning => CodeScanning(CodeScanningRuleParameters),
}

impl From<RepositoryRuleType> for String {
    fn from(kind: RepositoryRuleType) -> Self {
        match kind {
            RepositoryRuleType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RepositoryRuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a single [`RepositoryRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleParameters {
    /// `update` parameters.
    Update(UpdateRuleParameters),
    /// `merge_queue` parameters.
    MergeQueue(MergeQueueRuleParameters),
    /// `required_deployments` parameters.
    RequiredDeployments(RequiredDeploymentsRuleParameters),
    /// `pull_request` parameters.
    PullRequest(PullRequestRuleParameters),
    /// `required_status_checks` parameters.
    RequiredStatusChecks(RequiredStatusChecksRuleParameters),
    /// Parameters of any pattern rule.
    Pattern(PatternRuleParameters),
    /// `file_path_restriction` parameters.
    FilePathRestriction(FilePathRestrictionRuleParameters),
    /// `max_file_path_length` parameters.
    MaxFilePathLength(MaxFilePathLengthRuleParameters),
    /// `file_extension_restriction` parameters.
    FileExtensionRestriction(FileExtensionRestrictionRuleParameters),
    /// `max_file_size` parameters.
    MaxFileSize(MaxFileSizeRuleParameters),
    /// `workflows` parameters.
    Workflows(WorkflowsRuleParameters),
    /// `code_scanning` parameters.
    CodeScanning(CodeScanningRuleParameters),
}

/// A single rule object, as used when creating or listing rules one at a
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRule {
    /// Rule kind.
    #[serde(rename = "type")]
    pub rule_type: RepositoryRuleType,
    /// Parameters; `None` for kinds that take none and for unknown kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<RuleParameters>,
}

impl RepositoryRule {
    /// Creates a rule.
    pub fn new(rule_type: RepositoryRuleType, parameters: Option<RuleParameters>) -> Self {
        Self {
            rule_type,
            parameters,
        }
    }
}

impl<'de> Deserialize<'de> for RepositoryRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use RepositoryRuleType as K;

        let raw = RawRule::deserialize(deserializer)?;
        let p = raw.parameters;
        let parameters = match &raw.rule_type {
            K::Creation | K::Deletion | K::RequiredLinearHistory | K::RequiredSignatures | K::NonFastForward => None,
            K::Update => Some(RuleParameters::Update(decode_parameters::<_, D::Error>(p)?)),
            K::MergeQueue => Some(RuleParameters::MergeQueue(decode_parameters::<_, D::Error>(p)?)),
            K::RequiredDeployments => Some(RuleParameters::RequiredDeployments(decode_parameters::<_, D::Error>(p)?)),
            K::PullRequest => Some(RuleParameters::PullRequest(decode_parameters::<_, D::Error>(p)?)),
            K::RequiredStatusChecks => Some(RuleParameters::RequiredStatusChecks(decode_parameters::<_, D::Error>(p)?)),
            K::CommitMessagePattern
            | K::CommitAuthorEmailPattern
            | K::CommitterEmailPattern
            | K::BranchNamePattern
            | K::TagNamePattern => Some(RuleParameters::Pattern(decode_parameters::<_, D::Error>(p)?)),
            K::FilePathRestriction => Some(RuleParameters::FilePathRestriction(decode_parameters::<_, D::Error>(p)?)),
            K::MaxFilePathLength => Some(RuleParameters::MaxFilePathLength(decode_parameters::<_, D::Error>(p)?)),
            K::FileExtensionRestriction => Some(RuleParameters::FileExtensionRestriction(decode_parameters::<_, D::Error>(p)?)),
            K::MaxFileSize => Some(RuleParameters::MaxFileSize(decode_parameters::<_, D::Error>(p)?)),
            K::Workflows => Some(RuleParameters::Workflows(decode_parameters::<_, D::Error>(p)?)),
            K::CodeScanning => Some(RuleParameters::CodeScanning(decode_parameters::<_, D::Error>(p)?)),
            K::Other(name) => {
                tracing::debug!(rule_type = %name, "Unknown rule type, parameters dropped");
                None
            }
        };

        Ok(Self {
            rule_type: raw.rule_type,
            parameters,
        })
    }
}

/// An actor allowed to bypass a ruleset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassActor {
    /// Actor ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<i64>,
    /// Actor kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<BypassActorType>,
    /// Bypass mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_mode: Option<BypassMode>,
}

/// A link of a ruleset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRulesetLink {
    /// Target URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Links of a ruleset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRulesetLinks {
    /// API link.
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<RepositoryRulesetLink>,
    /// Web link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<RepositoryRulesetLink>,
}

/// Include and exclude lists of names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeExcludeCondition {
    /// Names or patterns to include.
    pub include: Vec<String>,
    /// Names or patterns to exclude.
    pub exclude: Vec<String>,
}

/// Repository name condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryNameCondition {
    /// Names or patterns to include.
    pub include: Vec<String>,
    /// Names or patterns to exclude.
    pub exclude: Vec<String>,
    /// Prevent renaming a targeted repository out of the condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
}

/// Repository ID condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryIdCondition {
    /// Targeted repositories.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repository_ids: Vec<i64>,
}

/// A custom property value match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPropertyTarget {
    /// Property name.
    pub name: String,
    /// Accepted values.
    #[serde(default)]
    pub property_values: Vec<String>,
    /// Property source, `custom` or `system`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Repository custom property condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryPropertyCondition {
    /// Properties to include.
    pub include: Vec<RepositoryPropertyTarget>,
    /// Properties to exclude.
    pub exclude: Vec<RepositoryPropertyTarget>,
}

/// Organization ID condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationIdCondition {
    /// Targeted organizations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organization_ids: Vec<i64>,
}

/// Conditions that select what a ruleset applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryRulesetConditions {
    /// Ref name condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<IncludeExcludeCondition>,
    /// Repository ID condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<RepositoryIdCondition>,
    /// Repository name condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<RepositoryNameCondition>,
    /// Repository custom property condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_property: Option<RepositoryPropertyCondition>,
    /// Organization ID condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationIdCondition>,
    /// Organization name condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<IncludeExcludeCondition>,
}

/// A repository, organization or enterprise ruleset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRuleset {
    /// Ruleset ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Name.
    pub name: String,
    /// What the ruleset targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<RulesetTarget>,
    /// Owner kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<RulesetSourceType>,
    /// Owner name.
    #[serde(default)]
    pub source: String,
    /// Enforcement level.
    #[serde(default)]
    pub enforcement: RulesetEnforcement,
    /// Actors allowed to bypass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bypass_actors: Vec<BypassActor>,
    /// Whether the caller may bypass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_can_bypass: Option<BypassMode>,
    /// GraphQL node ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Links.
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<RepositoryRulesetLinks>,
    /// Conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RepositoryRulesetConditions>,
    /// Rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RepositoryRulesetRules>,
    /// Last update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RepositoryRuleset {
    /// Creates a ruleset with the given name and enforcement.
    pub fn new(name: impl Into<String>, enforcement: RulesetEnforcement) -> Self {
        Self {
            name: name.into(),
            enforcement,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn creation_and_pull_request() -> RepositoryRulesetRules {
        RepositoryRulesetRules {
            creation: Some(EmptyRuleParameters {}),
            pull_request: Some(PullRequestRuleParameters {
                required_approving_review_count: 2,
                dismiss_stale_reviews_on_push: true,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_rules_round_trip() {
        let rules = creation_and_pull_request();
        let encoded = serde_json::to_value(&rules).unwrap();

        assert_eq!(
            encoded,
            json!([
                {"type": "creation"},
                {"type": "pull_request", "parameters": {
                    "allowed_merge_methods": [],
                    "dismiss_stale_reviews_on_push": true,
                    "require_code_owner_review": false,
                    "require_last_push_approval": false,
                    "required_approving_review_count": 2,
                    "required_review_thread_resolution": false
                }}
            ])
        );

        let decoded: RepositoryRulesetRules = serde_json::from_value(encoded).unwrap();
        assert_eq!(
            decoded.rule_types(),
            vec![RepositoryRuleType::Creation, RepositoryRuleType::PullRequest]
        );
        assert_eq!(decoded, rules);
    }

    #[test]
    fn test_default_parameters_are_omitted() {
        let rules = RepositoryRulesetRules {
            update: Some(UpdateRuleParameters::default()),
            merge_queue: Some(MergeQueueRuleParameters::default()),
            max_file_size: Some(MaxFileSizeRuleParameters::default()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&rules).unwrap(),
            json!([{"type": "update"}, {"type": "merge_queue"}, {"type": "max_file_size"}])
        );
    }

    #[test]
    fn test_slots_encode_in_declared_order() {
        let rules = RepositoryRulesetRules {
            code_scanning: Some(CodeScanningRuleParameters::default()),
            non_fast_forward: Some(EmptyRuleParameters {}),
            creation: Some(EmptyRuleParameters {}),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&rules).unwrap();
        let kinds: Vec<&str> = encoded
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["creation", "non_fast_forward", "code_scanning"]);
    }

    #[test]
    fn test_decode_skips_unknown_and_defaults_missing_parameters() {
        let rules: RepositoryRulesetRules = serde_json::from_value(json!([
            {"type": "secret_scanning", "parameters": {"x": 1}},
            {"type": "update"},
            {"type": "required_deployments", "parameters": null},
            {"type": "max_file_path_length", "parameters": {"max_file_path_length": 255}}
        ]))
        .unwrap();

        assert_eq!(
            rules.rule_types(),
            vec![
                RepositoryRuleType::Update,
                RepositoryRuleType::RequiredDeployments,
                RepositoryRuleType::MaxFilePathLength
            ]
        );
        assert_eq!(rules.update, Some(UpdateRuleParameters::default()));
        assert_eq!(
            rules.max_file_path_length,
            Some(MaxFilePathLengthRuleParameters { max_file_path_length: 255 })
        );
    }

    #[test]
    fn test_merge_methods_keep_their_case() {
        let rules: RepositoryRulesetRules = serde_json::from_value(json!([
            {"type": "merge_queue", "parameters": {"merge_method": "SQUASH", "grouping_strategy": "ALLGREEN"}},
            {"type": "pull_request", "parameters": {"allowed_merge_methods": ["squash", "rebase"]}}
        ]))
        .unwrap();
        let queue = rules.merge_queue.unwrap();
        assert_eq!(queue.merge_method, Some(MergeQueueMergeMethod::Squash));
        assert_eq!(queue.grouping_strategy, Some(MergeGroupingStrategy::AllGreen));
        assert_eq!(
            rules.pull_request.unwrap().allowed_merge_methods,
            vec![PullRequestMergeMethod::Squash, PullRequestMergeMethod::Rebase]
        );

        let wrong_case = serde_json::from_value::<RepositoryRulesetRules>(json!([
            {"type": "merge_queue", "parameters": {"merge_method": "squash"}}
        ]));
        assert!(wrong_case.is_err());
    }

    #[test]
    fn test_pattern_rule() {
        let rules: RepositoryRulesetRules = serde_json::from_value(json!([
            {"type": "branch_name_pattern", "parameters": {"operator": "starts_with", "pattern": "release/", "negate": true}}
        ]))
        .unwrap();
        let pattern = rules.branch_name_pattern.unwrap();
        assert_eq!(pattern.operator, Some(PatternRuleOperator::StartsWith));
        assert_eq!(pattern.pattern, "release/");
        assert_eq!(pattern.negate, Some(true));
        assert_eq!(pattern.name, None);
    }

    #[test]
    fn test_branch_rules_carry_metadata() {
        let payload = json!([
            {"type": "creation", "ruleset_source_type": "Organization", "ruleset_source": "octo-org", "ruleset_id": 42},
            {"type": "required_status_checks", "ruleset_source_type": "Repository", "ruleset_source": "octo-org/r", "ruleset_id": 7,
             "parameters": {"required_status_checks": [{"context": "ci", "integration_id": 1}], "strict_required_status_checks_policy": true}},
            {"type": "creation", "ruleset_source_type": "Repository", "ruleset_source": "octo-org/r", "ruleset_id": 7},
            {"type": "something_new", "ruleset_source_type": "Repository", "ruleset_source": "octo-org/r", "ruleset_id": 7}
        ]);
        let rules: BranchRules = serde_json::from_value(payload).unwrap();

        assert_eq!(rules.creation.len(), 2);
        assert_eq!(rules.creation[0].metadata.ruleset_source_type, RulesetSourceType::Organization);
        assert_eq!(rules.creation[0].metadata.ruleset_id, 42);
        let checks = &rules.required_status_checks[0];
        assert_eq!(checks.metadata.ruleset_source, "octo-org/r");
        assert_eq!(
            checks.parameters.required_status_checks,
            vec![RuleStatusCheck {
                context: "ci".into(),
                integration_id: Some(1)
            }]
        );

        let encoded = serde_json::to_value(&rules).unwrap();
        assert_eq!(
            encoded[0],
            json!({"type": "creation", "ruleset_source_type": "Organization", "ruleset_source": "octo-org", "ruleset_id": 42})
        );
        assert_eq!(encoded.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_single_rule() {
        let rule: RepositoryRule = serde_json::from_value(json!({
            "type": "commit_message_pattern",
            "parameters": {"operator": "regex", "pattern": "^JIRA-"}
        }))
        .unwrap();
        assert_eq!(rule.rule_type, RepositoryRuleType::CommitMessagePattern);
        assert!(matches!(
            rule.parameters,
            Some(RuleParameters::Pattern(PatternRuleParameters { operator: Some(PatternRuleOperator::Regex), .. }))
        ));

        let rule: RepositoryRule = serde_json::from_value(json!({"type": "deletion", "parameters": {}})).unwrap();
        assert_eq!(rule, RepositoryRule::new(RepositoryRuleType::Deletion, None));
        assert_eq!(serde_json::to_value(&rule).unwrap(), json!({"type": "deletion"}));

        let rule: RepositoryRule = serde_json::from_value(json!({"type": "future_rule"})).unwrap();
        assert_eq!(rule.rule_type, RepositoryRuleType::Other("future_rule".into()));
        assert_eq!(rule.rule_type.to_string(), "future_rule");
        assert_eq!(serde_json::to_value(&rule).unwrap(), json!({"type": "future_rule"}));
    }

    #[test]
    fn test_ruleset_decode() {
        let ruleset: RepositoryRuleset = serde_json::from_value(json!({
            "id": 21,
            "name": "protect main",
            "target": "branch",
            "source_type": "Repository",
            "source": "o/r",
            "enforcement": "active",
            "bypass_actors": [{"actor_id": 5, "actor_type": "Team", "bypass_mode": "pull_request"}],
            "current_user_can_bypass": "never",
            "_links": {"self": {"href": "https://api.github.com/repos/o/r/rulesets/21"}},
            "conditions": {"ref_name": {"include": ["~DEFAULT_BRANCH"], "exclude": []}},
            "rules": [{"type": "deletion"}, {"type": "non_fast_forward"}],
            "created_at": "2024-01-02T03:04:05Z"
        }))
        .unwrap();

        assert_eq!(ruleset.id, Some(21));
        assert_eq!(ruleset.target, Some(RulesetTarget::Branch));
        assert_eq!(ruleset.enforcement, RulesetEnforcement::Active);
        assert_eq!(ruleset.bypass_actors[0].actor_type, Some(BypassActorType::Team));
        assert_eq!(ruleset.bypass_actors[0].bypass_mode, Some(BypassMode::PullRequest));
        assert_eq!(ruleset.current_user_can_bypass, Some(BypassMode::Never));
        assert_eq!(
            ruleset.links.and_then(|l| l.self_link).and_then(|l| l.href).as_deref(),
            Some("https://api.github.com/repos/o/r/rulesets/21")
        );
        assert_eq!(
            ruleset.conditions.and_then(|c| c.ref_name).map(|r| r.include),
            Some(vec!["~DEFAULT_BRANCH".to_string()])
        );
        let rules = ruleset.rules.unwrap();
        assert!(rules.deletion.is_some() && rules.non_fast_forward.is_some());
        assert_eq!(ruleset.created_at.map(|t| t.timestamp()), Some(1_704_164_645));
    }

    #[test]
    fn test_new_ruleset_encoding() {
        let mut ruleset = RepositoryRuleset::new("r", RulesetEnforcement::Evaluate);
        ruleset.rules = Some(creation_and_pull_request());
        let encoded = serde_json::to_value(&ruleset).unwrap();
        assert_eq!(encoded["name"], "r");
        assert_eq!(encoded["enforcement"], "evaluate");
        assert_eq!(encoded["source"], "");
        assert!(encoded.get("id").is_none());
        assert_eq!(encoded["rules"][0], json!({"type": "creation"}));
    }
}
