//! Rate-limit categories, rate snapshots and the per-client ledger.

use crate::config::{
    HEADER_RATE_LIMIT, HEADER_RATE_REMAINING, HEADER_RATE_RESET, HEADER_RATE_RESOURCE,
    HEADER_RATE_USED,
};
use crate::observability::TracingHooks;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Server-side rate-limit bucket an endpoint draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitCategory {
    /// Everything not listed below.
    Core,
    /// `/search/*` except code search.
    Search,
    /// `/graphql`.
    Graphql,
    /// App manifest conversions.
    IntegrationManifest,
    /// Source imports.
    SourceImport,
    /// SARIF uploads.
    CodeScanningUpload,
    /// Runner registration. No endpoint maps here; reported by `GET rate_limit`.
    ActionsRunnerRegistration,
    /// `/scim/*`.
    Scim,
    /// Dependency snapshot submission.
    DependencySnapshots,
    /// `GET /search/code`.
    CodeSearch,
    /// Audit log reads.
    AuditLog,
}

impl RateLimitCategory {
    /// Number of categories.
    pub const COUNT: usize = 11;

    /// All categories in ledger order.
    pub const ALL: [RateLimitCategory; Self::COUNT] = [
        Self::Core,
        Self::Search,
        Self::Graphql,
        Self::IntegrationManifest,
        Self::SourceImport,
        Self::CodeScanningUpload,
        Self::ActionsRunnerRegistration,
        Self::Scim,
        Self::DependencySnapshots,
        Self::CodeSearch,
        Self::AuditLog,
    ];

    /// Classifies an endpoint by method and API path.
    ///
    /// Leading and trailing slashes are normalized, so `search/code`,
    /// `/search/code` and `/search/code/` classify alike.
    pub fn of(method: &Method, path: &str) -> Self {
        let path = format!("/{}", path.trim_matches('/'));
        let path = path.as_str();

        if path.starts_with("/search/code") && method == Method::GET {
            Self::CodeSearch
        } else if path.starts_with("/search/") {
            Self::Search
        } else if path == "/graphql" {
            Self::Graphql
        } else if path.starts_with("/app-manifests/")
            && path.ends_with("/conversions")
            && method == Method::POST
        {
            Self::IntegrationManifest
        } else if path.starts_with("/repos/") && path.ends_with("/import") && method == Method::PUT {
            Self::SourceImport
        } else if path.ends_with("/code-scanning/sarifs") {
            Self::CodeScanningUpload
        } else if path.starts_with("/scim/") {
            Self::Scim
        } else if path.starts_with("/repos/")
            && path.ends_with("/dependency-graph/snapshots")
            && method == Method::POST
        {
            Self::DependencySnapshots
        } else if path.ends_with("/audit-log") {
            Self::AuditLog
        } else {
            Self::Core
        }
    }

    /// Position in the ledger.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Key used by the `GET rate_limit` payload.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Search => "search",
            Self::Graphql => "graphql",
            Self::IntegrationManifest => "integration_manifest",
            Self::SourceImport => "source_import",
            Self::CodeScanningUpload => "code_scanning_upload",
            Self::ActionsRunnerRegistration => "actions_runner_registration",
            Self::Scim => "scim",
            Self::DependencySnapshots => "dependency_snapshots",
            Self::CodeSearch => "code_search",
            Self::AuditLog => "audit_log",
        }
    }
}

impl fmt::Display for RateLimitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate-limit snapshot for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// Requests allowed per window.
    #[serde(default)]
    pub limit: u32,
    /// Requests left in the current window.
    #[serde(default)]
    pub remaining: u32,
    /// Requests used in the current window.
    #[serde(default)]
    pub used: u32,
    /// When the window resets.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub reset: Option<DateTime<Utc>>,
    /// Resource name reported by GitHub.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource: String,
}

impl Rate {
    /// Reads the `X-RateLimit-*` headers. Missing or malformed values are
    /// zero; a reset of zero means no reset is known.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let number = |name: &str| text(name).and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(0);

        let reset = text(HEADER_RATE_RESET)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|epoch| *epoch != 0)
            .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single());

        Self {
            limit: number(HEADER_RATE_LIMIT),
            remaining: number(HEADER_RATE_REMAINING),
            used: number(HEADER_RATE_USED),
            reset,
            resource: text(HEADER_RATE_RESOURCE).unwrap_or_default().to_string(),
        }
    }

    /// Reports whether the window is exhausted and has not reset by `now`.
    pub fn is_exhausted_at(&self, now: DateTime<Utc>) -> bool {
        match self.reset {
            Some(reset) => self.remaining == 0 && now < reset,
            None => false,
        }
    }
}

/// Copy of a ledger's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Last observed rate per category, indexed by [`RateLimitCategory::index`].
    pub rates: [Rate; RateLimitCategory::COUNT],
    /// Until when a secondary limit is in force.
    pub secondary_reset: Option<DateTime<Utc>>,
}

impl RateLimitSnapshot {
    /// Gets the rate for a category.
    pub fn get(&self, category: RateLimitCategory) -> &Rate {
        &self.rates[category.index()]
    }
}

/// Per-client record of the last observed rate per category and the
/// secondary-limit deadline.
#[derive(Debug, Default)]
pub struct RateLimitLedger {
    state: Mutex<RateLimitSnapshot>,
}

impl RateLimitLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger holding a copy of `snapshot`.
    pub fn from_snapshot(snapshot: RateLimitSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RateLimitSnapshot) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Copies the ledger.
    pub fn snapshot(&self) -> RateLimitSnapshot {
        self.with_state(|state| state.clone())
    }

    /// Gets the last observed rate for a category.
    pub fn rate(&self, category: RateLimitCategory) -> Rate {
        self.with_state(|state| state.rates[category.index()].clone())
    }

    /// Records an observed rate.
    pub fn record(&self, category: RateLimitCategory, rate: Rate) {
        TracingHooks::on_rate_limit_update(category, &rate);
        self.with_state(|state| state.rates[category.index()] = rate);
    }

    /// Gets the secondary-limit deadline.
    pub fn secondary_reset(&self) -> Option<DateTime<Utc>> {
        self.with_state(|state| state.secondary_reset)
    }

    /// Records a secondary limit lasting `retry_after` from now.
    pub fn record_secondary(&self, retry_after: Duration) {
        let until = chrono::Duration::from_std(retry_after)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d));
        TracingHooks::on_secondary_rate_limit_recorded(retry_after);
        self.with_state(|state| state.secondary_reset = until);
    }

    /// Returns the category's rate when it is exhausted at `now`.
    pub fn exhausted(&self, category: RateLimitCategory, now: DateTime<Utc>) -> Option<Rate> {
        self.with_state(|state| {
            let rate = &state.rates[category.index()];
            rate.is_exhausted_at(now).then(|| rate.clone())
        })
    }

    /// Returns the secondary deadline when it is still in the future.
    pub fn secondary_in_force(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.with_state(|state| state.secondary_reset.filter(|until| now < *until))
    }
}

/// Formats time until (or since) a reset: `[rate reset in 87m02s]` or
/// `[rate limit was reset 5s ago]`.
pub fn format_rate_reset(d: chrono::Duration) -> String {
    let negative = d < chrono::Duration::zero();
    let millis = d.num_milliseconds().abs();
    let total_seconds = (millis + 500) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;

    let time = if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    };

    if negative {
        format!("[rate limit was reset {time} ago]")
    } else {
        format!("[rate reset in {time}]")
    }
}
