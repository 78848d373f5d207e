//! Tracing hooks and log redaction for the request lifecycle.

use crate::rate_limit::{Rate, RateLimitCategory};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tracing hooks emitted by the dispatcher.
pub struct TracingHooks;

impl TracingHooks {
    /// Logs the start of an API request.
    pub fn on_request_start(method: &str, url: &str, category: RateLimitCategory) {
        debug!(
            method = %method,
            url = %url,
            category = %category,
            "GitHub API request started"
        );
    }

    /// Logs the completion of an API request.
    pub fn on_request_complete(method: &str, url: &str, status: u16, duration: Duration) {
        info!(
            method = %method,
            url = %url,
            status = status,
            duration_ms = duration.as_millis() as u64,
            "GitHub API request completed"
        );
    }

    /// Logs a transport or classification failure.
    pub fn on_request_error(method: &str, url: &str, error: &str) {
        warn!(
            method = %method,
            url = %url,
            error = %error,
            "GitHub API request failed"
        );
    }

    /// Logs a ledger write.
    pub fn on_rate_limit_update(category: RateLimitCategory, rate: &Rate) {
        debug!(
            category = %category,
            limit = rate.limit,
            remaining = rate.remaining,
            used = rate.used,
            reset = ?rate.reset,
            resource = %rate.resource,
            "Rate limit updated"
        );
    }

    /// Logs a request refused before dispatch because the category is exhausted.
    pub fn on_rate_limit_exceeded(category: RateLimitCategory, rate: &Rate) {
        warn!(
            category = %category,
            limit = rate.limit,
            reset = ?rate.reset,
            "Primary rate limit still exceeded, not making remote request"
        );
    }

    /// Logs a request refused because a secondary limit is in force.
    pub fn on_secondary_rate_limit(until: DateTime<Utc>) {
        warn!(
            until = %until,
            "Secondary rate limit in force, not making remote request"
        );
    }

    /// Logs a recorded secondary limit.
    pub fn on_secondary_rate_limit_recorded(retry_after: Duration) {
        warn!(
            retry_after_secs = retry_after.as_secs(),
            "Secondary rate limit recorded"
        );
    }

    /// Logs a sleep until the primary limit resets.
    pub fn on_rate_limit_sleep(category: RateLimitCategory, wait: Duration) {
        info!(
            category = %category,
            wait_ms = wait.as_millis() as u64,
            "Sleeping until primary rate limit resets"
        );
    }

    /// Logs a followed redirect hop.
    pub fn on_redirect(status: u16, from: &str, to: &str) {
        debug!(
            status = status,
            from = %from,
            to = %to,
            "Following redirect"
        );
    }
}

/// Sensitive headers that should be redacted in logs.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-github-otp",
    "x-github-token",
    "cookie",
    "set-cookie",
];

/// Redacts sensitive values in headers.
pub fn redact_header(name: &str, value: &str) -> String {
    if SENSITIVE_HEADERS.contains(&name.to_lowercase().as_str()) {
        "[REDACTED]".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_header() {
        assert_eq!(redact_header("Authorization", "Bearer token"), "[REDACTED]");
        assert_eq!(redact_header("X-GitHub-OTP", "123456"), "[REDACTED]");
        assert_eq!(redact_header("Content-Type", "application/json"), "application/json");
    }
}
