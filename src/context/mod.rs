//! Per-request context: cancellation, deadline and dispatch flags.

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The caller cancelled.
    #[error("context canceled")]
    Canceled,
    /// The deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Carries cancellation, an optional deadline and the two rate-limit
/// flags the dispatcher honours.
///
/// Contexts are cheap to clone; clones observe the same cancellation.
/// Cancelling a context cancels every context derived from it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    bypass_rate_limit_check: bool,
    sleep_until_primary_rate_limit_reset: bool,
}

/// Cancels every context derived from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Cancels the context.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Context {
    /// A context that never ends and carries no flags.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a cancellable context.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let mut ctx = self.clone();
        ctx.token = self.token.child_token();
        let handle = CancelHandle {
            token: ctx.token.clone(),
        };
        (ctx, handle)
    }

    /// Derives a context that ends after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context that ends at `deadline`. An earlier existing
    /// deadline wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut ctx = self.clone();
        ctx.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        ctx
    }

    /// Skips the pre-flight rate-limit checks.
    pub fn bypass_rate_limit_check(mut self) -> Self {
        self.bypass_rate_limit_check = true;
        self
    }

    /// Sleeps until an exhausted primary limit resets instead of failing.
    pub fn sleep_until_primary_rate_limit_reset(mut self) -> Self {
        self.sleep_until_primary_rate_limit_reset = true;
        self
    }

    pub(crate) fn without_primary_rate_limit_sleep(mut self) -> Self {
        self.sleep_until_primary_rate_limit_reset = false;
        self
    }

    /// Reports whether pre-flight checks are skipped.
    pub fn bypasses_rate_limit_check(&self) -> bool {
        self.bypass_rate_limit_check
    }

    /// Reports whether exhausted primary limits are waited out.
    pub fn sleeps_until_primary_rate_limit_reset(&self) -> bool {
        self.sleep_until_primary_rate_limit_reset
    }

    /// Gets the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns why the context ended, or `None` while it is live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Completes when the context ends. Never completes for a background
    /// context.
    pub async fn done(&self) -> ContextError {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = self.token.cancelled() => ContextError::Canceled,
            _ = expired => ContextError::DeadlineExceeded,
        }
    }
}

/// Sleeps until `reset` plus a one second buffer, or until the context
/// ends. The timer is dropped either way.
pub async fn sleep_until_reset_with_buffer(
    ctx: &Context,
    reset: Option<DateTime<Utc>>,
) -> Result<(), ContextError> {
    let wait = wait_until_reset(reset);
    tokio::select! {
        err = ctx.done() => Err(err),
        _ = tokio::time::sleep(wait) => Ok(()),
    }
}

/// Time left until `reset` plus one second, never negative.
pub(crate) fn wait_until_reset(reset: Option<DateTime<Utc>>) -> Duration {
    let Some(reset) = reset else {
        return Duration::ZERO;
    };
    let remaining = reset - Utc::now() + chrono::Duration::seconds(1);
    remaining.to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert_eq!(ctx.err(), None);
        assert!(!ctx.bypasses_rate_limit_check());
        assert!(!ctx.sleeps_until_primary_rate_limit_reset());
    }

    #[tokio::test]
    async fn test_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        let clone = ctx.clone();
        handle.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
        assert_eq!(clone.done().await, ContextError::Canceled);
    }

    #[tokio::test]
    async fn test_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        assert_eq!(ctx.err(), None);
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancel_reaches_children_only() {
        let (parent, handle) = Context::background().with_cancel();
        let (child, child_handle) = parent.with_timeout(Duration::from_secs(60)).with_cancel();

        child_handle.cancel();
        assert_eq!(child.err(), Some(ContextError::Canceled));
        assert_eq!(parent.err(), None);

        let (sibling, _keep) = parent.with_cancel();
        handle.cancel();
        assert_eq!(sibling.done().await, ContextError::Canceled);
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let later = ctx.with_timeout(Duration::from_secs(60));
        assert_eq!(later.deadline(), ctx.deadline());
    }

    #[test]
    fn test_flags() {
        let ctx = Context::background()
            .bypass_rate_limit_check()
            .sleep_until_primary_rate_limit_reset();
        assert!(ctx.bypasses_rate_limit_check());
        assert!(ctx.sleeps_until_primary_rate_limit_reset());
        assert!(!ctx.without_primary_rate_limit_sleep().sleeps_until_primary_rate_limit_reset());
    }

    #[test]
    fn test_wait_until_reset() {
        assert_eq!(wait_until_reset(None), Duration::ZERO);
        let past = Utc::now() - chrono::Duration::seconds(30);
        assert_eq!(wait_until_reset(Some(past)), Duration::ZERO);
        let soon = Utc::now() + chrono::Duration::seconds(10);
        let wait = wait_until_reset(Some(soon));
        assert!(wait > Duration::from_secs(10) && wait <= Duration::from_secs(11));
    }

    #[tokio::test]
    async fn test_sleep_interrupted_by_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        let reset = Utc::now() + chrono::Duration::hours(1);
        handle.cancel();
        let result = sleep_until_reset_with_buffer(&ctx, Some(reset)).await;
        assert_eq!(result, Err(ContextError::Canceled));
    }
}
