//! Deadline-bound cancellation context
//!
//! [`ExecutionContext::with_timeout`] returns a context that is cancelled when
//! the timeout elapses, together with a [`CancelGuard`] that cancels it when
//! dropped. Holding the guard for the duration of an operation guarantees the
//! timer is released on every exit path.
//!
//! Cancellation is cooperative: collaborators observe it through
//! [`ExecutionContext::done`] or [`ExecutionContext::err`].

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context finished
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Longest timeout a context honours; larger values are capped to it
pub const MAX_TIMEOUT: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    token: CancellationToken,
    deadline: Instant,
    reason: Arc<OnceLock<ContextError>>,
}

impl ExecutionContext {
    /// Create a context cancelled after `timeout`
    ///
    /// Must be called from within a tokio runtime; the deadline timer runs as
    /// a task that the returned guard aborts.
    pub fn with_timeout(timeout: Duration) -> (Self, CancelGuard) {
        let deadline = Instant::now() + timeout.min(MAX_TIMEOUT);
        let ctx = Self {
            token: CancellationToken::new(),
            deadline,
            reason: Arc::new(OnceLock::new()),
        };

        let timer_ctx = ctx.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep_until(timer_ctx.deadline) => {
                    timer_ctx.finish(ContextError::DeadlineExceeded);
                }
                () = timer_ctx.token.cancelled() => {}
            }
        });

        let guard = CancelGuard {
            ctx: ctx.clone(),
            timer: Some(timer),
        };
        (ctx, guard)
    }

    fn finish(&self, reason: ContextError) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn done(&self) {
        self.token.cancelled().await;
    }

    /// `None` while the context is live, otherwise the reason it finished
    pub fn err(&self) -> Option<ContextError> {
        if !self.token.is_cancelled() {
            return None;
        }
        Some(
            self.reason
                .get()
                .copied()
                .unwrap_or(ContextError::Canceled),
        )
    }

    /// Time left before the deadline, zero once it has passed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Cancels its context and stops the deadline timer when dropped
#[derive(Debug)]
pub struct CancelGuard {
    ctx: ExecutionContext,
    timer: Option<JoinHandle<()>>,
}

impl CancelGuard {
    /// Cancel now instead of waiting for drop
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.ctx.finish(ContextError::Canceled);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_live_context_has_no_error() {
        let (ctx, _guard) = ExecutionContext::with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.err(), None);
        assert!(ctx.remaining() > Duration::from_secs(59));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_context() {
        let (ctx, _guard) = ExecutionContext::with_timeout(Duration::from_millis(50));
        ctx.done().await;
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_guard_drop_cancels() {
        let (ctx, guard) = ExecutionContext::with_timeout(Duration::from_secs(60));
        drop(guard);
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
        tokio::time::timeout(Duration::from_secs(1), ctx.done())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_explicit_cancel() {
        let (ctx, guard) = ExecutionContext::with_timeout(Duration::from_secs(60));
        let observer = ctx.clone();
        guard.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
        assert_eq!(observer.err(), Some(ContextError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_timeout_is_capped() {
        let huge = humantime::parse_duration("500000000000y").unwrap();
        let (ctx, _guard) = ExecutionContext::with_timeout(huge);
        assert_eq!(ctx.err(), None);
        assert!(ctx.remaining() <= MAX_TIMEOUT);
        assert!(ctx.remaining() > MAX_TIMEOUT - Duration::from_secs(1));

        let (ctx, _guard) = ExecutionContext::with_timeout(Duration::MAX);
        assert_eq!(ctx.err(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_deadline_keeps_deadline_reason() {
        let (ctx, guard) = ExecutionContext::with_timeout(Duration::from_millis(10));
        ctx.done().await;
        drop(guard);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[test]
    fn test_context_error_display() {
        assert_eq!(ContextError::Canceled.to_string(), "context canceled");
        assert_eq!(
            ContextError::DeadlineExceeded.to_string(),
            "context deadline exceeded"
        );
    }
}
