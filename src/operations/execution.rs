//! Deadline-bound manager invocation
//!
//! Attaches an [`ExecutionContext`] to a single manager call and releases it
//! on every exit path.

use std::time::Duration;

use crate::context::{ContextError, ExecutionContext};
use crate::error::ManagerError;
use crate::manager::OperatorManager;

use super::Operation;

/// Invoke `operation` on `manager`, giving up once `timeout` elapses
///
/// The manager future is raced against the context, so a manager that never
/// observes cancellation still cannot hang the command. A failure reported
/// after the deadline passed is surfaced as a deadline error.
pub async fn execute<M: OperatorManager>(
    manager: &mut M,
    operation: Operation,
    timeout: Duration,
) -> Result<(), ManagerError> {
    let (ctx, guard) = ExecutionContext::with_timeout(timeout);

    let result = {
        let work = async {
            match operation {
                Operation::Run => manager.run(&ctx).await,
                Operation::Cleanup => manager.cleanup(&ctx).await,
            }
        };

        tokio::select! {
            biased;
            result = work => result,
            () = ctx.done() => Err(ctx.err().unwrap_or(ContextError::Canceled).into()),
        }
    };

    let result = match result {
        Err(err) if ctx.err() == Some(ContextError::DeadlineExceeded) => {
            tracing::debug!(error = %err, "{} interrupted by timeout", operation);
            Err(ContextError::DeadlineExceeded.into())
        }
        other => other,
    };

    guard.cancel();
    result
}
