//! Deadline-bounded handler execution.
//!
//! The handler runs as its own task. If the deadline passes first the
//! caller stops waiting, the cancellation token fires, and the task is
//! left to finish (or not) in the background.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinError;
use tracing::warn;

use relay_types::{Outcome, ToolError};

use crate::handler::{ToolContext, ToolHandler};

/// How a handler run settled from the caller's point of view.
#[derive(Debug)]
pub enum Settled {
    /// The handler returned within the deadline.
    Completed(Result<Outcome, ToolError>),
    /// The deadline passed; the handler may still be running.
    TimedOut,
    /// The handler task panicked or was aborted.
    Crashed(String),
}

/// Runs `handler` with `args`, waiting at most `timeout`.
pub async fn run_with_deadline(
    handler: Arc<dyn ToolHandler>,
    args: Value,
    ctx: ToolContext,
    timeout: Duration,
) -> Settled {
    let token = ctx.cancellation().clone();
    let tool = ctx.tool().to_string();
    let task = tokio::spawn(async move { handler.call(args, ctx).await });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => Settled::Completed(result),
        Ok(Err(join_err)) => Settled::Crashed(describe_join_error(join_err)),
        Err(_elapsed) => {
            token.cancel();
            warn!(
                %tool,
                timeout_ms = timeout.as_millis() as u64,
                "handler timed out, detaching"
            );
            Settled::TimedOut
        }
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_cancelled() {
        return "handler task was cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => {
            if let Some(s) = payload.downcast_ref::<&str>() {
                format!("handler panicked: {s}")
            } else if let Some(s) = payload.downcast_ref::<String>() {
                format!("handler panicked: {s}")
            } else {
                "handler panicked".to_string()
            }
        }
        Err(err) => err.to_string(),
    }
}
