//! Per-call invocation options.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use relay_types::{Outcome, ToolError};

use crate::error::RuntimeError;

/// Recovery callback: turns a business failure into a replacement outcome.
pub type RecoveryFn =
    Arc<dyn Fn(RuntimeError) -> BoxFuture<'static, Result<Outcome, ToolError>> + Send + Sync>;

/// Options for a single `invoke` call.
#[derive(Clone, Default)]
pub struct InvokeOptions {
    /// Per-call timeout; falls back to the chain's (or configured) default.
    pub timeout: Option<Duration>,
    /// Collapse identical concurrent calls onto one execution.
    pub deduplicate: bool,
    /// Local recovery for non-fatal failures.
    pub on_error: Option<RecoveryFn>,
}

impl InvokeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables deduplication.
    pub fn deduplicated(mut self) -> Self {
        self.deduplicate = true;
        self
    }

    /// Installs a recovery handler.
    ///
    /// It is called with the failure; its `Ok` outcome replaces the
    /// result, its `Err` is surfaced as `RuntimeError::Recovery`. Fatal
    /// chain errors never reach it.
    pub fn with_recovery<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RuntimeError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Outcome, ToolError>> + Send + 'static,
    {
        self.on_error = Some(Arc::new(move |e| f(e).boxed()));
        self
    }
}

impl fmt::Debug for InvokeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokeOptions")
            .field("timeout", &self.timeout)
            .field("deduplicate", &self.deduplicate)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
