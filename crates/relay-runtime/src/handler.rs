//! Handler contract and the context handed to running handlers.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use relay_registry::ToolRegistry;
use relay_types::{Outcome, ToolError, ToolName};

use crate::context::{ChainContext, SharedState};
use crate::error::RuntimeError;
use crate::options::InvokeOptions;
use crate::orchestrator::ToolOrchestrator;

/// A tool implementation.
///
/// Receives arguments that already passed the tool's input contract.
/// Returning `Ok(Outcome::failure(..))` reports a business failure as
/// data; returning `Err` reports a thrown failure that callers may recover.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, ctx: ToolContext) -> Result<Outcome, ToolError>;
}

/// Registry specialised to runtime handlers.
pub type Registry = ToolRegistry<dyn ToolHandler>;

/// Adapter turning an async closure into a [`ToolHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Outcome, ToolError>> + Send + 'static,
{
    async fn call(&self, args: Value, ctx: ToolContext) -> Result<Outcome, ToolError> {
        (self.0)(args, ctx).await
    }
}

/// Wraps an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, ToolError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// What a handler sees of the call it is serving.
#[derive(Clone)]
pub struct ToolContext {
    tool: ToolName,
    chain: Option<ChainContext>,
    orchestrator: ToolOrchestrator,
    cancellation: CancellationToken,
    escalated: Arc<OnceLock<RuntimeError>>,
}

impl ToolContext {
    pub(crate) fn new(
        tool: ToolName,
        chain: Option<ChainContext>,
        orchestrator: ToolOrchestrator,
    ) -> Self {
        Self {
            tool,
            chain,
            orchestrator,
            cancellation: CancellationToken::new(),
            escalated: Arc::new(OnceLock::new()),
        }
    }

    /// First fatal chain error seen by a nested call of this handler.
    pub(crate) fn escalated(&self) -> Option<RuntimeError> {
        self.escalated.get().cloned()
    }

    /// Name of the tool being served.
    pub fn tool(&self) -> &ToolName {
        &self.tool
    }

    /// Chain the call runs in (`None` for context-free calls).
    pub fn chain(&self) -> Option<&ChainContext> {
        self.chain.as_ref()
    }

    pub fn orchestrator(&self) -> &ToolOrchestrator {
        &self.orchestrator
    }

    /// Cancelled when the caller stops waiting (timeout).
    ///
    /// Handlers are not required to observe it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns true once the caller has abandoned this call.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Chain-wide shared store, if the call runs in a chain.
    pub fn shared_state(&self) -> Option<&SharedState> {
        self.chain.as_ref().map(ChainContext::shared_state)
    }

    /// Context for a nested call made by this tool.
    ///
    /// # Errors
    /// Returns `RuntimeError::RecursionDepth` if the chain is at its ceiling.
    pub fn child_context(&self) -> Result<Option<ChainContext>, RuntimeError> {
        self.chain
            .as_ref()
            .map(|chain| chain.child(&self.tool))
            .transpose()
    }

    /// Invokes another tool as a nested call of this one.
    ///
    /// Fatal chain errors are remembered so the engine can surface them
    /// even if this handler converts them into its own failure.
    ///
    /// # Errors
    /// Propagates the nested call's `RuntimeError`.
    pub async fn invoke(
        &self,
        target: &str,
        args: Value,
        options: InvokeOptions,
    ) -> Result<Outcome, RuntimeError> {
        let result = match self.child_context() {
            Ok(child) => {
                self.orchestrator
                    .invoke(target, args, child.as_ref(), options)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            if e.is_fatal() {
                let _ = self.escalated.set(e.clone());
            }
        }
        result
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("tool", &self.tool)
            .field("chain", &self.chain)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
