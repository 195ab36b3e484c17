//! Concurrent fan-out of independent calls over one chain context.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use relay_types::Outcome;

use crate::context::ChainContext;
use crate::error::RuntimeError;
use crate::options::InvokeOptions;
use crate::orchestrator::ToolOrchestrator;

/// One member of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    pub tool: String,
    #[serde(default)]
    pub args: Value,
    #[serde(skip)]
    pub options: InvokeOptions,
}

impl BatchRequest {
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            args,
            options: InvokeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InvokeOptions) -> Self {
        self.options = options;
        self
    }
}

impl ToolOrchestrator {
    /// Runs every request concurrently against the same context.
    ///
    /// Members are isolated from each other's failures; results are
    /// index-aligned with `requests` regardless of completion order.
    #[tracing::instrument(
        name = "batch_invoke",
        skip_all,
        fields(size = requests.len(), correlation_id = context.map(ChainContext::correlation_id))
    )]
    pub async fn batch_invoke(
        &self,
        requests: Vec<BatchRequest>,
        context: Option<&ChainContext>,
    ) -> Vec<Result<Outcome, RuntimeError>> {
        let calls = requests.into_iter().map(|request| async move {
            self.invoke(&request.tool, request.args, context, request.options)
                .await
        });
        join_all(calls).await
    }
}
