//! Sequential tool chains: each step's output feeds the next step's input.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use relay_types::Outcome;

use crate::context::ChainContext;
use crate::error::RuntimeError;
use crate::options::InvokeOptions;
use crate::orchestrator::ToolOrchestrator;

/// A single step in a sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceStep {
    /// Tool to invoke.
    pub tool: String,
    /// Explicit arguments; when absent the previous step's data is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    /// Per-step invocation options.
    #[serde(skip)]
    pub options: InvokeOptions,
}

impl SequenceStep {
    /// A step that takes its input from the previous step.
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            ..Self::default()
        }
    }

    /// A step with explicit arguments.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_options(mut self, options: InvokeOptions) -> Self {
        self.options = options;
        self
    }
}

/// Resolves the input for a step: explicit args, else the previous data
/// (or the initial input for the first step), else an empty object.
pub fn resolve_step_input(step: &SequenceStep, previous: Option<&Value>) -> Value {
    step.args
        .clone()
        .or_else(|| previous.cloned())
        .unwrap_or_else(|| Value::Object(Default::default()))
}

impl ToolOrchestrator {
    /// Runs `steps` one at a time, threading each step's data into the next.
    ///
    /// Halts at the first failing step and returns its failure as the
    /// overall outcome; later steps never run and leave no log entries.
    /// An empty sequence succeeds with the initial input as its data.
    ///
    /// # Errors
    /// Only fatal chain errors are returned as `Err`; other failures become
    /// a failed `Outcome`.
    #[tracing::instrument(
        name = "invoke_sequence",
        skip_all,
        fields(steps = steps.len(), correlation_id = context.map(ChainContext::correlation_id))
    )]
    pub async fn invoke_sequence(
        &self,
        steps: Vec<SequenceStep>,
        context: Option<&ChainContext>,
        initial_input: Option<Value>,
    ) -> Result<Outcome, RuntimeError> {
        let mut last = Outcome {
            success: true,
            data: initial_input,
            error: None,
        };

        for (index, step) in steps.into_iter().enumerate() {
            let input = resolve_step_input(&step, last.data.as_ref());
            debug!(index, tool = %step.tool, "running sequence step");
            match self.invoke(&step.tool, input, context, step.options).await {
                Ok(outcome) if outcome.success => last = outcome,
                Ok(outcome) => {
                    warn!(index, tool = %step.tool, "sequence halted on failed outcome");
                    return Ok(outcome);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(index, tool = %step.tool, error = %e, "sequence halted on error");
                    return Ok(Outcome::failure(e.to_string()));
                }
            }
        }
        Ok(last)
    }
}
