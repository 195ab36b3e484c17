//! `relay invoke` command.
//!
//! Runs one tool as the root of a fresh chain and prints its outcome,
//! followed by the chain summary on stderr.

use std::time::Duration;

use clap::Args;
use serde_json::Value;

use relay_runtime::{InvokeOptions, ToolOrchestrator};
use relay_types::Outcome;

use crate::{input, output};

/// Invoke one tool in a fresh chain.
#[derive(Debug, Args)]
pub struct InvokeArgs {
    /// Tool name.
    pub tool: String,
    /// JSON input string.
    #[arg(short, long, default_value = "{}")]
    pub input: String,
    /// Read JSON input from a file (use "-" for stdin).
    #[arg(short = 'f', long)]
    pub input_file: Option<String>,
    /// Per-call timeout in milliseconds (defaults to `chain.timeout_ms`).
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Deduplicate identical nested calls.
    #[arg(long)]
    pub dedup: bool,
    /// JSON value returned as data if the call fails.
    #[arg(long)]
    pub fallback: Option<String>,
    /// Correlation ID for the chain (random when omitted).
    #[arg(long)]
    pub correlation_id: Option<String>,
    /// Print every execution log entry.
    #[arg(long)]
    pub log: bool,
}

/// Builds invocation options from the CLI flags.
pub fn invoke_options(
    timeout_ms: Option<u64>,
    dedup: bool,
    fallback: Option<&str>,
) -> anyhow::Result<InvokeOptions> {
    let mut options = InvokeOptions::new();
    if let Some(ms) = timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }
    if dedup {
        options = options.deduplicated();
    }
    if let Some(raw) = fallback {
        let data: Value = serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("invalid --fallback JSON: {e}"))?;
        options = options.with_recovery(move |err| {
            let data = data.clone();
            async move {
                tracing::warn!(error = %err, "using fallback value");
                Ok(Outcome::ok(data))
            }
        });
    }
    Ok(options)
}

/// Executes the invoke command.
pub async fn execute(args: &InvokeArgs, orchestrator: &ToolOrchestrator) -> anyhow::Result<()> {
    let resolved_input = input::resolve_input(&args.input, args.input_file.as_deref())?;
    let options = invoke_options(args.timeout_ms, args.dedup, args.fallback.as_deref())?;
    let chain = orchestrator.root_context(args.correlation_id.clone());

    tracing::info!(
        tool = %args.tool,
        correlation_id = chain.correlation_id(),
        "invoking tool"
    );

    let result = orchestrator
        .invoke(&args.tool, resolved_input, Some(&chain), options)
        .await;
    output::print_chain(&chain, args.log);

    match result {
        Ok(outcome) => {
            output::print_outcome(&outcome)?;
            if outcome.success {
                Ok(())
            } else {
                anyhow::bail!("tool '{}' reported failure", args.tool)
            }
        }
        Err(e) => {
            output::print_failure(&e);
            Err(anyhow::anyhow!("invocation failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_runtime::RuntimeError;

    #[test]
    fn flags_map_to_options() {
        let options = invoke_options(Some(250), true, None).expect("options");
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
        assert!(options.deduplicate);
        assert!(options.on_error.is_none());
    }

    #[test]
    fn bad_fallback_is_rejected() {
        assert!(invoke_options(None, false, Some("{oops")).is_err());
    }

    #[tokio::test]
    async fn fallback_recovers_business_failure() {
        let options = invoke_options(None, false, Some(r#"{"words": 0}"#)).expect("options");
        let recover = options.on_error.expect("recovery installed");
        let outcome = recover(RuntimeError::ToolNotFound { name: "x".into() })
            .await
            .expect("recovered");
        assert_eq!(outcome, Outcome::ok(serde_json::json!({"words": 0})));
    }
}
