//! `relay sequence` command.

use clap::Args;
use serde_json::Value;

use relay_runtime::{SequenceStep, ToolOrchestrator};

use crate::{input, output};

/// Invoke tools one after another, threading outputs.
#[derive(Debug, Args)]
pub struct SequenceArgs {
    /// JSON file holding an array of `{"tool": ..., "args"?: ...}` (use "-" for stdin).
    #[arg(short = 'f', long)]
    pub file: String,
    /// JSON input for the first step when it has no explicit args.
    #[arg(long)]
    pub initial: Option<String>,
    /// Correlation ID for the chain (random when omitted).
    #[arg(long)]
    pub correlation_id: Option<String>,
    /// Print every execution log entry.
    #[arg(long)]
    pub log: bool,
}

/// Parses sequence steps from a JSON array.
pub fn parse_steps(raw: Value) -> anyhow::Result<Vec<SequenceStep>> {
    if !raw.is_array() {
        anyhow::bail!("sequence file must contain a JSON array");
    }
    serde_json::from_value(raw).map_err(|e| anyhow::anyhow!("invalid sequence step: {e}"))
}

/// Executes the sequence command.
pub async fn execute(args: &SequenceArgs, orchestrator: &ToolOrchestrator) -> anyhow::Result<()> {
    let steps = parse_steps(input::resolve_input("[]", Some(args.file.as_str()))?)?;
    let initial = args
        .initial
        .as_deref()
        .map(|raw| input::resolve_input(raw, None))
        .transpose()?;
    let chain = orchestrator.root_context(args.correlation_id.clone());

    tracing::info!(
        steps = steps.len(),
        correlation_id = chain.correlation_id(),
        "running sequence"
    );
    let result = orchestrator
        .invoke_sequence(steps, Some(&chain), initial)
        .await;
    output::print_chain(&chain, args.log);

    match result {
        Ok(outcome) if outcome.success => output::print_outcome(&outcome),
        Ok(outcome) => {
            output::print_outcome(&outcome)?;
            anyhow::bail!("sequence halted")
        }
        Err(e) => {
            output::print_failure(&e);
            Err(anyhow::anyhow!("sequence aborted: {e}"))
        }
    }
}
