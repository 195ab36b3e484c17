//! `relay batch` command.

use clap::Args;
use serde_json::Value;

use relay_runtime::{BatchRequest, ToolOrchestrator};

use crate::{input, output};

/// Invoke several tools concurrently in one chain.
#[derive(Debug, Args)]
pub struct BatchArgs {
    /// JSON file holding an array of `{"tool": ..., "args": ...}` (use "-" for stdin).
    #[arg(short = 'f', long)]
    pub file: String,
    /// Correlation ID for the chain (random when omitted).
    #[arg(long)]
    pub correlation_id: Option<String>,
    /// Print every execution log entry.
    #[arg(long)]
    pub log: bool,
}

/// Parses batch members from a JSON array.
pub fn parse_requests(raw: Value) -> anyhow::Result<Vec<BatchRequest>> {
    if !raw.is_array() {
        anyhow::bail!("batch file must contain a JSON array");
    }
    serde_json::from_value(raw).map_err(|e| anyhow::anyhow!("invalid batch request: {e}"))
}

/// Executes the batch command.
///
/// Every member runs even if others fail; the command fails if any did.
pub async fn execute(args: &BatchArgs, orchestrator: &ToolOrchestrator) -> anyhow::Result<()> {
    let requests = parse_requests(input::resolve_input("[]", Some(args.file.as_str()))?)?;
    let chain = orchestrator.root_context(args.correlation_id.clone());
    let tools: Vec<String> = requests.iter().map(|r| r.tool.clone()).collect();

    tracing::info!(
        size = requests.len(),
        correlation_id = chain.correlation_id(),
        "running batch"
    );
    let results = orchestrator.batch_invoke(requests, Some(&chain)).await;

    let mut failures = 0usize;
    for (tool, result) in tools.iter().zip(&results) {
        println!("== {tool}");
        match result {
            Ok(outcome) => {
                if !outcome.success {
                    failures += 1;
                }
                output::print_outcome(outcome)?;
            }
            Err(e) => {
                failures += 1;
                output::print_failure(e);
            }
        }
    }
    output::print_chain(&chain, args.log);

    if failures > 0 {
        anyhow::bail!("{failures} of {} batch members failed", results.len());
    }
    output::print_success(&format!("{} calls completed", results.len()));
    Ok(())
}
