//! Mermaid diagram generation.

use async_trait::async_trait;
use relay_runtime::{ToolContext, ToolHandler};
use relay_types::{Outcome, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input for `mermaid_flow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepsArgs {
    pub steps: Vec<String>,
    /// Flow direction (`TD`, `LR`, ...).
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "TD".into()
}

const DIRECTIONS: &[&str] = &["TD", "TB", "BT", "LR", "RL"];

pub(crate) fn render_flow(steps: &[String], direction: &str) -> String {
    let mut out = format!("flowchart {direction}\n");
    for (i, step) in steps.iter().enumerate() {
        let label = step.replace('"', "#quot;");
        out.push_str(&format!("    s{i}[\"{label}\"]\n"));
    }
    for i in 1..steps.len() {
        out.push_str(&format!("    s{} --> s{i}\n", i - 1));
    }
    out
}

/// Renders an ordered list of steps as a linear flowchart.
pub struct MermaidFlow;

#[async_trait]
impl ToolHandler for MermaidFlow {
    async fn call(&self, args: Value, _ctx: ToolContext) -> Result<Outcome, ToolError> {
        let args: StepsArgs =
            serde_json::from_value(args).map_err(|e| ToolError::new(e.to_string()))?;
        if args.steps.is_empty() {
            return Ok(Outcome::failure("a flowchart needs at least one step"));
        }
        if !DIRECTIONS.contains(&args.direction.as_str()) {
            return Err(ToolError::new(format!(
                "unknown direction '{}'",
                args.direction
            )));
        }
        Ok(Outcome::ok(render_flow(&args.steps, &args.direction)))
    }
}
