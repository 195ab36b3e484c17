//! Text statistics and the composite prompt-brief builder.

use async_trait::async_trait;
use relay_runtime::{InvokeOptions, ToolContext, ToolHandler};
use relay_types::{Outcome, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Input for `word_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextArgs {
    pub text: String,
}

/// Counts words, lines and characters.
pub struct WordCount;

pub(crate) fn text_stats(text: &str) -> Value {
    json!({
        "words": text.split_whitespace().count(),
        "lines": text.lines().count(),
        "chars": text.chars().count(),
    })
}

#[async_trait]
impl ToolHandler for WordCount {
    async fn call(&self, args: Value, _ctx: ToolContext) -> Result<Outcome, ToolError> {
        let args: TextArgs =
            serde_json::from_value(args).map_err(|e| ToolError::new(e.to_string()))?;
        Ok(Outcome::ok(text_stats(&args.text)))
    }
}

/// Input for `prompt_brief`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BriefArgs {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Assembles a markdown brief from nested `word_count` and `mermaid_flow` calls.
///
/// The statistics are also published to the chain's shared state under
/// `brief.stats` so later steps of a sequence can read them.
pub struct PromptBrief;

#[async_trait]
impl ToolHandler for PromptBrief {
    async fn call(&self, args: Value, ctx: ToolContext) -> Result<Outcome, ToolError> {
        let args: BriefArgs =
            serde_json::from_value(args).map_err(|e| ToolError::new(e.to_string()))?;

        let stats_call = ctx.invoke(
            "word_count",
            json!({ "text": &args.text }),
            InvokeOptions::new().deduplicated(),
        );
        let diagram_call = async {
            if args.steps.is_empty() {
                return Ok(None);
            }
            ctx.invoke(
                "mermaid_flow",
                json!({ "steps": args.steps }),
                InvokeOptions::default(),
            )
            .await
            .map(Some)
        };
        let (stats, diagram) = futures::join!(stats_call, diagram_call);

        let stats = stats?;
        if !stats.success {
            return Ok(stats);
        }
        let stats = stats.data.unwrap_or(Value::Null);
        if let Some(state) = ctx.shared_state() {
            state.insert("brief.stats", stats.clone());
        }

        let mut brief = format!("# {}\n\n{}\n", args.title, args.text.trim());
        brief.push_str(&format!(
            "\n_{} words, {} lines_\n",
            stats["words"], stats["lines"]
        ));
        if let Some(diagram) = diagram? {
            if let Some(Value::String(chart)) = diagram.data {
                brief.push_str(&format!("\n```mermaid\n{chart}```\n"));
            }
        }
        Ok(Outcome::ok(json!({ "brief": brief, "stats": stats })))
    }
}
