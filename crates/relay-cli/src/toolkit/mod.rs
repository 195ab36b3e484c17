//! Built-in text tools.
//!
//! Small generators (counts, tables, diagrams, prompt briefs) that give the
//! orchestrator something real to run from the command line. `prompt_brief`
//! is a composite that calls other tools through its `ToolContext`.

use std::sync::Arc;

use anyhow::Context;
use relay_registry::{policy_from_list, ToolRegistration, TypedInput};
use relay_runtime::{Registry, ToolHandler};
use relay_types::ToolName;

mod diagram;
mod export;
mod text;

pub use diagram::{MermaidFlow, StepsArgs};
pub use export::{CsvExport, LatexTable, TableArgs};
pub use text::{PromptBrief, TextArgs, WordCount};

fn tool_name(name: &str) -> anyhow::Result<ToolName> {
    ToolName::new(name).map_err(|e| anyhow::anyhow!("{e}"))
}

/// Registers every built-in tool.
///
/// # Errors
/// Returns an error if a name is invalid or already taken.
pub fn register_all(registry: &mut Registry) -> anyhow::Result<()> {
    let tools: Vec<(ToolRegistration, Arc<dyn ToolHandler>)> = vec![
        (
            ToolRegistration::new(tool_name("word_count")?, "Count words, lines and characters")
                .with_schema(TypedInput::<TextArgs>::new())
                .with_policy(policy_from_list(["*"])),
            Arc::new(WordCount),
        ),
        (
            ToolRegistration::new(tool_name("csv_export")?, "Render rows as RFC 4180 CSV")
                .with_schema(TypedInput::<TableArgs>::new())
                .with_policy(policy_from_list(["*"])),
            Arc::new(CsvExport),
        ),
        (
            ToolRegistration::new(tool_name("latex_table")?, "Render rows as a LaTeX tabular")
                .with_schema(TypedInput::<TableArgs>::new())
                .with_policy(policy_from_list(["*"])),
            Arc::new(LatexTable),
        ),
        (
            ToolRegistration::new(tool_name("mermaid_flow")?, "Render steps as a Mermaid flowchart")
                .with_schema(TypedInput::<StepsArgs>::new())
                .with_policy(policy_from_list(["prompt_brief"])),
            Arc::new(MermaidFlow),
        ),
        (
            ToolRegistration::new(
                tool_name("prompt_brief")?,
                "Build a prompt brief with text statistics and an optional flow diagram",
            )
            .with_schema(TypedInput::<text::BriefArgs>::new()),
            Arc::new(PromptBrief),
        ),
    ];
    for (registration, handler) in tools {
        let name = registration.name.to_string();
        registry
            .register(registration, handler)
            .with_context(|| format!("failed to register '{name}'"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_config::RelayConfig;
    use relay_runtime::{InvokeOptions, RuntimeError, ToolOrchestrator};
    use relay_types::ExecutionStatus;
    use serde_json::json;

    fn orchestrator() -> ToolOrchestrator {
        crate::shared::build_orchestrator(&RelayConfig::default()).expect("build")
    }

    #[test]
    fn registers_every_tool_once() {
        let mut registry = Registry::new();
        register_all(&mut registry).expect("register");
        let names: Vec<String> = registry.list().into_iter().map(|d| d.name.to_string()).collect();
        assert_eq!(
            names,
            ["csv_export", "latex_table", "mermaid_flow", "prompt_brief", "word_count"]
        );
        assert!(register_all(&mut registry).is_err());
    }

    #[tokio::test]
    async fn brief_composes_nested_calls() {
        let orch = orchestrator();
        let chain = orch.root_context(Some("brief-1".into()));
        let outcome = orch
            .invoke(
                "prompt_brief",
                json!({"title": "Plan", "text": "one two three", "steps": ["draft", "ship"]}),
                Some(&chain),
                InvokeOptions::default(),
            )
            .await
            .expect("invoke");

        let data = outcome.data.expect("data");
        let brief = data["brief"].as_str().expect("brief text");
        assert!(brief.starts_with("# Plan\n"));
        assert!(brief.contains("_3 words, 1 lines_"));
        assert!(brief.contains("```mermaid\nflowchart TD\n"));
        assert_eq!(chain.shared_state().get("brief.stats"), Some(data["stats"].clone()));

        let entries = chain.execution_log().entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.last().map(|e| e.tool_name.as_str()), Some("prompt_brief"));
        assert!(entries.iter().filter(|e| e.depth == 1).count() == 2);
        assert!(entries.iter().all(|e| e.status == ExecutionStatus::Success));
    }

    #[tokio::test]
    async fn mermaid_flow_only_accepts_prompt_brief_as_caller() {
        let orch = orchestrator();
        let chain = orch.root_context(None);
        let from_csv = chain
            .child(&ToolName::new("csv_export").expect("name"))
            .expect("child");
        let err = orch
            .invoke(
                "mermaid_flow",
                json!({"steps": ["a"]}),
                Some(&from_csv),
                InvokeOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Unauthorized { .. }));

        let root = orch
            .invoke(
                "mermaid_flow",
                json!({"steps": ["a"]}),
                Some(&chain),
                InvokeOptions::default(),
            )
            .await
            .expect("root may call any tool");
        assert!(root.success);
    }

    #[tokio::test]
    async fn csv_export_reports_ragged_rows_as_failure() {
        let orch = orchestrator();
        let outcome = orch
            .invoke(
                "csv_export",
                json!({"headers": ["a", "b"], "rows": [["1"]]}),
                None,
                InvokeOptions::default(),
            )
            .await
            .expect("invoke");
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn word_count_rejects_unknown_fields() {
        let orch = orchestrator();
        let err = orch
            .invoke("word_count", json!({"txt": "x"}), None, InvokeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Validation { .. }));
    }
}
