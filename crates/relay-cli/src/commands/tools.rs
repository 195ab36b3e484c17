//! `relay tools` command.

use clap::Args;

use relay_runtime::ToolOrchestrator;

/// List the registered tools.
#[derive(Debug, Args)]
pub struct ToolsArgs {
    /// Only show tools whose name contains this text.
    #[arg(short, long)]
    pub filter: Option<String>,
    /// Print descriptors (with input schemas) as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the tools command.
pub fn execute(args: &ToolsArgs, orchestrator: &ToolOrchestrator) -> anyhow::Result<()> {
    let tools: Vec<_> = orchestrator
        .registry()
        .list()
        .into_iter()
        .filter(|d| {
            args.filter
                .as_deref()
                .map_or(true, |f| d.name.as_str().contains(f))
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }
    if tools.is_empty() {
        println!("No tools match.");
        return Ok(());
    }
    let width = tools.iter().map(|d| d.name.as_str().len()).max().unwrap_or(0);
    for d in &tools {
        println!(
            "{:<width$}  {}  (callers: {})",
            d.name.as_str(),
            d.description,
            d.can_invoke
        );
    }
    Ok(())
}
